// src/algorithms/similarity.rs
use crate::algorithms::node::SubsetScorer;
use crate::core::{ExplainerConfig, IdSet};
use crate::stats::{FeatureProfile, FeatureType};
use ndarray::ArrayView1;
use serde::Serialize;

/// A feature's own contribution, measured over the rows similar to the instance.
#[derive(Debug, Clone, Serialize)]
pub struct MainEffect {
    pub feature: String,
    pub instance_value: f64,
    /// Mean target of the similar rows minus the dataset mean.
    pub average: f64,
    pub size: usize,
    #[serde(skip)]
    pub ids: IdSet,
}

/// Rows similar to `value` on one feature.
///
/// Continuous features accept rows within `range * similarity_margin_percent`
/// of the value (inclusive); discrete features need an exact match, and a
/// missing instance value matches the rows where the feature is missing too.
/// A missing value of a continuous feature matches nothing.
pub fn similar_rows(
    column: ArrayView1<'_, f64>,
    profile: &FeatureProfile,
    value: f64,
    config: &ExplainerConfig,
) -> IdSet {
    match profile.feature_type() {
        FeatureType::Continuous if value.is_nan() => IdSet::default(),
        FeatureType::Continuous => {
            let margin = profile.range() * config.similarity_margin_percent;
            let (low, high) = (value - margin, value + margin);
            column
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v >= low && v <= high)
                .map(|(i, _)| i)
                .collect()
        }
        FeatureType::Discrete if value.is_nan() => column
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v.is_nan())
            .map(|(i, _)| i)
            .collect(),
        FeatureType::Discrete => column
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == value)
            .map(|(i, _)| i)
            .collect(),
    }
}

/// The main effect of one feature, or `None` when too few rows are similar.
///
/// A feature needs strictly more than `min_subset_absolute` similar rows.
pub fn main_effect(
    feature: &str,
    column: ArrayView1<'_, f64>,
    profile: &FeatureProfile,
    value: f64,
    scorer: &SubsetScorer<'_>,
    config: &ExplainerConfig,
) -> Option<MainEffect> {
    let ids = similar_rows(column, profile, value, config);
    if ids.len() <= config.min_subset_absolute {
        return None;
    }
    Some(MainEffect {
        feature: feature.to_string(),
        instance_value: value,
        average: scorer.influence(&ids),
        size: ids.len(),
        ids,
    })
}
