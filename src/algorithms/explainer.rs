// src/algorithms/explainer.rs

use crate::algorithms::explanation::ExplanationResult;
use crate::algorithms::grouping::build_groups;
use crate::algorithms::node::{GroupNode, SubsetScorer};
use crate::algorithms::similarity::main_effect;
use crate::core::{Dataset, ExplainError, ExplainerConfig, IdSet, Instance, Result};
use crate::stats::{
    compute_summary, influence_range, BinSample, CorrelationMatrix, DatasetSummary, FeatureBins,
    FeatureProfile, FeatureType,
};
use crate::traits::Attribution;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// One point of a what-if response curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WhatIfSample {
    pub x: f64,
    /// What-if prediction minus the dataset mean; `None` for bins without support.
    pub impact: Option<f64>,
}

/// How common an instance value is for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureAbnormality {
    pub feature: String,
    pub value: f64,
    /// Count of the value's bin over the count of the fullest bin.
    pub ratio: f64,
    pub is_abnormal: bool,
}

/// Explains instances of one dataset.
///
/// Everything computed at construction (summary, bins, correlations) is
/// read-only afterwards, so one explainer can serve many explanations,
/// including concurrent what-if runs. Changing the dataset means building a
/// new explainer.
#[derive(Debug)]
pub struct InfluenceExplainer {
    dataset: Dataset,
    config: ExplainerConfig,
    summary: DatasetSummary,
    profiles: Vec<FeatureProfile>,
    features: Vec<String>,
    feature_columns: Vec<usize>,
    correlations: CorrelationMatrix,
    influence_range: (f64, f64),
}

impl InfluenceExplainer {
    /// Builds an explainer over every non-target column.
    pub fn new(dataset: Dataset, config: Option<ExplainerConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let summary = compute_summary(dataset.target())?;
        let profiles = dataset
            .columns()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                FeatureProfile::build(name, dataset.column(i), dataset.target(), summary.mean, &config)
            })
            .collect();
        let influence_range = influence_range(dataset.target(), summary.mean, config.min_subset_absolute);
        let features = dataset.non_target_columns();
        let feature_columns = features
            .iter()
            .map(|f| dataset.column_index(f))
            .collect::<Result<Vec<_>>>()?;
        let correlations = CorrelationMatrix::compute(&dataset, &features)?;

        info!(
            rows = dataset.nrows(),
            columns = dataset.columns().len(),
            features = features.len(),
            target = dataset.target_name(),
            "Built influence explainer"
        );

        Ok(InfluenceExplainer {
            dataset,
            config,
            summary,
            profiles,
            features,
            feature_columns,
            correlations,
            influence_range,
        })
    }

    /// Restricts (and orders) the candidate features. Correlations are recomputed.
    pub fn with_features(mut self, features: Vec<String>) -> Result<Self> {
        let mut columns = Vec::with_capacity(features.len());
        for feature in &features {
            let column = self.dataset.column_index(feature)?;
            if column == self.dataset.target_index() {
                return Err(ExplainError::invalid_input(format!(
                    "Target '{}' cannot be a candidate feature.",
                    feature
                )));
            }
            columns.push(column);
        }
        self.correlations = CorrelationMatrix::compute(&self.dataset, &features)?;
        self.features = features;
        self.feature_columns = columns;
        Ok(self)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    pub fn summary(&self) -> &DatasetSummary {
        &self.summary
    }

    /// Candidate features in explanation order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn correlations(&self) -> &CorrelationMatrix {
        &self.correlations
    }

    /// `(low, high)` clamp offsets around the dataset mean.
    pub fn influence_range(&self) -> (f64, f64) {
        self.influence_range
    }

    pub fn profile(&self, feature: &str) -> Result<&FeatureProfile> {
        Ok(&self.profiles[self.dataset.column_index(feature)?])
    }

    pub fn bins(&self, feature: &str) -> Result<&FeatureBins> {
        Ok(&self.profile(feature)?.bins)
    }

    pub fn feature_type(&self, feature: &str) -> Result<FeatureType> {
        Ok(self.profile(feature)?.feature_type())
    }

    pub fn instance_bin_index(&self, feature: &str, value: f64) -> Result<usize> {
        self.profile(feature)?.instance_bin_index(value)
    }

    fn scorer(&self) -> SubsetScorer<'_> {
        SubsetScorer::new(self.dataset.target(), self.summary.mean)
    }

    fn check_instance(&self, instance: &Instance) -> Result<()> {
        if instance.len() != self.dataset.columns().len() {
            return Err(ExplainError::IncompatibleDimensions(format!(
                "Instance has {} values, but the dataset has {} columns.",
                instance.len(),
                self.dataset.columns().len()
            )));
        }
        Ok(())
    }

    /// Runs the full pipeline for one instance: main effects, grouping, prediction.
    pub fn compute_explanation(&self, instance: &Instance) -> Result<ExplanationResult> {
        self.check_instance(instance)?;
        let scorer = self.scorer();

        let mut main_effects = Vec::new();
        let mut excluded_features = Vec::new();
        for (feature, &column) in self.features.iter().zip(&self.feature_columns) {
            match main_effect(
                feature,
                self.dataset.column(column),
                &self.profiles[column],
                instance[column],
                &scorer,
                &self.config,
            ) {
                Some(effect) => main_effects.push(effect),
                None => excluded_features.push(feature.clone()),
            }
        }

        let groups = build_groups(
            &main_effects,
            &self.correlations,
            &scorer,
            &self.config,
            self.summary.std,
        );
        let explanation_prediction = self.explanation_prediction(&groups);

        debug!(
            excluded = ?excluded_features,
            groups = groups.len(),
            prediction = ?explanation_prediction,
            "Computed explanation"
        );

        Ok(ExplanationResult {
            groups,
            explanation_prediction,
            excluded_features,
            main_effects,
        })
    }

    /// Dataset mean plus the group scores, clamped to the mean of the most
    /// extreme targets on either side.
    ///
    /// `None` without groups, and when a group score is `NaN` because its rows
    /// narrowed to nothing (e.g. a what-if value splitting a correlated pair).
    pub fn explanation_prediction(&self, groups: &[GroupNode]) -> Option<f64> {
        if groups.is_empty() {
            return None;
        }
        let mean = self.summary.mean;
        let prediction = mean + groups.iter().map(|g| g.score()).sum::<f64>();
        if prediction.is_nan() {
            return None;
        }
        let (low, high) = self.influence_range;
        Some(prediction.min(mean + high).max(mean + low))
    }

    pub fn predict(&self, instance: &Instance) -> Result<Option<f64>> {
        Ok(self.compute_explanation(instance)?.explanation_prediction)
    }

    /// Prediction for `instance` with `feature` replaced by `value`.
    pub fn what_if(&self, instance: &Instance, feature: &str, value: f64) -> Result<Option<f64>> {
        self.check_instance(instance)?;
        let column = self.dataset.column_index(feature)?;
        let mut hypothetical = instance.clone();
        hypothetical[column] = value;
        self.predict(&hypothetical)
    }

    /// What-if impacts at one representative value per bin of `feature`, sorted by value.
    ///
    /// Bins holding no more than `min_subset_absolute` rows are not evaluated.
    pub fn response_curve(&self, instance: &Instance, feature: &str) -> Result<Vec<WhatIfSample>> {
        self.check_instance(instance)?;
        let mut values: Vec<(f64, usize)> = self
            .profile(feature)?
            .representative_values()
            .into_iter()
            .filter(|(x, _)| x.is_finite())
            .collect();
        values.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mean = self.summary.mean;
        values
            .par_iter()
            .map(|&(x, count)| -> Result<WhatIfSample> {
                let impact = if count > self.config.min_subset_absolute {
                    self.what_if(instance, feature, x)?.map(|p| p - mean)
                } else {
                    None
                };
                Ok(WhatIfSample { x, impact })
            })
            .collect()
    }

    pub fn abnormality(&self, feature: &str, value: f64) -> Result<FeatureAbnormality> {
        let profile = self.profile(feature)?;
        let index = profile.instance_bin_index(value)?;
        let counts = profile.bin_counts();
        let max_count = counts.iter().copied().max().unwrap_or(0);
        let ratio = if max_count == 0 {
            0.0
        } else {
            counts[index] as f64 / max_count as f64
        };
        Ok(FeatureAbnormality {
            feature: feature.to_string(),
            value,
            ratio,
            is_abnormal: ratio < self.config.abnormal_boundary,
        })
    }

    /// Abnormality of every candidate feature value of `instance`.
    pub fn instance_abnormality(&self, instance: &Instance) -> Result<Vec<FeatureAbnormality>> {
        self.check_instance(instance)?;
        self.features
            .iter()
            .zip(&self.feature_columns)
            .map(|(feature, &column)| self.abnormality(feature, instance[column]))
            .collect()
    }

    pub fn feature_bin_samples(&self, feature: &str) -> Result<Vec<BinSample>> {
        Ok(self.profile(feature)?.bin_samples())
    }

    /// Bins of `feature` recounted over `ids`, e.g. the rows of the node
    /// preceding the feature in its group.
    pub fn conditional_bins(&self, feature: &str, ids: &IdSet) -> Result<Vec<BinSample>> {
        let column = self.dataset.column_index(feature)?;
        if let Some(id) = ids.iter().find(|&id| id >= self.dataset.nrows()) {
            return Err(ExplainError::invalid_input(format!(
                "Row id {} is out of range for {} rows.",
                id,
                self.dataset.nrows()
            )));
        }
        Ok(self.profiles[column].conditional_bin_samples(
            self.dataset.column(column),
            self.dataset.target(),
            ids,
            self.summary.mean,
            self.config.min_subset_absolute,
        ))
    }
}
