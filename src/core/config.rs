// src/core/config.rs

//! Explainer tunables.
//!
//! Uses `figment` for layered configuration: defaults -> optional TOML file -> environment.
//! Environment variables are prefixed with `INFLUENCE_`, e.g. `INFLUENCE_MIN_SUBSET_ABSOLUTE=30`.

use crate::core::{ExplainError, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the influence explainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    /// Features with at most this many distinct values are discrete.
    pub max_discrete_bins: usize,
    /// Target number of equal-width bins before the width is made "pretty".
    pub continuous_bin_count: usize,
    /// Pearson coefficient above which features are pre-grouped.
    pub correlation_group_threshold: f64,
    /// Minimum number of rows for a subset to carry a statistic.
    pub min_subset_absolute: usize,
    /// Fraction of a continuous feature's range used as the similarity margin.
    pub similarity_margin_percent: f64,
    /// Groups with |score| at or below `factor * target std` are dropped in reduced mode.
    pub reduction_boundary_factor: f64,
    pub is_reduced: bool,
    /// p-value below which an interaction counts as significant.
    pub significance_level: f64,
    /// Bin count ratios below this mark an instance value as abnormal.
    pub abnormal_boundary: f64,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        ExplainerConfig {
            max_discrete_bins: 24,
            continuous_bin_count: 20,
            correlation_group_threshold: 0.8,
            min_subset_absolute: 20,
            similarity_margin_percent: 0.025,
            reduction_boundary_factor: 0.05,
            is_reduced: false,
            significance_level: 0.05,
            abnormal_boundary: 0.5,
        }
    }
}

impl ExplainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.continuous_bin_count == 0 {
            return Err(ExplainError::invalid_input(
                "continuous_bin_count must be positive.",
            ));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ExplainError::invalid_input(format!(
                "significance_level must lie in (0, 1), got {}.",
                self.significance_level
            )));
        }
        if !(self.similarity_margin_percent >= 0.0 && self.similarity_margin_percent.is_finite()) {
            return Err(ExplainError::invalid_input(format!(
                "similarity_margin_percent must be non-negative, got {}.",
                self.similarity_margin_percent
            )));
        }
        if !(-1.0..=1.0).contains(&self.correlation_group_threshold) {
            return Err(ExplainError::invalid_input(format!(
                "correlation_group_threshold must lie in [-1, 1], got {}.",
                self.correlation_group_threshold
            )));
        }
        if !(self.reduction_boundary_factor >= 0.0) || !(self.abnormal_boundary >= 0.0) {
            return Err(ExplainError::invalid_input(
                "reduction_boundary_factor and abnormal_boundary must be non-negative.",
            ));
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `INFLUENCE_`)
/// 2. The TOML file at `path`, when given and present
/// 3. Built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<ExplainerConfig> {
    let mut figment = Figment::from(Serialized::defaults(ExplainerConfig::default()));

    if let Some(path) = path {
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }
    }

    figment = figment.merge(Env::prefixed("INFLUENCE_"));

    let config: ExplainerConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
