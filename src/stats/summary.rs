// src/stats/summary.rs
use crate::core::{ExplainError, Result};
use ndarray::{Array1, ArrayView1};
use serde::Serialize;

/// Summary of the target column over its finite values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub count: usize,
}

impl DatasetSummary {
    /// Display precision for target values: two digits below the magnitude of the range.
    pub fn target_decimals(&self) -> u32 {
        if self.range > 0.0 {
            (-self.range.log10().floor() + 2.0).max(0.0) as u32
        } else {
            2
        }
    }
}

pub fn compute_summary(target: ArrayView1<'_, f64>) -> Result<DatasetSummary> {
    let values: Array1<f64> = target.iter().copied().filter(|v| v.is_finite()).collect();
    let mean = values
        .mean()
        .ok_or_else(|| ExplainError::invalid_input("Target column has no numeric values."))?;

    let count = values.len();
    let std = if count > 1 { values.std(1.0) } else { 0.0 };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(DatasetSummary {
        mean,
        std,
        min,
        max,
        range: max - min,
        count,
    })
}

/// Influence bounds from the `k` lowest and `k` highest targets, relative to `mean`.
///
/// Returns `(low, high)`; fewer than `k` rows means all rows are used on each side.
pub fn influence_range(target: ArrayView1<'_, f64>, mean: f64, k: usize) -> (f64, f64) {
    let mut sorted: Vec<f64> = target.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let take = k.max(1).min(sorted.len());
    if take == 0 {
        return (0.0, 0.0);
    }

    let low = sorted[..take].iter().sum::<f64>() / take as f64 - mean;
    let high = sorted[sorted.len() - take..].iter().sum::<f64>() / take as f64 - mean;
    (low, high)
}
