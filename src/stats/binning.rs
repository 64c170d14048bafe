// src/stats/binning.rs
use crate::core::{ExplainError, ExplainerConfig, IdSet, Result};
use crate::utils::{round_to, step_decimals};
use ndarray::ArrayView1;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Continuous,
    Discrete,
}

/// One equal-width slice `[min, max)` of a continuous feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuousBin {
    pub min: f64,
    pub max: f64,
    pub center: f64,
    pub count: usize,
    /// Mean target minus the dataset mean; `None` when `count` is below the minimum subset size.
    pub prediction_mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscreteBin {
    pub value: f64,
    pub count: usize,
    pub prediction_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeatureBins {
    Continuous {
        step: f64,
        /// Decimal places of every bin boundary and center.
        decimals: u32,
        bins: Vec<ContinuousBin>,
    },
    Discrete {
        bins: Vec<DiscreteBin>,
    },
}

/// A bin projected onto a common shape for plotting and what-if sampling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinSample {
    pub x: f64,
    pub count: usize,
    pub prediction: Option<f64>,
}

/// Per-feature type, observed extent and bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureProfile {
    pub name: String,
    pub observed_min: f64,
    pub observed_max: f64,
    pub bins: FeatureBins,
}

#[derive(Default, Clone, Copy)]
struct Accumulator {
    count: usize,
    target_sum: f64,
    target_count: usize,
}

impl Accumulator {
    fn add(&mut self, target: f64) {
        self.count += 1;
        if target.is_finite() {
            self.target_sum += target;
            self.target_count += 1;
        }
    }

    fn influence(&self, center: f64) -> Option<f64> {
        (self.target_count > 0).then(|| self.target_sum / self.target_count as f64 - center)
    }
}

/// Rounds a raw bin width to 1, 5 or 10 times a power of ten.
pub fn pretty_step(width: f64) -> f64 {
    let pow10 = 10f64.powf(width.log10().floor());
    let float5 = 5.0 * pow10;
    let pretty = (width / float5).round() * float5;
    if pretty == 0.0 {
        float5 / 5.0
    } else {
        pretty
    }
}

impl FeatureProfile {
    /// Bins `column` and records the mean target per bin relative to `center`.
    pub fn build(
        name: &str,
        column: ArrayView1<'_, f64>,
        target: ArrayView1<'_, f64>,
        center: f64,
        config: &ExplainerConfig,
    ) -> Self {
        // -0.0 and 0.0 are one value
        let mut distinct: Vec<f64> = column
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| v + 0.0)
            .collect();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();

        let observed_min = distinct.first().copied().unwrap_or(f64::NAN);
        let observed_max = distinct.last().copied().unwrap_or(f64::NAN);

        let bins = if distinct.len() > config.max_discrete_bins {
            Self::continuous_bins(column, target, center, observed_min, observed_max, config)
        } else {
            Self::discrete_bins(&distinct, column, target, center)
        };

        FeatureProfile {
            name: name.to_string(),
            observed_min,
            observed_max,
            bins,
        }
    }

    fn continuous_bins(
        column: ArrayView1<'_, f64>,
        target: ArrayView1<'_, f64>,
        center: f64,
        observed_min: f64,
        observed_max: f64,
        config: &ExplainerConfig,
    ) -> FeatureBins {
        let step = pretty_step((observed_max - observed_min) / config.continuous_bin_count as f64);
        let decimals = step_decimals(step);

        let mut min = round_to((observed_min / step).floor() * step, decimals);
        if min > observed_min {
            min -= step;
        }
        let unit = 10f64.powi(-(decimals as i32));
        let max = ((observed_max + unit) / step).ceil() * step;
        let n_bins = (((max - min) / step).round() as usize).max(1);

        let edge = |i: usize| round_to(min + i as f64 * step, decimals);

        let mut acc = vec![Accumulator::default(); n_bins];
        for (&value, &y) in column.iter().zip(target.iter()) {
            if !value.is_finite() {
                continue;
            }
            let raw = ((value - min) / step).floor().max(0.0) as usize;
            // values on the upper edge fold into the last bin
            acc[raw.min(n_bins - 1)].add(y);
        }

        let bins = acc
            .iter()
            .enumerate()
            .map(|(i, a)| ContinuousBin {
                min: edge(i),
                max: edge(i + 1),
                center: round_to(min + i as f64 * step + step / 2.0, decimals),
                count: a.count,
                prediction_mean: if a.count < config.min_subset_absolute {
                    None
                } else {
                    a.influence(center)
                },
            })
            .collect();

        FeatureBins::Continuous {
            step,
            decimals,
            bins,
        }
    }

    fn discrete_bins(
        distinct: &[f64],
        column: ArrayView1<'_, f64>,
        target: ArrayView1<'_, f64>,
        center: f64,
    ) -> FeatureBins {
        let mut acc = vec![Accumulator::default(); distinct.len()];
        for (&value, &y) in column.iter().zip(target.iter()) {
            if !value.is_finite() {
                continue;
            }
            if let Ok(i) = distinct.binary_search_by(|d| d.total_cmp(&(value + 0.0))) {
                acc[i].add(y);
            }
        }

        let bins = distinct
            .iter()
            .zip(acc.iter())
            .map(|(&value, a)| DiscreteBin {
                value,
                count: a.count,
                prediction_mean: a.influence(center).unwrap_or(f64::NAN),
            })
            .collect();

        FeatureBins::Discrete { bins }
    }

    pub fn feature_type(&self) -> FeatureType {
        match self.bins {
            FeatureBins::Continuous { .. } => FeatureType::Continuous,
            FeatureBins::Discrete { .. } => FeatureType::Discrete,
        }
    }

    /// Observed `max - min` over the finite values.
    pub fn range(&self) -> f64 {
        self.observed_max - self.observed_min
    }

    pub fn bin_counts(&self) -> Vec<usize> {
        match &self.bins {
            FeatureBins::Continuous { bins, .. } => bins.iter().map(|b| b.count).collect(),
            FeatureBins::Discrete { bins } => bins.iter().map(|b| b.count).collect(),
        }
    }

    /// Index of the bin holding `value`: `min <= value < max` for continuous
    /// features, exact match for discrete ones.
    pub fn instance_bin_index(&self, value: f64) -> Result<usize> {
        let found = match &self.bins {
            FeatureBins::Continuous { bins, .. } => {
                bins.iter().position(|b| b.min <= value && b.max > value)
            }
            FeatureBins::Discrete { bins } => bins.iter().position(|b| b.value == value),
        };
        found.ok_or_else(|| ExplainError::BinNotFound {
            feature: self.name.clone(),
            value,
        })
    }

    /// One representative value per bin with the bin's count.
    ///
    /// Continuous bins use their midpoint rounded to the bin precision.
    pub fn representative_values(&self) -> Vec<(f64, usize)> {
        match &self.bins {
            FeatureBins::Continuous { decimals, bins, .. } => bins
                .iter()
                .map(|b| (round_to((b.min + b.max) / 2.0, *decimals), b.count))
                .collect(),
            FeatureBins::Discrete { bins } => bins.iter().map(|b| (b.value, b.count)).collect(),
        }
    }

    /// The bins as `(x, count, prediction)` samples sorted by `x`.
    pub fn bin_samples(&self) -> Vec<BinSample> {
        let mut samples: Vec<BinSample> = match &self.bins {
            FeatureBins::Continuous { bins, .. } => bins
                .iter()
                .map(|b| BinSample {
                    x: b.min,
                    count: b.count,
                    prediction: b.prediction_mean,
                })
                .collect(),
            FeatureBins::Discrete { bins } => bins
                .iter()
                .map(|b| BinSample {
                    x: b.value,
                    count: b.count,
                    prediction: b.prediction_mean.is_finite().then_some(b.prediction_mean),
                })
                .collect(),
        };
        samples.sort_by(|a, b| a.x.total_cmp(&b.x));
        samples
    }

    /// Recounts the bins over `ids` only.
    ///
    /// A bin's prediction is reported only when more than `min_subset` rows of `ids` fall into it.
    pub fn conditional_bin_samples(
        &self,
        column: ArrayView1<'_, f64>,
        target: ArrayView1<'_, f64>,
        ids: &IdSet,
        center: f64,
        min_subset: usize,
    ) -> Vec<BinSample> {
        let xs: Vec<f64> = match &self.bins {
            FeatureBins::Continuous { bins, .. } => bins.iter().map(|b| b.min).collect(),
            FeatureBins::Discrete { bins } => bins.iter().map(|b| b.value).collect(),
        };

        let mut acc = vec![Accumulator::default(); xs.len()];
        for id in ids.iter() {
            if let Ok(i) = self.instance_bin_index(column[id]) {
                acc[i].add(target[id]);
            }
        }

        let mut samples: Vec<BinSample> = xs
            .into_iter()
            .zip(acc)
            .map(|(x, a)| BinSample {
                x,
                count: a.count,
                prediction: if a.count > min_subset {
                    a.influence(center)
                } else {
                    None
                },
            })
            .collect();
        samples.sort_by(|a, b| a.x.total_cmp(&b.x));
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn config() -> ExplainerConfig {
        ExplainerConfig::default()
    }

    #[test]
    fn pretty_step_rounds_to_friendly_widths() {
        assert_relative_eq!(pretty_step(4.95), 5.0);
        assert_relative_eq!(pretty_step(0.5), 0.5);
        // 1.2 rounds to 0 multiples of 5, falls back to the power of ten
        assert_relative_eq!(pretty_step(1.2), 1.0);
        assert_relative_eq!(pretty_step(7.6), 10.0);
    }

    #[test]
    fn small_cardinality_is_discrete() {
        let column: Array1<f64> = (0..60).map(|i| (i % 3) as f64).collect();
        let target: Array1<f64> = (0..60).map(|i| if i % 3 == 0 { 10.0 } else { 0.0 }).collect();
        let profile = FeatureProfile::build("c", column.view(), target.view(), 10.0 / 3.0, &config());

        assert_eq!(profile.feature_type(), FeatureType::Discrete);
        let FeatureBins::Discrete { bins } = &profile.bins else {
            panic!("expected discrete bins");
        };
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0].value, 0.0);
        assert_eq!(bins[0].count, 20);
        assert_relative_eq!(bins[0].prediction_mean, 10.0 - 10.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn discrete_counts_sum_to_non_missing_rows() {
        let mut values: Vec<f64> = (0..50).map(|i| (i % 4) as f64).collect();
        values[3] = f64::NAN;
        values[7] = f64::NAN;
        let column = Array1::from(values);
        let target = Array1::from_elem(50, 1.0);
        let profile = FeatureProfile::build("d", column.view(), target.view(), 1.0, &config());
        assert_eq!(profile.bin_counts().iter().sum::<usize>(), 48);
    }

    #[test]
    fn continuous_bins_are_contiguous_and_cover_range() {
        let column: Array1<f64> = (0..100).map(|i| i as f64).collect();
        let target: Array1<f64> = (0..100).map(|i| (i % 7) as f64).collect();
        let profile = FeatureProfile::build("x", column.view(), target.view(), 3.0, &config());

        let FeatureBins::Continuous { step, decimals, bins } = &profile.bins else {
            panic!("expected continuous bins");
        };
        assert_relative_eq!(*step, 5.0);
        assert_eq!(*decimals, 0);
        assert_eq!(bins.first().unwrap().min, 0.0);
        assert!(bins.last().unwrap().max > 99.0);
        for pair in bins.windows(2) {
            assert_eq!(pair[0].max, pair[1].min);
        }
        assert_eq!(profile.bin_counts().iter().sum::<usize>(), 100);
        for i in 0..100 {
            assert!(profile.instance_bin_index(i as f64).is_ok());
        }
        // 5 rows per bin, below the minimum subset size
        assert!(bins.iter().all(|b| b.prediction_mean.is_none()));
    }

    #[test]
    fn continuous_prediction_mean_needs_support() {
        let column: Array1<f64> = (0..1000).map(|i| (i % 100) as f64).collect();
        let target: Array1<f64> = (0..1000).map(|i| (i % 100) as f64).collect();
        let profile = FeatureProfile::build("x", column.view(), target.view(), 49.5, &config());
        let FeatureBins::Continuous { bins, .. } = &profile.bins else {
            panic!("expected continuous bins");
        };
        // first bin holds 0..=4, fifty rows
        assert_eq!(bins[0].count, 50);
        assert_relative_eq!(bins[0].prediction_mean.unwrap(), 2.0 - 49.5);
    }

    #[test]
    fn out_of_range_value_has_no_bin() {
        let column: Array1<f64> = (0..100).map(|i| i as f64).collect();
        let target = Array1::from_elem(100, 1.0);
        let profile = FeatureProfile::build("x", column.view(), target.view(), 1.0, &config());
        let err = profile.instance_bin_index(1_000.0).unwrap_err();
        assert!(matches!(err, ExplainError::BinNotFound { .. }));
        assert!(profile.instance_bin_index(f64::NAN).is_err());
    }

    #[test]
    fn conditional_samples_only_count_given_rows() {
        let column: Array1<f64> = (0..90).map(|i| (i % 3) as f64).collect();
        let target: Array1<f64> = (0..90).map(|i| i as f64).collect();
        let profile = FeatureProfile::build("c", column.view(), target.view(), 0.0, &config());
        let ids: IdSet = (0..90).filter(|i| i % 3 == 0).collect();

        let samples = profile.conditional_bin_samples(column.view(), target.view(), &ids, 0.0, 20);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].count, 30);
        assert_eq!(samples[1].count, 0);
        assert!(samples[1].prediction.is_none());
        assert_relative_eq!(samples[0].prediction.unwrap(), 43.5);
    }
}
