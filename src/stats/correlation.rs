// src/stats/correlation.rs
use crate::core::Dataset;
use crate::core::Result;
use ndarray::{Array2, ArrayView1};

/// Pearson correlation over the rows where both values are finite.
///
/// Returns `NaN` when no complete pair remains or either column is constant.
pub fn pearson(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    if pairs.is_empty() {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (da, db) = (x - mean_a, y - mean_b);
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denominator = (var_a * var_b).sqrt();
    if denominator == 0.0 {
        return f64::NAN;
    }
    cov / denominator
}

/// Pairwise Pearson coefficients between candidate features. The diagonal is absent.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    features: Vec<String>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Computes every ordered pair of distinct features.
    pub fn compute(dataset: &Dataset, features: &[String]) -> Result<Self> {
        let columns = features
            .iter()
            .map(|f| dataset.column_index(f))
            .collect::<Result<Vec<_>>>()?;

        let n = features.len();
        let mut values = Array2::from_elem((n, n), f64::NAN);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    values[[i, j]] = pearson(dataset.column(columns[i]), dataset.column(columns[j]));
                }
            }
        }

        Ok(CorrelationMatrix {
            features: features.to_vec(),
            values,
        })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    fn index(&self, feature: &str) -> Option<usize> {
        self.features.iter().position(|f| f == feature)
    }

    /// The coefficient between two distinct known features. `None` on the diagonal.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let (i, j) = (self.index(a)?, self.index(b)?);
        (i != j).then(|| self.values[[i, j]])
    }

    /// Whether `a` and `b` correlate above `threshold`. `NaN` never does.
    pub fn is_correlated(&self, a: &str, b: &str, threshold: f64) -> bool {
        self.get(a, b).is_some_and(|r| r > threshold)
    }
}
