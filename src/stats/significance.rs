// src/stats/significance.rs
use statrs::distribution::{ContinuousCDF, StudentsT};

/// One-sample t statistic of an observed mean against a hypothesized mean.
///
/// `std` is the standard deviation of the `n` observations behind `observed`.
pub fn t_score(hypothesized: f64, observed: f64, std: f64, n: usize) -> f64 {
    (observed - hypothesized) / (std / (n as f64).sqrt())
}

/// Two-sided p-value of `t` under Student's t with `degrees_of_freedom`.
///
/// `None` when the test is undefined (`NaN` statistic or no degrees of freedom).
pub fn two_sided_p_value(t: f64, degrees_of_freedom: f64) -> Option<f64> {
    if t.is_nan() || !(degrees_of_freedom > 0.0) {
        return None;
    }
    if t.is_infinite() {
        return Some(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom).ok()?;
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    Some(p.clamp(0.0, 1.0))
}
