// src/utils.rs

/// Rounds `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Mean of the finite values, `None` when there are none.
pub fn finite_mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Population standard deviation of the finite values (`n` denominator).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mean = finite_mean(values.iter().copied())?;
    let (sq, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + (v - mean).powi(2), c + 1));
    Some((sq / count as f64).sqrt())
}

/// Number of decimals needed to print multiples of `step` exactly.
pub fn step_decimals(step: f64) -> u32 {
    (-step.log10().floor()).max(0.0) as u32
}
