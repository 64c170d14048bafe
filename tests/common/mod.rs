//! Synthetic datasets shared by the integration tests.

#![allow(dead_code)]

use influence_rs::{Dataset, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub fn dataset(columns: &[&str], rows: Vec<Vec<f64>>, target: &str) -> Result<Dataset> {
    let n_rows = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let values = Array2::from_shape_vec((n_rows, columns.len()), flat)?;
    Dataset::new(columns.iter().map(|c| c.to_string()).collect(), values, target)
}

/// Columns `level` (discrete, 4 levels), `flag` (discrete, 2 levels),
/// `age` and `income` (continuous) and target `y`.
pub fn random_dataset(seed: u64, rows: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).unwrap();
    let data = (0..rows)
        .map(|_| {
            let level = rng.gen_range(0..4) as f64;
            let flag = rng.gen_range(0..2) as f64;
            let age = rng.gen_range(18.0..90.0);
            let income = 1_000.0 * level + rng.gen_range(0.0..5_000.0);
            let y = 3.0 * level + 4.0 * flag * level + 0.05 * age + noise.sample(&mut rng);
            vec![level, flag, age, income, y]
        })
        .collect();
    dataset(&["level", "flag", "age", "income", "y"], data, "y").unwrap()
}
