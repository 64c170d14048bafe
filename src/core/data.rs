// src/core/data.rs
use crate::core::{ExplainError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Serialize;
use std::fmt;

/// A single query row, aligned with the dataset columns. `NaN` marks a missing value.
pub type Instance = Array1<f64>;

/// A loaded tabular dataset with one designated target column.
///
/// Rows are referenced by their position, which never changes for the lifetime
/// of the value. Missing cells are stored as `NaN`.
#[derive(Debug, Clone)]
pub struct Dataset {
    values: Array2<f64>,
    columns: Vec<String>,
    target: usize,
}

impl Dataset {
    pub fn new(columns: Vec<String>, values: Array2<f64>, target: &str) -> Result<Self> {
        if values.nrows() == 0 {
            return Err(ExplainError::invalid_input("Dataset cannot be empty."));
        }
        if values.ncols() != columns.len() {
            return Err(ExplainError::IncompatibleDimensions(format!(
                "Dataset has {} columns, but {} column names were given.",
                values.ncols(),
                columns.len()
            )));
        }
        let target = columns.iter().position(|c| c == target).ok_or_else(|| {
            ExplainError::invalid_input(format!("Target column '{}' is missing.", target))
        })?;

        Ok(Dataset {
            values,
            columns,
            target,
        })
    }

    /// Builds a dataset from row-major records. `None` cells become `NaN`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Option<f64>>>, target: &str) -> Result<Self> {
        let n_cols = columns.len();
        let n_rows = rows.len();
        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(ExplainError::IncompatibleDimensions(format!(
                    "Row {} has {} values, expected {}.",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            flat.extend(row.into_iter().map(|v| v.unwrap_or(f64::NAN)));
        }
        let values = Array2::from_shape_vec((n_rows, n_cols), flat)?;
        Dataset::new(columns, values, target)
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn target_name(&self) -> &str {
        &self.columns[self.target]
    }

    pub fn target_index(&self) -> usize {
        self.target
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ExplainError::unknown_feature(name))
    }

    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.column(index)
    }

    pub fn target(&self) -> ArrayView1<'_, f64> {
        self.values.column(self.target)
    }

    /// Copies row `id` out as an instance.
    pub fn row(&self, id: usize) -> Option<Instance> {
        (id < self.nrows()).then(|| self.values.index_axis(Axis(0), id).to_owned())
    }

    /// The names of all columns except the target, in column order.
    pub fn non_target_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.target)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

/// Sorted, de-duplicated row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdSet(Vec<usize>);

impl IdSet {
    /// Every row of a dataset with `n` rows.
    pub fn all(n: usize) -> Self {
        IdSet((0..n).collect())
    }

    pub fn from_unsorted(mut ids: Vec<usize>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        IdSet(ids)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn intersect(&self, other: &IdSet) -> IdSet {
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        IdSet(out)
    }
}

impl FromIterator<usize> for IdSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        IdSet::from_unsorted(iter.into_iter().collect())
    }
}

impl fmt::Display for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn columns() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "y".to_string()]
    }

    #[test]
    fn new_rejects_missing_target() {
        let values = array![[1.0, 2.0, 3.0]];
        let err = Dataset::new(columns(), values, "price").unwrap_err();
        assert!(matches!(err, ExplainError::InvalidInput(_)));
    }

    #[test]
    fn new_rejects_empty_dataset() {
        let values = Array2::<f64>::zeros((0, 3));
        assert!(Dataset::new(columns(), values, "y").is_err());
    }

    #[test]
    fn from_rows_maps_none_to_nan() -> Result<()> {
        let rows = vec![vec![Some(1.0), None, Some(3.0)], vec![Some(4.0), Some(5.0), Some(6.0)]];
        let dataset = Dataset::from_rows(columns(), rows, "y")?;
        assert_eq!(dataset.nrows(), 2);
        assert!(dataset.column(1)[0].is_nan());
        assert_eq!(dataset.target_name(), "y");
        assert_eq!(dataset.non_target_columns(), vec!["a".to_string(), "b".to_string()]);
        Ok(())
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = vec![vec![Some(1.0), Some(2.0)]];
        let err = Dataset::from_rows(columns(), rows, "y").unwrap_err();
        assert!(matches!(err, ExplainError::IncompatibleDimensions(_)));
    }

    #[test]
    fn intersect_keeps_common_ids() {
        let a: IdSet = vec![5, 1, 3, 9, 3].into_iter().collect();
        let b: IdSet = vec![3, 4, 5, 10].into_iter().collect();
        assert_eq!(a.as_slice(), &[1, 3, 5, 9]);
        assert_eq!(a.intersect(&b).as_slice(), &[3, 5]);
        assert!(a.intersect(&IdSet::default()).is_empty());
        assert!(IdSet::all(4).contains(3));
    }
}
