// src/traits.rs

use crate::core::{FeatureCatalogue, IdSet};

/// Shared view over the nodes of an attribution tree (single features and groups).
pub trait Attribution {
    /// Rows currently attributed to this node.
    fn ids(&self) -> &IdSet;

    /// Marginal contribution of this node relative to whatever preceded it.
    fn score(&self) -> f64;

    /// Mean outcome of `ids`, relative to the dataset mean.
    fn value(&self) -> f64;

    fn size(&self) -> usize {
        self.ids().len()
    }

    /// Names of all features under this node, in insertion order.
    fn features(&self) -> Vec<&str>;

    fn display_name(&self, catalogue: &FeatureCatalogue) -> String;

    fn close_all(&mut self);
}
