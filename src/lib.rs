// src/lib.rs

//! `influence_rs` explains a single row of a tabular dataset without a model.
//!
//! The deviation of the row's expected outcome from the dataset mean is split
//! into contributions of individual features and of automatically discovered
//! groups of interacting or correlated features. Every "prediction" is the
//! empirical mean outcome of a data subset.

pub mod algorithms;
pub mod core;
pub mod stats;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{
    AttributionNode, ExplanationResult, FeatureAbnormality, FeatureNode, GroupKind, GroupNode,
    InfluenceExplainer, MainEffect, WhatIfSample,
};
pub use crate::core::{
    load_config, Dataset, ExplainError, ExplainerConfig, FeatureCatalogue, IdSet, Instance, Result,
};
pub use crate::stats::{DatasetSummary, FeatureBins, FeatureType};
pub use crate::traits::Attribution;
