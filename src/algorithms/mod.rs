pub mod explainer;
pub mod explanation;
pub mod grouping;
pub mod node;
pub mod similarity;

pub use explainer::{FeatureAbnormality, InfluenceExplainer, WhatIfSample};
pub use explanation::ExplanationResult;
pub use node::{AttributionNode, FeatureNode, GroupKind, GroupNode};
pub use similarity::MainEffect;
