//! Read-only statistics computed once per dataset and feature set.

pub mod binning;
pub mod correlation;
pub mod significance;
pub mod summary;

pub use binning::{
    BinSample, ContinuousBin, DiscreteBin, FeatureBins, FeatureProfile, FeatureType,
};
pub use correlation::{pearson, CorrelationMatrix};
pub use summary::{compute_summary, influence_range, DatasetSummary};
