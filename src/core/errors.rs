// src/core/errors.rs
use thiserror::Error;

/// Errors surfaced to callers of the explainer.
///
/// Insufficient support and degenerate statistics are not errors: they are
/// handled by exclusion, `None` predictions or `NaN` correlations.
#[derive(Debug, Error)]
pub enum ExplainError {
    /// Precondition violations: empty dataset, missing target column, bad configuration.
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    #[error("Incompatible Dimensions: {0}")]
    IncompatibleDimensions(String),

    #[error("Unknown Feature: {0}")]
    UnknownFeature(String),

    /// The value does not fall into any bin of the feature.
    #[error("Bin Not Found: value {value} of feature '{feature}' maps to no bin")]
    BinNotFound { feature: String, value: f64 },

    #[error("Ndarray Error: {0}")]
    Ndarray(#[from] ndarray::ShapeError),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config Error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl ExplainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unknown_feature(name: impl Into<String>) -> Self {
        Self::UnknownFeature(name.into())
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, ExplainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_not_found_names_feature_and_value() {
        let err = ExplainError::BinNotFound {
            feature: "age".to_string(),
            value: 120.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("age"));
        assert!(msg.contains("120.5"));
    }

    #[test]
    fn shape_error_converts() {
        let shape_err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0]).unwrap_err();
        let err: ExplainError = shape_err.into();
        assert!(matches!(err, ExplainError::Ndarray(_)));
    }
}
