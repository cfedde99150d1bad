//! Error types for the behaviour classification pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BehavError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum BehavError {
    #[error("Alignment error: feature and label tables share no row keys")]
    Alignment,

    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid threshold: {value} (must be within [0, 1], or -1 to defer to the model default)")]
    InvalidThreshold { value: f64 },

    #[error("Insufficient data: requested {requested} negative samples, only {available} available")]
    InsufficientData { requested: usize, available: usize },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BehavError {
    /// Whether this error is the "no artifact yet" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, BehavError::NotFound { .. })
    }

    pub(crate) fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        BehavError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for BehavError {
    fn from(err: polars::error::PolarsError) -> Self {
        BehavError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for BehavError {
    fn from(err: serde_json::Error) -> Self {
        BehavError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BehavError {
    fn from(err: ndarray::ShapeError) -> Self {
        BehavError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BehavError::InvalidThreshold { value: 1.5 };
        assert!(err.to_string().contains("1.5"));

        let err = BehavError::InsufficientData { requested: 10, available: 3 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: requested 10 negative samples, only 3 available"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BehavError = io_err.into();
        assert!(matches!(err, BehavError::IoError(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_signal() {
        let err = BehavError::NotFound { path: PathBuf::from("/tmp/missing.json") };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing.json"));
    }
}
