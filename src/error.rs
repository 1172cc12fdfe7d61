//! Error types for the imputation engine

use thiserror::Error;

/// Result type alias for imputation operations
pub type Result<T> = std::result::Result<T, ImputeError>;

/// Main error type for the imputation engine
#[derive(Error, Debug)]
pub enum ImputeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ImputeError {
    /// Whether the error stems from how the imputer was configured or
    /// driven (unknown policy names, unsupported estimators, transform
    /// before fit) rather than from the data itself.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ImputeError::ConfigError(_)
                | ImputeError::InvalidParameter { .. }
                | ImputeError::ModelNotFitted
        )
    }
}

impl From<serde_json::Error> for ImputeError {
    fn from(err: serde_json::Error) -> Self {
        ImputeError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ImputeError {
    fn from(err: ndarray::ShapeError) -> Self {
        ImputeError::ShapeError {
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
        let err = ImputeError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ImputeError = io_err.into();
        assert!(matches!(err, ImputeError::IoError(_)));
    }

    #[test]
    fn test_config_error_class() {
        assert!(ImputeError::ModelNotFitted.is_config_error());
        assert!(ImputeError::ConfigError("bad".into()).is_config_error());
        assert!(!ImputeError::DataError("row 3".into()).is_config_error());
        let shape = ImputeError::ShapeError {
            expected: "3 features".into(),
            actual: "4 features".into(),
        };
        assert!(!shape.is_config_error());
    }
}
