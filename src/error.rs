//! Error types for the pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Caller violated an input precondition (misaligned lengths, missing column, empty data)
    #[error("Input contract violated: {0}")]
    InputContract(String),

    /// A configuration value is out of range or unknown
    #[error("Invalid configuration: {field} ({reason})")]
    Configuration { field: String, reason: String },

    /// Train/test split could not be produced as requested
    #[error("Split error: {0}")]
    Split(String),

    /// A model failed during fitting
    #[error("Model '{model}' failed to fit: {reason}")]
    FitFailure { model: String, reason: String },

    /// Model used before fitting
    #[error("Model not fitted")]
    ModelNotFitted,

    /// Metric could not be computed for the given inputs
    #[error("Metric error: {0}")]
    Metric(String),

    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration file could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Shorthand for a configuration error on a named field
    pub fn config_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach a model name to an error raised while fitting it
    pub fn fit_failure(model: impl Into<String>, source: PipelineError) -> Self {
        PipelineError::FitFailure {
            model: model.into(),
            reason: source.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::Shape {
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
        let err = PipelineError::InputContract("labels empty".to_string());
        assert_eq!(err.to_string(), "Input contract violated: labels empty");
    }

    #[test]
    fn test_configuration_names_field() {
        let err = PipelineError::config_field("test_size", "must be in (0, 1)");
        assert!(err.to_string().contains("test_size"));
    }

    #[test]
    fn test_fit_failure_carries_model() {
        let err = PipelineError::fit_failure("SVM", PipelineError::ModelNotFitted);
        assert_eq!(err.to_string(), "Model 'SVM' failed to fit: Model not fitted");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
