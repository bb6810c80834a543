//! Error types for the docqa tool.
//!
//! This module defines a unified error enum covering every failure category
//! in the application: configuration, index construction, persisted state,
//! and the three external collaborators (extraction, embedding, generation).

use thiserror::Error;

/// Unified error type for the docqa tool.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// An absent or empty corpus is *not* an error: query operations report it
/// as an empty result set so callers can answer "no information found"
/// instead of failing.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid configuration (e.g., chunker overlap >= window)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Heterogeneous vector lengths handed to one index
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted corpus unreadable or internally inconsistent
    #[error("Corrupt corpus state: {0}")]
    CorruptState(String),

    /// Document extraction collaborator failed
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Embedding collaborator failed
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// Generation collaborator failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = AppError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert_eq!(
            err.to_string(),
            "Vector dimension mismatch: expected 768, got 384"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
