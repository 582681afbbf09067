//! Error types for the Rubricator library.
//!
//! All fallible operations return [`RubricatorError`]. The classification
//! core never lets these escape `classify`/`classify_top_n`; they surface
//! from training, persistence and configuration instead.
//!
//! # Examples
//!
//! ```
//! use rubricator::error::{ErrorKind, RubricatorError, Result};
//!
//! fn train_nothing() -> Result<()> {
//!     Err(RubricatorError::no_trainable_data("all records were empty"))
//! }
//!
//! let err = train_nothing().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NoTrainableData);
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Rubricator operations.
#[derive(Error, Debug)]
pub enum RubricatorError {
    /// Empty or otherwise unusable input to a single-item call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A model adapter was used before any successful fit or load.
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Training input has the wrong shape (empty, length mismatch).
    #[error("Training data error: {0}")]
    TrainingData(String),

    /// No usable training pairs survived filtering.
    #[error("No trainable data: {0}")]
    NoTrainableData(String),

    /// Failure inside a vectorizer, model or embedder.
    #[error("Adapter failure: {0}")]
    Adapter(String),

    /// Persistence errors (model files, rule files, history)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation cancelled
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Error with attached context, printed with its whole cause chain
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with RubricatorError.
pub type Result<T> = std::result::Result<T, RubricatorError>;

/// Fieldless discriminant of [`RubricatorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    ModelNotLoaded,
    TrainingData,
    NoTrainableData,
    Adapter,
    Storage,
    Config,
    Cancelled,
    Io,
    Json,
    Other,
}

impl RubricatorError {
    /// Create a new invalid input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        RubricatorError::InvalidInput(msg.into())
    }

    /// Create a new model-not-loaded error.
    pub fn model_not_loaded<S: Into<String>>(msg: S) -> Self {
        RubricatorError::ModelNotLoaded(msg.into())
    }

    /// Create a new training data error.
    pub fn training_data<S: Into<String>>(msg: S) -> Self {
        RubricatorError::TrainingData(msg.into())
    }

    /// Create a new no-trainable-data error.
    pub fn no_trainable_data<S: Into<String>>(msg: S) -> Self {
        RubricatorError::NoTrainableData(msg.into())
    }

    /// Create a new adapter failure.
    pub fn adapter<S: Into<String>>(msg: S) -> Self {
        RubricatorError::Adapter(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        RubricatorError::Storage(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RubricatorError::Config(msg.into())
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        RubricatorError::Cancelled(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RubricatorError::Other(msg.into())
    }

    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RubricatorError::InvalidInput(_) => ErrorKind::InvalidInput,
            RubricatorError::ModelNotLoaded(_) => ErrorKind::ModelNotLoaded,
            RubricatorError::TrainingData(_) => ErrorKind::TrainingData,
            RubricatorError::NoTrainableData(_) => ErrorKind::NoTrainableData,
            RubricatorError::Adapter(_) => ErrorKind::Adapter,
            RubricatorError::Storage(_) => ErrorKind::Storage,
            RubricatorError::Config(_) => ErrorKind::Config,
            RubricatorError::Cancelled(_) => ErrorKind::Cancelled,
            RubricatorError::Io(_) => ErrorKind::Io,
            RubricatorError::Json(_) => ErrorKind::Json,
            RubricatorError::Other(_) | RubricatorError::Anyhow(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = RubricatorError::model_not_loaded("train first");
        assert_eq!(error.to_string(), "Model not loaded: train first");

        let error = RubricatorError::training_data("3 texts but 2 labels");
        assert_eq!(error.to_string(), "Training data error: 3 texts but 2 labels");

        let error = RubricatorError::adapter("vectorizer exploded");
        assert_eq!(error.to_string(), "Adapter failure: vectorizer exploded");
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        assert_eq!(
            RubricatorError::training_data("x").kind(),
            ErrorKind::TrainingData
        );
        assert_eq!(
            RubricatorError::no_trainable_data("x").kind(),
            ErrorKind::NoTrainableData
        );
        assert_ne!(
            RubricatorError::training_data("x").kind(),
            RubricatorError::no_trainable_data("x").kind()
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = RubricatorError::from(io_error);

        match error {
            RubricatorError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_context_chain_is_printed() {
        use anyhow::Context;

        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        let error = RubricatorError::from(result.context("cannot read rubrics.txt").unwrap_err());

        assert_eq!(error.to_string(), "cannot read rubrics.txt: no such file");
        assert_eq!(error.kind(), ErrorKind::Other);
    }
}
