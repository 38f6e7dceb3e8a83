//! Error types for artifact loading and inference

use thiserror::Error;

/// Errors raised while loading the classifier artifact or producing a
/// prediction from it.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Artifact fails structural validation
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    /// Artifact was trained against a different feature schema
    #[error("artifact column mismatch: expected {expected} columns, artifact declares {actual}")]
    ColumnMismatch { expected: usize, actual: usize },

    /// Artifact column name disagrees with the feature schema
    #[error("artifact column {index} is {found:?}, expected {expected:?}")]
    ColumnName {
        index: usize,
        expected: String,
        found: String,
    },

    /// Input row width does not match what the artifact expects
    #[error("input row has {actual} features, artifact expects {expected}")]
    RowWidth { expected: usize, actual: usize },

    /// I/O error reading the artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact is not valid JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
