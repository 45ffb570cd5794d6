//! Error types for fearcond

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Alignment window [{start}, {end}) outside signal bounds (len {len})")]
    OutOfRange { start: i64, end: i64, len: usize },

    #[error("Invalid epoch name: {0}")]
    InvalidEpoch(String),

    #[error("Series length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Unknown trial id: {0}")]
    MissingTrial(String),

    #[error("Failed to parse tracking session: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),
}
