//! Error types for Gait Flux

use thiserror::Error;

/// Errors that can occur during gait analysis
///
/// None of these are fatal: callers decide whether to surface "no data" or
/// retry with different parameters (for example a lower prominence threshold).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Insufficient samples: {0}")]
    InsufficientSamples(String),

    #[error("No steps detected: {0}")]
    NoStepsDetected(String),

    #[error("Insufficient step data for averaging: {0}")]
    InsufficientStepsForAveraging(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl AnalysisError {
    /// Stable machine-readable tag for this error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InsufficientSamples(_) => "insufficient_samples",
            AnalysisError::NoStepsDetected(_) => "no_steps_detected",
            AnalysisError::InsufficientStepsForAveraging(_) => "insufficient_steps_for_averaging",
            AnalysisError::MalformedInput(_) => "malformed_input",
            AnalysisError::InvalidConfig(_) => "invalid_config",
            AnalysisError::EncodingError(_) => "encoding_error",
        }
    }
}

/// Errors raised while acquiring samples from a file or record store
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
