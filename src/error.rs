//! Error types for trip-metrics

use thiserror::Error;

/// Errors that can occur at the engine boundary.
///
/// The computation itself is infallible; these cover parsing snapshots and
/// configuration, and encoding results.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to parse trip snapshot: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
