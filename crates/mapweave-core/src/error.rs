//! Error types for mapweave
//!
//! Only host-level conditions become errors. Member- and request-level
//! problems are reported as [`Diagnostic`](crate::Diagnostic)s instead.

use thiserror::Error;

/// Result type alias for mapweave operations
pub type MapweaveResult<T> = Result<T, MapweaveError>;

/// Error type for run-level failures
#[derive(Error, Debug)]
pub enum MapweaveError {
    /// The mapper annotation is not in scope, so no request can be trusted
    #[error("mapper annotation '{0}' could not be located")]
    MissingAnnotation(String),

    /// The host aborted the run
    #[error("generation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Worker pool could not be created
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Source could not be scanned
    #[error("scan error: {0}")]
    Scan(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl MapweaveError {
    /// Returns a stable numeric code for the error
    pub fn error_code(&self) -> u32 {
        match self {
            MapweaveError::MissingAnnotation(_) => 1,
            MapweaveError::Cancelled => 2,
            MapweaveError::Config(_) => 3,
            MapweaveError::WorkerPool(_) => 4,
            MapweaveError::Scan(_) => 5,
            MapweaveError::Serialization(_) => 6,
            MapweaveError::Internal(_) => 7,
        }
    }
}

impl From<serde_json::Error> for MapweaveError {
    fn from(err: serde_json::Error) -> Self {
        MapweaveError::Serialization(err.to_string())
    }
}
