//! Error types for the grammar correct service.

use thiserror::Error;

use crate::event::EventKind;

/// Main error type for the grammar correct service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcError {
    /// The inbound event matched none of the known shapes
    #[error("Unknown request type")]
    UnrecognizedRequestType,

    /// A queue batch arrived without any records
    #[error("Queue batch contains no records")]
    EmptyBatch,

    /// A message or connection body was not a valid request
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// The request is missing fields required by its event type
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The event was classified but has no dispatch behaviour
    #[error("Unsupported request type: {0}")]
    UnsupportedRequestType(EventKind),

    /// Failure reported by the request table or artifact store
    #[error("Storage error: {0}")]
    Storage(String),

    /// A processed request points at an artifact that does not exist
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The correction collaborator failed
    #[error("Correction error: {0}")]
    Correction(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GcError {
    /// Whether this error was raised while classifying an inbound event.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            GcError::UnrecognizedRequestType | GcError::EmptyBatch | GcError::MalformedBody(_)
        )
    }
}

/// Result type alias for grammar correct operations
pub type Result<T> = std::result::Result<T, GcError>;

impl From<serde_json::Error> for GcError {
    fn from(err: serde_json::Error) -> Self {
        GcError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for GcError {
    fn from(err: std::io::Error) -> Self {
        GcError::Storage(format!("IO error: {}", err))
    }
}
