//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in editor operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Overlay id is not part of the catalog.
    #[error("Unknown overlay: {0}")]
    UnknownOverlay(String),

    /// A support message failed validation.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A collaborator (storage, record sink) failed.
    #[error("Collaborator failed: {0}")]
    Collaborator(String),
}
