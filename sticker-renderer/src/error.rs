//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while decoding, compositing or encoding.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The composed canvas could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// The drawing surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),
}
