//! Imaging error types.

use thiserror::Error;

/// Image transform errors.
#[derive(Debug, Error)]
pub enum ImagingError {
    /// Input bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// PNG encoding failed.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The blocking transform task panicked or was cancelled.
    #[error("Image transform task failed: {0}")]
    Task(String),
}
