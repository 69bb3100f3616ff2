//! Background removal error types.

use thiserror::Error;

/// Background removal errors, one per provider failure class.
#[derive(Debug, Error)]
pub enum RemovalError {
    /// Provider answered 429.
    #[error("Background removal rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Provider answered 400.
    #[error("Invalid image provided for background removal.")]
    InvalidImage,

    /// Provider answered 402.
    #[error("Background removal API credits exhausted.")]
    CreditsExhausted,

    /// Provider answered any other non-success status.
    #[error("Background removal failed ({status}): {body}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// No response was received (connect error, timeout, broken body).
    #[error("Background removal failed: {0}")]
    Transport(String),

    /// Client could not be configured.
    #[error("background removal configuration error: {0}")]
    Configuration(String),
}

impl RemovalError {
    /// Map a non-success provider status and body to a domain error.
    #[must_use]
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            429 => Self::RateLimited,
            400 => Self::InvalidImage,
            402 => Self::CreditsExhausted,
            _ => Self::Provider {
                status,
                body: body.into(),
            },
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
