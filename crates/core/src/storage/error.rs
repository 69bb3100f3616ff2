//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object under the key.
    #[error("no object at {key}")]
    NotFound {
        /// Missing key.
        key: String,
    },

    /// Provider settings are missing or rejected.
    #[error("object store misconfigured: {0}")]
    Configuration(String),

    /// Any other provider failure.
    #[error("object store request failed: {0}")]
    Operation(String),

    /// Fetching an object through its public URL failed.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// Public URL that was requested.
        url: String,
        /// Transport error or HTTP status.
        reason: String,
    },
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a public fetch error.
    #[must_use]
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        let text = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::not_found(text),
            ErrorKind::ConfigInvalid => Self::configuration(text),
            _ => Self::operation(text),
        }
    }
}
