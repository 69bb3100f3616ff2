//! Application-wide error types.

use thiserror::Error;

/// Application error types.
///
/// Every domain error converts into one of these at the HTTP boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request input failed validation (missing file, disallowed type).
    #[error("{0}")]
    Validation(String),

    /// Upload exceeds the size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Required settings are missing.
    #[error("Service not configured: {0}")]
    Configuration(String),

    /// Background removal provider or object store failed.
    #[error("{0}")]
    ExternalService(String),

    /// An upstream fetch on behalf of the client failed.
    #[error("{0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::BadGateway(_) => 502,
            Self::Configuration(_) | Self::ExternalService(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code used in logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::BadGateway(_) => "BAD_GATEWAY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
