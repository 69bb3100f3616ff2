//! Image operation error types.

use mirrorcut_shared::{AppError, ImageId};
use thiserror::Error;
use tracing::error;

use crate::pipeline::PipelineError;
use crate::storage::StorageError;

/// Image operation errors.
#[derive(Debug, Error)]
pub enum ImageError {
    /// No file in the request.
    #[error("No image file provided")]
    MissingFile,

    /// Declared media type is not in the allow-list.
    #[error("Invalid file type: {0}. Allowed: image/png, image/jpeg, image/webp")]
    InvalidContentType(String),

    /// File exceeds the size limit.
    #[error("File size exceeds 10MB limit")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// No record with this id.
    #[error("Image not found")]
    NotFound(ImageId),

    /// Object store operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Background removal or flip failed.
    #[error(transparent)]
    Processing(#[from] PipelineError),

    /// The processed image could not be fetched from its public URL.
    #[error("Failed to fetch image")]
    DownloadFailed(String),
}

impl ImageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: ImageId) -> Self {
        Self::NotFound(id)
    }

    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }
}

/// Client-facing text for object store failures. Provider errors name the endpoint,
/// bucket and key, so they only go to the log.
pub const STORAGE_FAILURE_MESSAGE: &str = "object store request failed";

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        let message = err.to_string();
        match err {
            ImageError::MissingFile | ImageError::InvalidContentType(_) => {
                Self::Validation(message)
            }
            ImageError::FileTooLarge { .. } => Self::PayloadTooLarge(message),
            ImageError::NotFound(_) => Self::NotFound(message),
            ImageError::Storage(StorageError::Configuration(msg)) => Self::Configuration(msg),
            ImageError::Storage(source) => {
                error!(error = %source, "Object store request failed");
                Self::ExternalService(STORAGE_FAILURE_MESSAGE.to_string())
            }
            ImageError::Processing(PipelineError::Removal(_)) => Self::ExternalService(message),
            ImageError::DownloadFailed(_) => Self::BadGateway(message),
            ImageError::Processing(PipelineError::Imaging(_)) => Self::Internal(message),
        }
    }
}
