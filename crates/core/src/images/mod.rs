//! Image upload orchestration and record operations.
//!
//! This module provides:
//! - Upload validation (type allow-list, size limit)
//! - The upload sequence: store original, process, store result, save record
//! - Record deletion across both blobs and the metadata store
//! - Download of the processed image through its public URL

mod error;
mod service;
mod types;
mod validation;

pub use error::{ImageError, STORAGE_FAILURE_MESSAGE};
pub use service::{ImageRepository, ImageService};
pub use types::{DownloadedImage, ImageRecord, ImageStatus, UploadedFile};
pub use validation::{
    ALLOWED_CONTENT_TYPES, MAX_UPLOAD_SIZE, extension_for, original_key, processed_key,
    validate_upload,
};
