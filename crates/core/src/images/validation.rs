//! Upload validation and storage key layout.

use mirrorcut_shared::ImageId;

use super::error::ImageError;

/// Media types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// Largest accepted upload: 10 MiB.
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Check the declared media type, then the size.
///
/// # Errors
///
/// `InvalidContentType` for types outside the allow-list, `FileTooLarge` above
/// [`MAX_UPLOAD_SIZE`].
pub fn validate_upload(content_type: &str, size: u64) -> Result<(), ImageError> {
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(ImageError::InvalidContentType(content_type.to_string()));
    }

    if size > MAX_UPLOAD_SIZE {
        return Err(ImageError::file_too_large(size, MAX_UPLOAD_SIZE));
    }

    Ok(())
}

/// File extension for a media type, `png` when unknown.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// `originals/{id}.{ext}`
#[must_use]
pub fn original_key(id: ImageId, extension: &str) -> String {
    format!("originals/{id}.{extension}")
}

/// `processed/{id}.png`
#[must_use]
pub fn processed_key(id: ImageId) -> String {
    format!("processed/{id}.png")
}
