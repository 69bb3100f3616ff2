//! Horizontal flip.

use std::io::Cursor;

use bytes::Bytes;
use image::ImageFormat;
use tracing::debug;

use super::error::ImagingError;

/// Content type of every transform output.
pub const OUTPUT_CONTENT_TYPE: &str = "image/png";

/// Decode `data` (format sniffed from content), flip it left-right and encode as PNG.
///
/// # Errors
///
/// Returns `Decode` for unreadable input and `Encode` if PNG encoding fails.
pub fn flip_horizontal(data: &[u8]) -> Result<Vec<u8>, ImagingError> {
    let decoded =
        image::load_from_memory(data).map_err(|e| ImagingError::Decode(e.to_string()))?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        "Flipping image horizontally"
    );

    let mut out = Cursor::new(Vec::new());
    decoded
        .fliph()
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ImagingError::Encode(e.to_string()))?;

    Ok(out.into_inner())
}

/// [`flip_horizontal`] on the blocking pool.
///
/// # Errors
///
/// Same as [`flip_horizontal`], plus `Task` if the blocking task fails.
pub async fn flip_horizontal_async(data: Bytes) -> Result<Bytes, ImagingError> {
    tokio::task::spawn_blocking(move || flip_horizontal(&data))
        .await
        .map_err(|e| ImagingError::Task(e.to_string()))?
        .map(Bytes::from)
}
