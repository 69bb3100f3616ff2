//! Image record types.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use mirrorcut_shared::ImageId;
use serde::{Deserialize, Serialize};

/// Processing status of a record.
///
/// Uploads are synchronous, so every stored record is `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// Processing has started.
    Processing,
    /// Both blobs are stored.
    #[default]
    Completed,
    /// Processing failed.
    Failed,
}

/// Metadata for one uploaded and processed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique identifier.
    pub id: ImageId,
    /// Storage key of the original upload.
    pub original_key: String,
    /// Storage key of the processed PNG.
    pub processed_key: String,
    /// Public URL of the original upload.
    pub original_url: String,
    /// Public URL of the processed PNG.
    pub processed_url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Processing status.
    pub status: ImageStatus,
}

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Declared media type.
    pub content_type: String,
    /// Client-side file name, for logging only.
    pub file_name: Option<String>,
    /// File bytes.
    pub data: Bytes,
}

impl UploadedFile {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Processed image ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    /// Attachment file name (`processed-{id}.png`).
    pub file_name: String,
    /// Content type reported by the object host, `image/png` if absent.
    pub content_type: String,
    /// Image bytes.
    pub data: Bytes,
}
