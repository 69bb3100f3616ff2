//! Image service implementation.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use mirrorcut_shared::ImageId;
use tracing::{error, info};

use super::error::ImageError;
use super::types::{DownloadedImage, ImageRecord, ImageStatus, UploadedFile};
use super::validation::{extension_for, original_key, processed_key, validate_upload};
use crate::imaging::OUTPUT_CONTENT_TYPE;
use crate::pipeline::ProcessingPipeline;
use crate::removal::BackgroundRemover;
use crate::storage::StorageService;

/// Repository trait for image record persistence.
///
/// This trait is implemented by the db crate. Four operations, keyed uniquely by id.
pub trait ImageRepository: Send + Sync {
    /// Insert or overwrite a record by id.
    fn save(&self, record: ImageRecord)
    -> impl Future<Output = Result<(), ImageError>> + Send;

    /// Find a record by id.
    fn find_by_id(
        &self,
        id: ImageId,
    ) -> impl Future<Output = Result<Option<ImageRecord>, ImageError>> + Send;

    /// Remove a record; returns whether it existed.
    fn delete(&self, id: ImageId) -> impl Future<Output = Result<bool, ImageError>> + Send;

    /// All records.
    fn list(&self) -> impl Future<Output = Result<Vec<ImageRecord>, ImageError>> + Send;
}

/// Upload orchestrator and record operations that touch storage.
pub struct ImageService<R: ImageRepository, B: BackgroundRemover> {
    storage: Arc<StorageService>,
    pipeline: ProcessingPipeline<B>,
    repo: Arc<R>,
}

impl<R: ImageRepository, B: BackgroundRemover> ImageService<R, B> {
    /// Create a new image service.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, remover: B, repo: Arc<R>) -> Self {
        Self {
            storage,
            pipeline: ProcessingPipeline::new(remover),
            repo,
        }
    }

    /// Validate, store the original, process, store the result and save the record.
    ///
    /// Steps run in order and are not compensated: if processing or the second write
    /// fails, the original stays in storage with no record pointing at it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No file was provided
    /// - The media type is not allowed
    /// - The file is larger than the limit
    /// - Storage, background removal or the flip fails
    pub async fn upload(&self, file: Option<UploadedFile>) -> Result<ImageRecord, ImageError> {
        let file = file.ok_or(ImageError::MissingFile)?;
        validate_upload(&file.content_type, file.size())?;

        let id = ImageId::new();
        info!(
            image_id = %id,
            file_name = file.file_name.as_deref().unwrap_or(""),
            content_type = %file.content_type,
            size = file.size(),
            "Processing upload"
        );

        let original_key = original_key(id, extension_for(&file.content_type));
        let original_url = self
            .storage
            .put(file.data.clone(), &original_key, &file.content_type)
            .await?;

        let processed = self.pipeline.process(file.data).await.inspect_err(|e| {
            error!(
                image_id = %id,
                original_key = %original_key,
                error = %e,
                "Processing failed, original left in storage"
            );
        })?;

        let processed_key = processed_key(id);
        let processed_url = self
            .storage
            .put(processed, &processed_key, OUTPUT_CONTENT_TYPE)
            .await?;

        let record = ImageRecord {
            id,
            original_key,
            processed_key,
            original_url,
            processed_url,
            created_at: Utc::now(),
            status: ImageStatus::Completed,
        };
        self.repo.save(record.clone()).await?;

        info!(image_id = %id, "Upload complete");
        Ok(record)
    }

    /// Delete both blobs, then the record.
    ///
    /// If either blob deletion fails the record is kept. Whichever blob was already
    /// deleted stays deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist or a concurrent delete removed
    /// it first, and a storage error if a blob deletion fails.
    pub async fn delete(&self, id: ImageId) -> Result<(), ImageError> {
        let record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ImageError::not_found(id))?;

        info!(image_id = %id, "Deleting stored objects");
        tokio::try_join!(
            self.storage.delete(&record.original_key),
            self.storage.delete(&record.processed_key),
        )?;

        if !self.repo.delete(id).await? {
            return Err(ImageError::not_found(id));
        }

        info!(image_id = %id, "Image deleted");
        Ok(())
    }

    /// Fetch the processed image through its public URL.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist and `DownloadFailed` if the
    /// fetch fails or answers with a non-success status.
    pub async fn download(&self, id: ImageId) -> Result<DownloadedImage, ImageError> {
        let record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ImageError::not_found(id))?;

        let fetched = self
            .storage
            .fetch_public(&record.processed_url)
            .await
            .map_err(|e| {
                error!(image_id = %id, error = %e, "Failed to fetch processed image");
                ImageError::DownloadFailed(e.to_string())
            })?;

        Ok(DownloadedImage {
            file_name: format!("processed-{id}.png"),
            content_type: fetched
                .content_type
                .unwrap_or_else(|| OUTPUT_CONTENT_TYPE.to_string()),
            data: fetched.data,
        })
    }
}
