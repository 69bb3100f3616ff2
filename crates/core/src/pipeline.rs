//! Processing pipeline: background removal, then horizontal flip.
//!
//! Failures from either step propagate unchanged. Nothing is caught, retried or
//! partially recovered.

use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::imaging::{self, ImagingError};
use crate::removal::{BackgroundRemover, RemovalError};

/// Pipeline failure, transparent over the step that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Background removal failed.
    #[error(transparent)]
    Removal(#[from] RemovalError),

    /// Flip or re-encode failed.
    #[error(transparent)]
    Imaging(#[from] ImagingError),
}

/// Buffer in, buffer out composition of a [`BackgroundRemover`] and the flip.
pub struct ProcessingPipeline<B: BackgroundRemover> {
    remover: B,
}

impl<B: BackgroundRemover> ProcessingPipeline<B> {
    /// Create a pipeline around a background remover.
    #[must_use]
    pub fn new(remover: B) -> Self {
        Self { remover }
    }

    /// Run both steps and return the flipped PNG.
    ///
    /// # Errors
    ///
    /// Returns the first step's error unchanged.
    pub async fn process(&self, image: Bytes) -> Result<Bytes, PipelineError> {
        info!(size = image.len(), "Starting image processing pipeline");

        let cutout = self.remover.remove(image).await?;
        let flipped = imaging::flip_horizontal_async(cutout).await?;

        info!(size = flipped.len(), "Pipeline complete");
        Ok(flipped)
    }
}
