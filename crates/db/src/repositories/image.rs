//! Image record repository.
//!
//! Implements the record store on a concurrent map. Each operation touches a single
//! shard lock, so concurrent save, delete and list calls never observe a torn map and
//! a removal happens exactly once.

use dashmap::DashMap;
use tracing::info;

use mirrorcut_core::images::{ImageError, ImageRecord, ImageRepository};
use mirrorcut_shared::ImageId;

/// In-memory image repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryImageRepository {
    records: DashMap<ImageId, ImageRecord>,
}

impl InMemoryImageRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ImageRepository for InMemoryImageRepository {
    async fn save(&self, record: ImageRecord) -> Result<(), ImageError> {
        let id = record.id;
        self.records.insert(id, record);
        info!(image_id = %id, "Saved record");
        Ok(())
    }

    async fn find_by_id(&self, id: ImageId) -> Result<Option<ImageRecord>, ImageError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, id: ImageId) -> Result<bool, ImageError> {
        let existed = self.records.remove(&id).is_some();
        if existed {
            info!(image_id = %id, "Deleted record");
        }
        Ok(existed)
    }

    /// Records ordered by creation time, oldest first.
    async fn list(&self) -> Result<Vec<ImageRecord>, ImageError> {
        let mut records: Vec<ImageRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }
}
