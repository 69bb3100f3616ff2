//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// An object fetched through its public URL.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    /// Content type reported by the server, if any.
    pub content_type: Option<String>,
    /// Object bytes.
    pub data: Bytes,
}

/// Object store client for original and processed images.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
    http: reqwest::Client,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::configuration(e.to_string()))?;
        Ok(Self {
            operator,
            config,
            http,
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()),
        }
    }

    /// Write an object and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn put(
        &self,
        data: Bytes,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        info!(key = %key, size = data.len(), "Uploading object");

        // Fs and memory backends reject content types.
        if self.operator.info().full_capability().write_with_content_type {
            self.operator
                .write_with(key, data)
                .content_type(content_type)
                .await
                .map_err(StorageError::from)?;
        } else {
            self.operator
                .write(key, data)
                .await
                .map_err(StorageError::from)?;
        }

        let url = self.config.public_url_for(key);
        info!(key = %key, url = %url, "Upload complete");
        Ok(url)
    }

    /// Delete an object. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        info!(key = %key, "Deleting object");
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Read an object directly from the backend.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key does not exist.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        match self.operator.read(key).await {
            Ok(buffer) => Ok(buffer.to_bytes()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// List object keys under a prefix, recursively, sorted.
    ///
    /// Not called by the upload path. It audits what the store holds, such as
    /// originals left behind by uploads that failed during processing.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self
            .operator
            .list_with(prefix)
            .recursive(true)
            .await
            .map_err(StorageError::from)?;

        let mut keys: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.path().to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Fetch an object through its public URL.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` on transport errors and non-success statuses.
    pub async fn fetch_public(&self, url: &str) -> Result<FetchedObject, StorageError> {
        debug!(url = %url, "Fetching public object");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::fetch(url, format!("HTTP {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::fetch(url, e.to_string()))?;

        Ok(FetchedObject { content_type, data })
    }

    /// Public URL for a key.
    #[must_use]
    pub fn public_url_for(&self, key: &str) -> String {
        self.config.public_url_for(key)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }
}
