//! remove.bg HTTP client.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use mirrorcut_shared::RemoveBgSettings;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use super::error::RemovalError;

/// Removes the background from an encoded image.
pub trait BackgroundRemover: Send + Sync {
    /// Return a new encoded image with the background removed.
    fn remove(&self, image: Bytes) -> impl Future<Output = Result<Bytes, RemovalError>> + Send;
}

/// remove.bg client configuration.
#[derive(Debug, Clone)]
pub struct RemoveBgConfig {
    /// API key sent as `X-Api-Key`.
    pub api_key: String,
    /// Provider endpoint.
    pub api_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl RemoveBgConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a config with the default timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is missing.
    pub fn from_settings(settings: &RemoveBgSettings) -> Result<Self, RemovalError> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RemovalError::configuration("missing remove_bg.api_key"))?;

        Ok(Self::new(api_key, settings.api_url.clone())
            .with_timeout(Duration::from_secs(settings.timeout_secs)))
    }
}

/// remove.bg client. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct RemoveBgClient {
    http: reqwest::Client,
    config: RemoveBgConfig,
}

impl RemoveBgClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: RemoveBgConfig) -> Result<Self, RemovalError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemovalError::configuration(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// The image part carries its length so the request is sent with `Content-Length`.
    fn form(image: Bytes) -> Form {
        let len = image.len() as u64;
        Form::new()
            .part(
                "image_file",
                Part::stream_with_length(image, len).file_name("image.png"),
            )
            .text("size", "auto")
            .text("type", "auto")
    }
}

impl BackgroundRemover for RemoveBgClient {
    async fn remove(&self, image: Bytes) -> Result<Bytes, RemovalError> {
        info!(size = image.len(), "Sending image to background removal provider");

        let response = self
            .http
            .post(&self.config.api_url)
            .header("X-Api-Key", &self.config.api_key)
            .multipart(Self::form(image))
            .send()
            .await
            .map_err(|e| RemovalError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Background removal rejected");
            return Err(RemovalError::from_status(status.as_u16(), body));
        }

        let output = response
            .bytes()
            .await
            .map_err(|e| RemovalError::transport(e.to_string()))?;

        info!(size = output.len(), "Background removed");
        Ok(output)
    }
}
