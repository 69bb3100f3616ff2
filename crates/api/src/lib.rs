//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for upload and image records
//! - The `{success, data | error | message}` response envelope
//! - Application state wiring

pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mirrorcut_core::images::{ImageService, MAX_UPLOAD_SIZE};
use mirrorcut_core::removal::RemoveBgClient;
use mirrorcut_db::InMemoryImageRepository;
use mirrorcut_shared::AppError;

/// Image service as wired in production.
pub type Images = ImageService<InMemoryImageRepository, RemoveBgClient>;

/// Request body limit: the largest accepted file plus room for multipart framing.
/// Bodies past it are answered with 413 before validation runs.
pub const BODY_LIMIT: usize = MAX_UPLOAD_SIZE as usize + 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Metadata store, always available.
    pub records: Arc<InMemoryImageRepository>,
    /// Upload pipeline; `None` when required settings are missing.
    pub images: Option<Arc<Images>>,
    /// Settings that kept `images` from being built.
    pub missing_settings: Arc<[String]>,
}

impl AppState {
    /// State with a fully configured image service.
    #[must_use]
    pub fn configured(records: Arc<InMemoryImageRepository>, images: Arc<Images>) -> Self {
        Self {
            records,
            images: Some(images),
            missing_settings: Arc::from([]),
        }
    }

    /// State without an image service; storage-backed routes answer 500.
    #[must_use]
    pub fn unconfigured(records: Arc<InMemoryImageRepository>, missing: Vec<String>) -> Self {
        Self {
            records,
            images: None,
            missing_settings: missing.into(),
        }
    }

    /// The image service, or a configuration error naming the missing settings.
    pub fn images(&self) -> Result<&Arc<Images>, AppError> {
        self.images.as_ref().ok_or_else(|| {
            AppError::Configuration(format!("missing {}", self.missing_settings.join(", ")))
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
