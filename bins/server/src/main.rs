//! Mirrorcut API Server
//!
//! Main entry point for the image upload service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirrorcut_api::{AppState, Images, create_router};
use mirrorcut_core::images::ImageService;
use mirrorcut_core::removal::{RemoveBgClient, RemoveBgConfig};
use mirrorcut_core::storage::{StorageConfig, StorageService};
use mirrorcut_db::InMemoryImageRepository;
use mirrorcut_shared::AppConfig;

fn build_images(
    config: &AppConfig,
    records: Arc<InMemoryImageRepository>,
) -> anyhow::Result<Images> {
    let storage = StorageService::from_config(StorageConfig::from_settings(&config.storage)?)?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        "Object storage configured"
    );

    let remover = RemoveBgClient::new(RemoveBgConfig::from_settings(&config.remove_bg)?)?;
    info!(
        api_url = %config.remove_bg.api_url,
        timeout_secs = config.remove_bg.timeout_secs,
        "Background removal configured"
    );

    Ok(ImageService::new(Arc::new(storage), remover, records))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirrorcut=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Create application state
    let records = Arc::new(InMemoryImageRepository::new());
    let missing = config.missing_settings();
    let state = if missing.is_empty() {
        let images = build_images(&config, records.clone())?;
        AppState::configured(records, Arc::new(images))
    } else {
        warn!(
            missing = %missing.join(", "),
            "Service not configured, storage-backed routes will answer 500"
        );
        AppState::unconfigured(records, missing)
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
