//! Application configuration management.

use serde::Deserialize;

/// Default background removal endpoint.
pub const DEFAULT_REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";

/// Application configuration.
///
/// Credentials are optional at load time so the server can still start and serve
/// metadata reads; [`AppConfig::missing_settings`] reports what is absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Background removal provider configuration.
    #[serde(default)]
    pub remove_bg: RemoveBgSettings,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Background removal provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveBgSettings {
    /// API key sent as `X-Api-Key`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Provider endpoint.
    #[serde(default = "default_remove_bg_url")]
    pub api_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_remove_bg_timeout")]
    pub timeout_secs: u64,
}

impl Default for RemoveBgSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_remove_bg_url(),
            timeout_secs: default_remove_bg_timeout(),
        }
    }
}

fn default_remove_bg_url() -> String {
    DEFAULT_REMOVE_BG_URL.to_string()
}

fn default_remove_bg_timeout() -> u64 {
    60
}

/// S3-compatible object storage settings (Cloudflare R2 by default).
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Bucket name.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Base URL under which stored keys are publicly served.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Region. R2 uses `auto`.
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            bucket: None,
            public_url: None,
            region: default_region(),
        }
    }
}

fn default_region() -> String {
    "auto".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MIRRORCUT").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Lists the dotted keys of required settings that are missing or blank.
    #[must_use]
    pub fn missing_settings(&self) -> Vec<String> {
        let required = [
            ("remove_bg.api_key", &self.remove_bg.api_key),
            ("storage.endpoint", &self.storage.endpoint),
            ("storage.access_key_id", &self.storage.access_key_id),
            ("storage.secret_access_key", &self.storage.secret_access_key),
            ("storage.bucket", &self.storage.bucket),
            ("storage.public_url", &self.storage.public_url),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(key, _)| key.to_string())
            .collect()
    }
}
