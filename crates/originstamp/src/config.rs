//! Service configuration.
//!
//! Deployment options come from a TOML file and fall back to defaults when
//! the file is missing or malformed. The credential and notification address
//! are not part of the file: they live in the ledger database and can be
//! overridden from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use originstamp_client::{HttpConfig, DEFAULT_ENDPOINT};
use originstamp_core::Settings;
use originstamp_store::{Result as StoreResult, SettingsStore};

use crate::gateway::{GatewayConfig, DEFAULT_PAGE_SIZE, DEFAULT_VERIFY_BASE_URL};

/// Overrides the stored API key.
pub const API_KEY_ENV: &str = "ORIGINSTAMP_API_KEY";
/// Overrides the stored notification address.
pub const EMAIL_ENV: &str = "ORIGINSTAMP_EMAIL";

/// Deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_addr: String,
    /// Base URL of the timestamping service.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub page_size: u64,
    /// Pickup directory for outgoing mail.
    pub spool_dir: PathBuf,
    pub mail_from: String,
    pub verify_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("originstamp.db"),
            bind_addr: "127.0.0.1:8080".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 45,
            max_redirects: 5,
            page_size: DEFAULT_PAGE_SIZE,
            spool_dir: PathBuf::from("spool"),
            mail_from: "originstamp@localhost".to_string(),
            verify_base_url: DEFAULT_VERIFY_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            endpoint: self.endpoint.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_redirects: self.max_redirects,
            ..HttpConfig::default()
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            page_size: self.page_size,
            verify_base_url: self.verify_base_url.clone(),
        }
    }
}

/// Load configuration from `path`.
///
/// A missing file yields the defaults. An unreadable or malformed file is
/// logged at `warn` and also yields the defaults.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Settings named by the environment, via `lookup`.
pub fn settings_from_env(lookup: impl Fn(&str) -> Option<String>) -> Settings {
    Settings::new(lookup(API_KEY_ENV), lookup(EMAIL_ENV))
}

/// Stored settings with environment overrides applied.
pub async fn resolve_settings<S: SettingsStore>(store: &S) -> StoreResult<Settings> {
    let stored = store.load_settings().await?;
    Ok(stored.merged_with(settings_from_env(|key| std::env::var(key).ok())))
}
