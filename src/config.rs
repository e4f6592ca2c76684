use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "Neuratek";

/// Environment variable that overrides `backend.base_url`.
pub const API_URL_ENV: &str = "NEURATEK_API_URL";

const DEV_BASE_URL: &str = "http://localhost:8000";
const PROD_BASE_URL: &str = "https://neuratek.cl";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

/// Which generation route the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Ask,
    Generate,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Ask => "ask/",
            Endpoint::Generate => "generate/",
        }
    }

    pub fn default_max_tokens(&self) -> u32 {
        match self {
            Endpoint::Ask => 1000,
            Endpoint::Generate => 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub environment: Environment,
    /// Explicit base URL; wins over `environment`.
    pub base_url: Option<String>,
    pub endpoint: Endpoint,
    /// Falls back to the endpoint's own limit when unset.
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: u64,
    /// Delimiter the backend may echo before the real answer.
    pub reply_marker: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            base_url: None,
            endpoint: Endpoint::Ask,
            max_tokens: None,
            request_timeout_secs: 60,
            reply_marker: crate::services::dispatcher::DEFAULT_REPLY_MARKER.to_string(),
        }
    }
}

impl BackendConfig {
    pub fn resolve_base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim().to_string();
        }
        match self.environment {
            Environment::Development => DEV_BASE_URL.to_string(),
            Environment::Production => PROD_BASE_URL.to_string(),
        }
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
            .unwrap_or_else(|| self.endpoint.default_max_tokens())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub locale: String,
    pub poll_interval_ms: u64,
    pub silence_timeout_ms: u64,
    pub max_duration_ms: u64,
    pub auto_send_delay_ms: u64,
    /// Grace period for the engine's end event after a stop request.
    pub close_grace_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "es-ES".to_string(),
            poll_interval_ms: 500,
            silence_timeout_ms: 6_000,
            max_duration_ms: 30_000,
            auto_send_delay_ms: 100,
            close_grace_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("Could not determine data directory")?;
        Ok(data_dir.join("neuratek").join("neuratek.db"))
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("neuratek").join("config.toml"))
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Load the user config and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_base_url_override(&url);
        }
        Ok(config)
    }

    fn apply_base_url_override(&mut self, url: &str) {
        if !url.trim().is_empty() {
            self.backend.base_url = Some(url.trim().to_string());
        }
    }
}
