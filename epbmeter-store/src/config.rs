//! Configuration management.

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, save_json};
use epbmeter_core::{DEFAULT_ZONE_ID, Tariff, Tz, parse_zone};
use epbmeter_fetch::{ClientOptions, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, HttpClient};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API connection settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Rate schedule used when the API omits cost.
    #[serde(default)]
    pub tariff: Tariff,
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
}

/// API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme and host of the EPB API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// IANA zone sent with usage requests.
    #[serde(default = "default_zone_id")]
    pub zone_id: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Domains the HTTP client may contact. Unrestricted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_zone_id() -> String {
    DEFAULT_ZONE_ID.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_refresh_interval() -> u64 {
    15 * 60
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Levels accepted by `general.log_level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            zone_id: default_zone_id(),
            timeout_secs: default_timeout_secs(),
            allowed_domains: None,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults. The loaded values are validated.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !tokio::fs::try_exists(path).await? {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config: Config = load_json(path).await?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path()).await
    }

    /// Saves configuration to a specific path.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://")) {
            return Err(StoreError::Config(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(StoreError::Config("api.timeout_secs must be positive".to_string()));
        }
        if self.general.refresh_interval_secs == 0 {
            return Err(StoreError::Config(
                "general.refresh_interval_secs must be positive".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(StoreError::Config(format!(
                "general.log_level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.general.log_level
            )));
        }
        parse_zone(&self.api.zone_id)?;
        self.tariff.validate()?;
        Ok(())
    }

    /// Returns the configured zone.
    pub fn zone(&self) -> Result<Tz, StoreError> {
        Ok(parse_zone(&self.api.zone_id)?)
    }

    /// Returns the polling interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.general.refresh_interval_secs)
    }

    /// Builds client options from the API and tariff sections.
    pub fn client_options(&self) -> Result<ClientOptions, StoreError> {
        Ok(ClientOptions::default()
            .with_base_url(self.api.base_url.as_str())
            .with_zone(self.zone()?)
            .with_tariff(self.tariff))
    }

    /// Builds an HTTP client with the configured timeout and allowlist.
    pub fn http_client(&self) -> Result<HttpClient, StoreError> {
        let client = HttpClient::with_timeout(Duration::from_secs(self.api.timeout_secs))?;
        Ok(match &self.api.allowed_domains {
            Some(domains) => client.with_allowed_domains(domains.clone()),
            None => client,
        })
    }
}
