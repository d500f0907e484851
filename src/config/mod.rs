//! Configuration loading and validation.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Account data document: a file path or an http(s) URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// IANA zone used for month boundaries and announcement times
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Currency label used in event descriptions
    #[serde(default = "default_currency")]
    pub currency: String,

    /// How often `watch`/`serve` re-read the account data, e.g. "10m"
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "Europe/Prague".to_string()
}

fn default_currency() -> String {
    "CZK".to_string()
}

fn default_poll_interval() -> String {
    "10m".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            source: None,
            timezone: default_timezone(),
            currency: default_currency(),
            poll_interval: default_poll_interval(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The reference timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::ValidationError(format!("Unknown timezone: {}", self.timezone))
        })
    }

    /// The poll interval as a duration.
    pub fn poll_every(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.poll_interval).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid poll_interval: {}", self.poll_interval))
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;

        if self.poll_every()?.is_zero() {
            return Err(ConfigError::ValidationError(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if matches!(&self.source, Some(source) if source.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "Source must not be empty when set".to_string(),
            ));
        }

        if self.currency.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Currency must not be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
