//! Configuration management for the announcer
//!
//! This module handles loading and validating configuration from environment
//! variables (optionally seeded from a `.env` file) and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::scheduler::{PublishWindow, SchedulerError, SchedulerResult, DEFAULT_PUBLISH_TIME};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream endpoints
    pub source: SourceConfig,

    /// Publish timing
    pub schedule: ScheduleConfig,

    /// Persisted state locations
    pub storage: StorageConfig,

    /// Outbound delivery channel
    pub delivery: DeliveryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Challenge set endpoint
    pub challenge_url: String,

    /// Companion location pointer endpoint
    pub companion_url: String,

    /// Location id → image URL
    #[serde(default)]
    pub location_images: BTreeMap<String, String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,
}

/// Publish timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Daily publish time in UTC (`HH:MM:SS`)
    pub publish_time: String,

    /// Longest wait between polls while upstream has not rolled over
    pub poll_interval_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Cached daily document
    pub cache_path: PathBuf,

    /// Destination registry
    pub registry_path: PathBuf,
}

/// Delivery channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Chat platform API base URL
    pub api_base: String,

    /// Authorization header value (e.g. `Bot <token>`)
    pub auth_token: Option<String>,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries on rate limiting or server errors
    pub max_retries: u32,

    /// File name the companion image is attached as
    pub image_filename: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parse `id=url` pairs separated by `;` or newlines
fn parse_location_images(value: &str) -> BTreeMap<String, String> {
    value
        .split([';', '\n'])
        .filter_map(|pair| pair.split_once('='))
        .map(|(id, url)| (id.trim().to_string(), url.trim().to_string()))
        .filter(|(id, url)| !id.is_empty() && !url.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let location_images = std::env::var("RDO_DAILIES_LOCATION_IMAGES")
            .map(|v| parse_location_images(&v))
            .unwrap_or_default();

        Ok(Self {
            source: SourceConfig {
                challenge_url: env_or("RDO_DAILIES_SOURCE_URL", &defaults.source.challenge_url),
                companion_url: env_or(
                    "RDO_DAILIES_NAZAR_SOURCE_URL",
                    &defaults.source.companion_url,
                ),
                location_images,
                request_timeout_secs: env_parse(
                    "RDO_DAILIES_REQUEST_TIMEOUT",
                    defaults.source.request_timeout_secs,
                ),
                user_agent: env_or("RDO_DAILIES_USER_AGENT", &defaults.source.user_agent),
            },
            schedule: ScheduleConfig {
                publish_time: env_or("RDO_DAILIES_PUBLISH_TIME", DEFAULT_PUBLISH_TIME),
                poll_interval_secs: env_parse(
                    "RDO_DAILIES_POLL_INTERVAL",
                    defaults.schedule.poll_interval_secs,
                ),
            },
            storage: StorageConfig {
                cache_path: std::env::var("RDO_DAILIES_CACHE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.cache_path),
                registry_path: std::env::var("RDO_DAILIES_REGISTRY_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.registry_path),
            },
            delivery: DeliveryConfig {
                api_base: env_or("RDO_DAILIES_API_BASE", &defaults.delivery.api_base),
                auth_token: std::env::var("RDO_DAILIES_BOT_TOKEN")
                    .ok()
                    .map(|token| format!("Bot {token}")),
                headers: BTreeMap::new(),
                timeout_secs: env_parse(
                    "RDO_DAILIES_DELIVERY_TIMEOUT",
                    defaults.delivery.timeout_secs,
                ),
                max_retries: env_parse(
                    "RDO_DAILIES_DELIVERY_RETRIES",
                    defaults.delivery.max_retries,
                ),
                image_filename: defaults.delivery.image_filename,
            },
            logging: LoggingConfig {
                level: env_or("RDO_DAILIES_LOG_LEVEL", "info"),
                format: env_or("RDO_DAILIES_LOG_FORMAT", "text"),
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.source.challenge_url)
            .with_context(|| format!("Invalid challenge_url: {}", self.source.challenge_url))?;
        Url::parse(&self.source.companion_url)
            .with_context(|| format!("Invalid companion_url: {}", self.source.companion_url))?;

        for (id, url) in &self.source.location_images {
            Url::parse(url).with_context(|| format!("Invalid image URL for location '{id}'"))?;
        }

        if self.source.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        self.publish_window()?;

        if self.schedule.poll_interval_secs == 0 {
            return Err(SchedulerError::zero_interval("poll_interval_secs").into());
        }

        Url::parse(&self.delivery.api_base)
            .with_context(|| format!("Invalid api_base: {}", self.delivery.api_base))?;

        if self.delivery.timeout_secs == 0 {
            anyhow::bail!("delivery timeout_secs must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Parsed publish window
    pub fn publish_window(&self) -> SchedulerResult<PublishWindow> {
        PublishWindow::parse(&self.schedule.publish_time)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_secs)
    }

    /// Get source request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                challenge_url: String::from("https://api.rdo.gg/challenges/index.json"),
                companion_url: String::from("https://api.rdo.gg/nazar/"),
                location_images: BTreeMap::new(),
                request_timeout_secs: 30,
                user_agent: format!("rdo-dailies/{}", env!("CARGO_PKG_VERSION")),
            },
            schedule: ScheduleConfig {
                publish_time: String::from(DEFAULT_PUBLISH_TIME),
                poll_interval_secs: 300,
            },
            storage: StorageConfig {
                cache_path: PathBuf::from("data/db.json"),
                registry_path: PathBuf::from("data/settings.json"),
            },
            delivery: DeliveryConfig {
                api_base: String::from("https://discord.com/api/v10"),
                auth_token: None,
                headers: BTreeMap::new(),
                timeout_secs: 10,
                max_retries: 2,
                image_filename: String::from("nazar.png"),
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}
