//! Configuration infrastructure
//!
//! Layered loading with the `config` crate: struct defaults, then an optional
//! file, then `PRICE_VERDICT__SECTION__KEY` environment variables.

#![allow(clippy::uninlined_format_args)]

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::info;

use super::fetch_retry::RetryPolicy;
use super::pagination::WalkSettings;
use super::parsing::SiteProfile;
use crate::domain::SentimentThresholds;

pub const ENV_PREFIX: &str = "PRICE_VERDICT";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub retry: RetryPolicy,
    pub pagination: PaginationConfig,
    pub extraction: ExtractionConfig,
    pub sentiment: SentimentConfig,
    pub logging: LoggingConfig,
    /// Site profiles keyed by name; a configured map replaces the built-ins
    pub sites: BTreeMap<String, SiteProfile>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pagination: PaginationConfig::default(),
            extraction: ExtractionConfig::default(),
            sentiment: SentimentConfig::default(),
            logging: LoggingConfig::default(),
            sites: SiteProfile::builtin()
                .into_iter()
                .map(|profile| (profile.name.clone(), profile))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Hard upper bound on review pages per walk
    pub max_pages: u32,
    /// Pause between review pages in milliseconds
    pub settle_delay_ms: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: 2,
            settle_delay_ms: 2_000,
        }
    }
}

impl PaginationConfig {
    /// Walk settings; a zero page bound is clamped to one page.
    pub fn walk_settings(&self) -> WalkSettings {
        WalkSettings::new(
            NonZeroU32::new(self.max_pages).unwrap_or(NonZeroU32::MIN),
            Duration::from_millis(self.settle_delay_ms),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum listing candidates examined per search
    pub listing_limit: usize,
    /// Review text must be longer than this many characters
    pub min_review_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            listing_limit: 20,
            min_review_chars: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        let thresholds = SentimentThresholds::default();
        Self {
            positive_threshold: thresholds.positive,
            negative_threshold: thresholds.negative,
        }
    }
}

impl SentimentConfig {
    pub const fn thresholds(&self) -> SentimentThresholds {
        SentimentThresholds {
            positive: self.positive_threshold,
            negative: self.negative_threshold,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `<data dir>/price-verdict/logs`
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Offset of log timestamps from UTC in minutes (IST by default)
    pub utc_offset_minutes: i32,

    /// Module-specific log level filters (e.g., "scraper": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut module_filters = HashMap::new();
        module_filters.insert("html5ever".to_string(), "warn".to_string());
        module_filters.insert("selectors".to_string(), "warn".to_string());

        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            max_files: 7,
            utc_offset_minutes: 330,
            module_filters,
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` (when given), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::validation("retry.max_attempts must be greater than 0"));
        }

        if self.retry.backoff_min_ms > self.retry.backoff_max_ms {
            return Err(ConfigError::validation(
                "retry.backoff_min_ms cannot be greater than retry.backoff_max_ms",
            ));
        }

        if self.pagination.max_pages == 0 {
            return Err(ConfigError::validation("pagination.max_pages must be greater than 0"));
        }

        if self.extraction.listing_limit == 0 {
            return Err(ConfigError::validation("extraction.listing_limit must be greater than 0"));
        }

        if self.sentiment.negative_threshold > self.sentiment.positive_threshold {
            return Err(ConfigError::validation(format!(
                "sentiment.negative_threshold ({}) cannot exceed positive_threshold ({})",
                self.sentiment.negative_threshold, self.sentiment.positive_threshold
            )));
        }

        for (key, profile) in &self.sites {
            if key != &profile.name {
                return Err(ConfigError::validation(format!(
                    "site key '{}' does not match profile name '{}'",
                    key, profile.name
                )));
            }
            if let Err(e) = profile.base() {
                return Err(ConfigError::validation(format!("site '{}': {}", key, e)));
            }
        }

        Ok(())
    }

    pub fn site(&self, name: &str) -> Option<&SiteProfile> {
        self.sites.get(name)
    }
}

/// Locates and bootstraps the user configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("price-verdict");
        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join("price-verdict");
        Ok(data_dir)
    }

    pub fn new() -> Result<Self> {
        Ok(Self::with_path(Self::get_config_dir()?.join("price_verdict.json")))
    }

    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write the default configuration when no file exists yet, then load.
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("🎉 First run detected - writing default configuration");
            if let Some(dir) = self.config_path.parent() {
                fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("Failed to create config directory {:?}", dir))?;
            }
            self.save_config(&AppConfig::default()).await?;
            info!("✅ Default configuration written to {:?}", self.config_path);
        }
        self.load_config()
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        AppConfig::load(Some(&self.config_path))
            .with_context(|| format!("Failed to load configuration from {:?}", self.config_path))
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_path, json)
            .await
            .with_context(|| format!("Failed to write config to {:?}", self.config_path))?;
        Ok(())
    }
}
