//! Configuration infrastructure
//!
//! Layered loading through the `config` crate:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional TOML file (`show-sync.toml`, or the path in `SHOW_SYNC_CONFIG`)
//! 3. Environment variables prefixed with `SHOW_SYNC_`, `__` separating nested keys
//!    (e.g. `SHOW_SYNC_WORKERS__COUNT=2`)
//!
//! Destination credentials may also be supplied through `UMB_PROJECT_ALIAS` and `API_KEY`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
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
    /// Upstream catalog (read only)
    pub source: SourceConfig,

    /// Headless CMS receiving the shows
    pub destination: DestinationConfig,

    /// Page worker pool
    pub workers: WorkerConfig,

    /// Backoff policy for uploads and writes
    pub retry: RetryConfig,

    pub logging: LoggingConfig,

    /// Compute decisions without issuing uploads or writes
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Catalog endpoint; pages are requested as `{base_url}?page={n}`
    pub base_url: String,

    /// Highest page index dispatched. Paging stops earlier at end-of-data.
    pub max_page: u32,

    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// API root, with trailing slash (e.g. `https://api.example.net/`)
    pub base_url: String,

    /// Sent as `umb-project-alias`
    pub project_alias: String,

    /// Sent as `Api-Key`
    pub api_key: String,

    /// Items per page when reading the store back
    pub page_size: u32,

    /// Culture key of localized properties
    pub language: String,

    /// Document type of created shows
    pub content_type_alias: String,

    /// Element type of genre blocks
    pub genre_content_type_alias: String,

    /// Appended to sanitized media file names
    pub image_extension: String,

    pub max_requests_per_second: u32,

    pub request_timeout_seconds: u64,

    /// Parallel page reads while building the index
    pub index_fetch_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Long-lived workers pulling page indices
    pub count: usize,

    /// Bounded page queue capacity (defaults to the worker count when zero)
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Write JSON lines to a log file in addition to the console
    pub file_output: bool,

    /// Use JSON formatting for the file layer
    pub json_format: bool,

    /// Directory for log files, relative to the working directory
    pub directory: PathBuf,

    pub file_name: String,
}

/// Default values, mostly taken from the production deployment
pub mod defaults {
    pub const SOURCE_BASE_URL: &str = "https://api.tvmaze.com/shows";
    pub const SOURCE_MAX_PAGE: u32 = 500;
    pub const DESTINATION_BASE_URL: &str = "https://api.rainbowsrock.net/";
    pub const PAGE_SIZE: u32 = 250;
    pub const LANGUAGE: &str = "en-US";
    pub const CONTENT_TYPE_ALIAS: &str = "tVShow";
    pub const GENRE_CONTENT_TYPE_ALIAS: &str = "genre";
    pub const IMAGE_EXTENSION: &str = ".jpg";
    pub const MAX_REQUESTS_PER_SECOND: u32 = 10;
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
    pub const INDEX_FETCH_CONCURRENCY: usize = 4;
    pub const WORKER_COUNT: usize = 4;
    pub const RETRY_MAX_ATTEMPTS: u32 = 8;
    pub const RETRY_INITIAL_DELAY_MS: u64 = 200;
    pub const RETRY_MAX_DELAY_MS: u64 = 10_000;
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_DIRECTORY: &str = "logs";
    pub const LOG_FILE_NAME: &str = "show-sync.log";
    pub const CONFIG_FILE: &str = "show-sync.toml";
    pub const CONFIG_PATH_ENV: &str = "SHOW_SYNC_CONFIG";
    pub const ENV_PREFIX: &str = "SHOW_SYNC";
    pub const PROJECT_ALIAS_ENV: &str = "UMB_PROJECT_ALIAS";
    pub const API_KEY_ENV: &str = "API_KEY";
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            destination: DestinationConfig::default(),
            workers: WorkerConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
            dry_run: false,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::SOURCE_BASE_URL.to_string(),
            max_page: defaults::SOURCE_MAX_PAGE,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DESTINATION_BASE_URL.to_string(),
            project_alias: String::new(),
            api_key: String::new(),
            page_size: defaults::PAGE_SIZE,
            language: defaults::LANGUAGE.to_string(),
            content_type_alias: defaults::CONTENT_TYPE_ALIAS.to_string(),
            genre_content_type_alias: defaults::GENRE_CONTENT_TYPE_ALIAS.to_string(),
            image_extension: defaults::IMAGE_EXTENSION.to_string(),
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            index_fetch_concurrency: defaults::INDEX_FETCH_CONCURRENCY,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: defaults::WORKER_COUNT,
            queue_capacity: 0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            initial_delay_ms: defaults::RETRY_INITIAL_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            file_output: false,
            json_format: true,
            directory: PathBuf::from(defaults::LOG_DIRECTORY),
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

impl DestinationConfig {
    /// `base_url` joined with `path`, tolerating a missing trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl WorkerConfig {
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity == 0 {
            self.count.max(1)
        } else {
            self.queue_capacity
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl AppConfig {
    /// Load defaults, the config file (if any) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(defaults::CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(defaults::CONFIG_FILE), PathBuf::from);
        Self::load_from(Some(&path))
    }

    /// Same as [`AppConfig::load`] but with an explicit config file path.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        config.apply_credential_fallback(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fill empty credentials from the plain `UMB_PROJECT_ALIAS` / `API_KEY` variables.
    pub fn apply_credential_fallback<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.destination.project_alias.is_empty() {
            if let Some(alias) = lookup(defaults::PROJECT_ALIAS_ENV) {
                self.destination.project_alias = alias.trim().to_string();
            }
        }
        if self.destination.api_key.is_empty() {
            if let Some(key) = lookup(defaults::API_KEY_ENV) {
                self.destination.api_key = key.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::validation("source.base_url must not be empty"));
        }
        if self.destination.base_url.trim().is_empty() {
            return Err(ConfigError::validation(
                "destination.base_url must not be empty",
            ));
        }
        if self.destination.page_size == 0 {
            return Err(ConfigError::validation(
                "destination.page_size must be greater than 0",
            ));
        }
        if self.destination.max_requests_per_second == 0 {
            return Err(ConfigError::validation(
                "destination.max_requests_per_second must be greater than 0",
            ));
        }
        if self.destination.index_fetch_concurrency == 0 {
            return Err(ConfigError::validation(
                "destination.index_fetch_concurrency must be greater than 0",
            ));
        }
        if self.workers.count == 0 {
            return Err(ConfigError::validation(
                "workers.count must be greater than 0",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::validation(
                "retry.max_attempts must be greater than 0",
            ));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::validation(
                "retry.initial_delay_ms cannot be greater than retry.max_delay_ms",
            ));
        }
        if !self.dry_run
            && (self.destination.project_alias.is_empty() || self.destination.api_key.is_empty())
        {
            return Err(ConfigError::validation(format!(
                "destination credentials missing: set destination.project_alias/api_key or {}/{}",
                defaults::PROJECT_ALIAS_ENV,
                defaults::API_KEY_ENV
            )));
        }
        Ok(())
    }
}
