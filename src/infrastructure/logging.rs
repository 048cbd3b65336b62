//! Logging system configuration and initialization
//!
//! - Console output always on
//! - Optional file output (JSON lines or plain) in `logging.directory`
//! - `RUST_LOG` overrides the configured level
//! - HTTP client internals are suppressed unless the level is `trace`

use anyhow::{Result, anyhow};
use chrono::Local;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::Directive,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive for the process lifetime
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Noisy dependency targets, capped unless tracing everything.
const QUIET_TARGETS: &[&str] = &[
    "reqwest=warn",
    "hyper=warn",
    "hyper_util=warn",
    "h2=warn",
    "rustls=warn",
];

/// Filter used when `RUST_LOG` is not set.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", level, e))?;

    if !level.to_lowercase().contains("trace") {
        for directive in QUIET_TARGETS {
            filter = filter.add_directive(
                directive
                    .parse::<Directive>()
                    .map_err(|e| anyhow!("Invalid filter directive '{}': {}", directive, e))?,
            );
        }
    }
    Ok(filter)
}

/// Initialize logging from configuration. Call once, before the run starts.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };

    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stdout)
        .with_timer(LocalTimeFormatter)
        .with_target(false);

    let file_layer = if config.file_output {
        std::fs::create_dir_all(&config.directory).map_err(|e| {
            anyhow!(
                "Failed to create log directory {:?}: {}",
                config.directory,
                e
            )
        })?;

        let file_appender = rolling::never(&config.directory, &config.file_name);
        let (file_writer, file_guard) = non_blocking(file_appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        Some(layer)
    } else {
        None
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!(
            "File output: {:?} (json: {})",
            config.directory.join(&config.file_name),
            config.json_format
        );
    }

    Ok(())
}

/// Log version and platform for diagnostics
pub fn log_system_info() {
    info!("=== Show Sync ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
}
