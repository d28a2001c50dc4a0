//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - Console and/or non-blocking file output
//! - Structured JSON logging (optional)
//! - Fixed-offset timestamps (IST unless configured otherwise)
//! - Pruning of old log files on startup
//!
//! `RUST_LOG` overrides the configured level and module filters.

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use lazy_static::lazy_static;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::{self, time::FormatTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::ConfigManager;

const LOG_FILE_PREFIX: &str = "price-verdict";

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

/// Timestamp formatter with a fixed UTC offset
#[derive(Debug, Clone, Copy)]
struct OffsetTimeFormatter {
    offset: FixedOffset,
}

impl OffsetTimeFormatter {
    fn from_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl FormatTime for OffsetTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", format_timestamp(Utc::now(), self.offset))
    }
}

fn format_timestamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S%.3f %:z")
        .to_string()
}

/// Resolve the log directory: configured, else the per-user data directory.
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config.log_dir.clone().unwrap_or_else(|| {
        ConfigManager::get_app_data_dir()
            .map(|dir| dir.join("logs"))
            .unwrap_or_else(|_| PathBuf::from("logs"))
    })
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    // Keep parser internals quiet unless TRACE is requested
    if !config.level.to_lowercase().contains("trace") {
        for (module, level) in &config.module_filters {
            match format!("{}={}", module, level).parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => warn!("Ignoring log filter {}={}: {}", module, level, e),
            }
        }
    }

    Ok(filter)
}

/// Initialize logging with custom configuration.
///
/// Fails when no output is enabled or a global subscriber is already set.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let timer = OffsetTimeFormatter::from_minutes(config.utc_offset_minutes);
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut log_file = None;

    if config.file_output {
        let log_dir = get_log_directory(config);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

        let removed = cleanup_old_logs(&log_dir, config.max_files.saturating_sub(1) as usize)?;

        let file_name = format!(
            "{}-{}.log",
            LOG_FILE_PREFIX,
            Utc::now().with_timezone(&timer.offset).format("%Y%m%dT%H%M%S")
        );
        let (file_writer, file_guard) = non_blocking(rolling::never(&log_dir, &file_name));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_timer(timer)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed()
        } else {
            // time + level + message only
            fmt::layer()
                .with_writer(file_writer)
                .with_timer(timer)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        layers.push(file_layer);
        log_file = Some((log_dir.join(file_name), removed));
    }

    if config.console_output {
        let console_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(timer)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(timer)
                .with_target(false)
                .boxed()
        };
        layers.push(console_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(config)?)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    info!("Console output: {}", config.console_output);
    if let Some((path, removed)) = log_file {
        info!("Log file: {:?} ({} old files pruned)", path, removed);
    }

    Ok(())
}

/// Delete the oldest `.log` files in `log_dir` so that at most `keep` remain.
///
/// Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &Path, keep: usize) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.is_file() && path.extension().is_some_and(|ext| ext == "log");
        if !is_log {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            removed += 1;
        }
    }

    Ok(removed)
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Price Verdict System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
    info!("========================================");
}
