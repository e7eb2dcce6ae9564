//! Structured logging setup using tracing
//!
//! Human-readable console output plus an optional daily-rolling JSON file
//! named `<file_prefix>.<YYYY-MM-DD>.log`.
//!
//! # Example
//!
//! ```no_run
//! use cloudsql_backup::logging::init_logging;
//! use cloudsql_backup::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//! ```

use crate::config::LoggingConfig;
use crate::domain::context::ResultExt;
use crate::domain::{BackupError, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    fn new(file_guard: Option<WorkerGuard>, log_dir: Option<PathBuf>) -> Self {
        Self {
            _file_guard: file_guard,
            log_dir,
        }
    }

    /// Directory receiving the JSON log files, when file logging is on
    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.log_dir.as_ref()
    }
}

/// Builds the daily-rolling file appender
///
/// # Errors
///
/// Returns an error if the directory cannot be created or opened.
pub fn file_appender(config: &LoggingConfig) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(&config.local_path)
        .with_context(|| format!("Failed to create log directory {}", config.local_path))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .build(&config.local_path)
        .map_err(|e| BackupError::Configuration(format!("Failed to create log file: {e}")))
}

/// Initialize the logging system based on configuration
///
/// `RUST_LOG` takes precedence over `log_level_str` when set.
///
/// # Returns
///
/// A `LoggingGuard` that must be kept alive for the duration of the program
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_level = parse_log_level(log_level_str)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cloudsql_backup={log_level}")));

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_filter(env_filter.clone());
    layers.push(console_layer.boxed());

    let (file_guard, log_dir) = if config.local_enabled {
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(config)?);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(non_blocking)
            .with_filter(env_filter);
        layers.push(file_layer.boxed());

        (Some(guard), Some(PathBuf::from(&config.local_path)))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| BackupError::Configuration(format!("Failed to initialize logging: {e}")))?;

    tracing::debug!(
        local_enabled = config.local_enabled,
        local_path = %config.local_path,
        file_prefix = %config.file_prefix,
        "Logging initialized"
    );

    Ok(LoggingGuard::new(file_guard, log_dir))
}

/// Parse log level from string
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(BackupError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}
