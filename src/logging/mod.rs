//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - JSON-formatted daily log files
//! - Configurable log levels with `RUST_LOG` override
//!
//! Every run is wrapped in a `backup_run` span carrying the run id, every
//! instance worker in an `instance` span and every export in a `database`
//! span, so JSON records can be grouped without parsing messages.
//!
//! # Example
//!
//! ```no_run
//! use cloudsql_backup::logging::init_logging;
//! use cloudsql_backup::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{file_appender, init_logging, parse_log_level, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use cloudsql_backup::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "HTTPError 409");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
