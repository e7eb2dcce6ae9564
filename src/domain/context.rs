//! Error context extension trait
//!
//! Adds `.context()` / `.with_context()` to any `Result` whose error converts
//! into [`BackupError`], so library code can annotate failures without
//! leaving the domain error type.
//!
//! # Examples
//!
//! ```rust
//! use cloudsql_backup::domain::Result;
//! use cloudsql_backup::domain::context::ResultExt;
//!
//! fn read_key(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read key file: {path}"))
//! }
//! ```

use crate::domain::errors::BackupError;
use crate::domain::result::Result;
use std::fmt::Display;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Prefix the error with `context`
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Prefix the error with a lazily built context
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BackupError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.with_context(|| context)
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| match e.into() {
            // keep the classification the exit code depends on
            BackupError::Configuration(msg) => BackupError::Configuration(format!("{}: {msg}", f())),
            BackupError::Authentication(msg) => {
                BackupError::Authentication(format!("{}: {msg}", f()))
            }
            other => BackupError::Other(format!("{}: {other}", f())),
        })
    }
}
