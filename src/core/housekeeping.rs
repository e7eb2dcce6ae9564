//! Run housekeeping
//!
//! Old local log files are purged before any instance is scheduled.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Default log retention
pub const DEFAULT_LOG_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Deletes regular files in `dir` last modified before `now - retention`
///
/// Returns the number of files removed. A missing directory removes nothing;
/// individual failures are logged and skipped.
pub fn purge_stale_logs(dir: &Path, retention: Duration, now: SystemTime) -> usize {
    let Some(cutoff) = now.checked_sub(retention) else {
        return 0;
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Log directory does not exist");
            return 0;
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot read log directory");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let modified = match entry.metadata() {
            Ok(meta) if meta.is_file() => meta.modified(),
            Ok(_) => continue,
            Err(e) => Err(e),
        };

        match modified {
            Ok(modified) if modified < cutoff => match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(file = %path.display(), "Removed stale log file");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Failed to remove log file");
                }
            },
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Cannot stat log file");
            }
        }
    }

    if removed > 0 {
        tracing::info!(dir = %dir.display(), removed, "Purged stale log files");
    }
    removed
}
