//! Failure notifications
//!
//! Workers report fatal instance errors and failed exports through a
//! [`NotificationSink`]. Delivery is best effort: a sink logs its own
//! failures and never hands them back to the caller, so an alerting outage
//! cannot abort a backup.
//!
//! # Sinks
//!
//! - [`LogNotifier`] - records notifications in the log only
//! - [`CommandNotifier`] - runs an alert program with subject and detail as
//!   the last two arguments
//! - [`WebhookNotifier`] - POSTs a JSON payload
//!
//! ```rust,no_run
//! use cloudsql_backup::config::NotificationConfig;
//! use cloudsql_backup::notify::create_notifier;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let notifier = create_notifier(&NotificationConfig::default())?;
//! notifier.notify("Backup export failed: prod-1/sales", "bucket not writable").await;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod log;
pub mod webhook;

pub use command::CommandNotifier;
pub use log::LogNotifier;
pub use webhook::WebhookNotifier;

use crate::adapters::process::ProcessRunner;
use crate::config::{NotificationConfig, NotificationKind};
use crate::domain::{BackupError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Best-effort destination for failure notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification; failures are logged, never returned
    async fn notify(&self, subject: &str, detail: &str);
}

/// Create the sink selected by the `[notification]` section
///
/// # Errors
///
/// Returns a configuration error when the selected sink is missing its
/// command or endpoint.
pub fn create_notifier(config: &NotificationConfig) -> Result<Arc<dyn NotificationSink>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.kind {
        NotificationKind::Log => Ok(Arc::new(LogNotifier)),
        NotificationKind::Command => {
            let program = config
                .command
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| {
                    BackupError::Configuration(
                        "notification.command is required when kind = 'command'".to_string(),
                    )
                })?;
            tracing::info!(command = %program, "Using command notifier");
            Ok(Arc::new(CommandNotifier::new(
                Arc::new(ProcessRunner::new(timeout)),
                program,
                config.args.clone(),
            )))
        }
        NotificationKind::Webhook => {
            let url = config.webhook_url.as_deref().ok_or_else(|| {
                BackupError::Configuration(
                    "notification.webhook_url is required when kind = 'webhook'".to_string(),
                )
            })?;
            tracing::info!("Using webhook notifier");
            Ok(Arc::new(WebhookNotifier::new(url, timeout)?))
        }
    }
}
