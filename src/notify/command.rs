//! External alert program sink
//!
//! Runs `<program> <args...> <subject> <detail>`, the calling convention of
//! the mail alert scripts this tool is usually paired with.

use super::NotificationSink;
use crate::adapters::process::{CommandRunner, CommandSpec};
use crate::domain::GatewayError;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs an alert program per notification
#[derive(Clone)]
pub struct CommandNotifier {
    runner: Arc<dyn CommandRunner>,
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Creates a notifier running `program` with the fixed `args` first
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            args,
        }
    }

    fn command(&self, subject: &str, detail: &str) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(self.args.iter().cloned())
            .args([subject, detail])
    }

    /// Runs the program, reporting why delivery failed
    pub async fn send(&self, subject: &str, detail: &str) -> Result<(), GatewayError> {
        self.runner
            .run(&self.command(subject, detail))
            .await?
            .into_result(&self.program)
            .map(|_| ())
    }
}

#[async_trait]
impl NotificationSink for CommandNotifier {
    async fn notify(&self, subject: &str, detail: &str) {
        match self.send(subject, detail).await {
            Ok(()) => tracing::info!(subject = %subject, "Notification sent"),
            Err(e) => tracing::warn!(
                subject = %subject,
                error = %e,
                "Failed to deliver notification"
            ),
        }
    }
}
