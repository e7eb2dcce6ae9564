//! Log-only notification sink

use super::NotificationSink;
use async_trait::async_trait;

/// Writes notifications to the log at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, subject: &str, detail: &str) {
        tracing::error!(subject = %subject, detail = %detail, "Notification");
    }
}
