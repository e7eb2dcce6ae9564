//! Webhook notification sink

use super::NotificationSink;
use crate::domain::{BackupError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// JSON body posted to the webhook
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    /// Short summary
    pub subject: &'a str,
    /// Failure detail
    pub detail: &'a str,
    /// Sending host
    pub source: &'a str,
}

/// POSTs notifications to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    source: String,
}

impl WebhookNotifier {
    /// Creates a notifier posting to `url` with a per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                BackupError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        let source = std::env::var("HOSTNAME").unwrap_or_else(|_| "cloudsql-backup".to_string());

        Ok(Self {
            client,
            url: url.into(),
            source,
        })
    }

    /// Posts the payload, reporting why delivery failed
    pub async fn send(&self, subject: &str, detail: &str) -> Result<()> {
        let payload = WebhookPayload {
            subject,
            detail,
            source: &self.source,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BackupError::Notification(format!("Failed to send webhook: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(BackupError::Notification(format!(
                "Webhook returned status {status}: {body}"
            )))
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
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
