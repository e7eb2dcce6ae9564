//! Export retry and polling policy

use crate::config::ExportConfig;
use std::time::Duration;

/// Timing and retry knobs of the export state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPolicy {
    /// Initiation attempts while the instance reports a conflict
    pub conflict_attempts: u32,

    /// Wait between conflicting attempts
    pub conflict_backoff: Duration,

    /// Wait between status queries
    pub poll_interval: Duration,

    /// Optional ceiling on the pending phase; `None` polls until terminal
    pub max_poll_duration: Option<Duration>,

    /// Request serverless export
    pub offload: bool,
}

impl Default for ExportPolicy {
    fn default() -> Self {
        Self {
            conflict_attempts: 3,
            conflict_backoff: Duration::from_secs(60),
            poll_interval: Duration::from_secs(30),
            max_poll_duration: None,
            offload: true,
        }
    }
}

impl ExportPolicy {
    /// Builds the policy from the `[export]` section
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            conflict_attempts: config.conflict_retry_attempts.max(1),
            conflict_backoff: Duration::from_secs(config.conflict_backoff_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_poll_duration: config.max_poll_duration_secs.map(Duration::from_secs),
            offload: config.offload,
        }
    }
}
