//! Run and instance reports
//!
//! The coordinator returns a [`RunReport`] with one [`InstanceReport`] per
//! configured instance, in configuration order.

use crate::core::enumerate::EnumerationSource;
use crate::domain::{DatabaseName, InstanceId, JobOutcome};
use chrono::NaiveDate;
use std::time::Duration;
use uuid::Uuid;

/// Result of one database export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    /// Database exported
    pub database: DatabaseName,

    /// Size reported at enumeration time
    pub size_mb: f64,

    /// Destination object URI
    pub target_uri: String,

    /// Terminal outcome
    pub outcome: JobOutcome,
}

/// How an instance's work ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    /// Every enumerated database was attempted
    Completed,

    /// No source could list the databases; nothing was attempted
    EnumerationFailed,

    /// The instance could not be processed at all
    Fatal,
}

/// Result of one instance worker
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceReport {
    /// Instance processed
    pub instance: InstanceId,

    /// Overall status
    pub status: InstanceStatus,

    /// Source of the database list, when enumeration ran
    pub source: Option<EnumerationSource>,

    /// Per-database results in processing order
    pub exports: Vec<ExportRecord>,

    /// Reason for a non-completed status
    pub error: Option<String>,

    /// Time spent on the instance
    pub duration: Duration,
}

impl InstanceReport {
    /// Report for an instance whose databases were processed
    pub fn completed(instance: InstanceId, source: EnumerationSource) -> Self {
        Self {
            instance,
            status: InstanceStatus::Completed,
            source: Some(source),
            exports: Vec::new(),
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// Report for an instance whose databases could not be listed
    pub fn enumeration_failed(instance: InstanceId) -> Self {
        Self {
            instance,
            status: InstanceStatus::EnumerationFailed,
            source: Some(EnumerationSource::Unavailable),
            exports: Vec::new(),
            error: Some("database enumeration failed on both the engine and the provider".into()),
            duration: Duration::ZERO,
        }
    }

    /// Report for an instance that failed before enumeration
    pub fn fatal(instance: InstanceId, error: impl Into<String>) -> Self {
        Self {
            instance,
            status: InstanceStatus::Fatal,
            source: None,
            exports: Vec::new(),
            error: Some(error.into()),
            duration: Duration::ZERO,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a database result
    pub fn record(&mut self, record: ExportRecord) {
        self.exports.push(record);
    }

    /// Number of successful exports
    pub fn succeeded(&self) -> usize {
        self.exports.iter().filter(|r| r.outcome.is_success()).count()
    }

    /// Number of failed exports
    pub fn failed(&self) -> usize {
        self.exports.len() - self.succeeded()
    }

    /// Whether the instance completed with no failed export
    pub fn is_successful(&self) -> bool {
        self.status == InstanceStatus::Completed && self.failed() == 0
    }
}

/// Aggregate result of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier
    pub run_id: Uuid,

    /// Date stamped into object names
    pub run_date: NaiveDate,

    /// Per-instance results in configuration order
    pub instances: Vec<InstanceReport>,

    /// Duration of the run
    pub duration: Duration,
}

impl RunReport {
    /// Create an empty report
    pub fn new(run_id: Uuid, run_date: NaiveDate) -> Self {
        Self {
            run_id,
            run_date,
            instances: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Report of one instance
    pub fn instance(&self, id: &str) -> Option<&InstanceReport> {
        self.instances.iter().find(|r| r.instance.as_str() == id)
    }

    /// Successful exports across all instances
    pub fn total_succeeded(&self) -> usize {
        self.instances.iter().map(InstanceReport::succeeded).sum()
    }

    /// Failed exports across all instances
    pub fn total_failed(&self) -> usize {
        self.instances.iter().map(InstanceReport::failed).sum()
    }

    /// Instances that did not complete
    pub fn failed_instances(&self) -> usize {
        self.instances
            .iter()
            .filter(|r| r.status != InstanceStatus::Completed)
            .count()
    }

    /// Whether every instance completed and every export succeeded
    pub fn is_successful(&self) -> bool {
        self.instances.iter().all(InstanceReport::is_successful)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            instances = self.instances.len(),
            succeeded = self.total_succeeded(),
            failed = self.total_failed(),
            failed_instances = self.failed_instances(),
            duration_secs = self.duration.as_secs(),
            "Backup run completed"
        );

        for report in &self.instances {
            match report.status {
                InstanceStatus::Completed => tracing::info!(
                    instance = %report.instance,
                    source = ?report.source,
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    duration_secs = report.duration.as_secs(),
                    "Instance summary"
                ),
                _ => tracing::warn!(
                    instance = %report.instance,
                    status = ?report.status,
                    error = report.error.as_deref().unwrap_or(""),
                    "Instance summary"
                ),
            }
        }
    }
}
