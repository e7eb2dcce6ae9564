//! Export job lifecycle types
//!
//! An [`ExportJob`] is created when a database export is initiated and is owned
//! by the state machine driving it until it reaches a terminal state. The
//! resulting [`JobOutcome`] is immutable.

use crate::domain::ids::{DatabaseName, InstanceId, OperationHandle};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// State of a single database export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportState {
    /// Export request not yet accepted by the provider
    Initiating,
    /// Provider accepted the export and is running it
    Pending(OperationHandle),
    /// Export finished successfully
    Succeeded,
    /// Export finished unsuccessfully
    Failed(FailureReason),
}

impl ExportState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Succeeded | ExportState::Failed(_))
    }
}

/// Why an export ended in the Failed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Every initiation attempt was rejected with a resource conflict
    ConflictExhausted {
        /// Number of attempts made
        attempts: u32,
    },
    /// Initiation failed with a non-retryable error
    Initiation(String),
    /// The provider reported the operation as failed
    Provider(String),
    /// The operation did not finish within the configured ceiling
    PollTimeout(Duration),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ConflictExhausted { attempts } => write!(
                f,
                "conflict retries exhausted: instance stayed busy for {attempts} attempts"
            ),
            FailureReason::Initiation(msg) => write!(f, "export initiation failed: {msg}"),
            FailureReason::Provider(msg) => write!(f, "export operation failed: {msg}"),
            FailureReason::PollTimeout(elapsed) => write!(
                f,
                "export operation still running after {}s",
                elapsed.as_secs()
            ),
        }
    }
}

/// Terminal result of one database export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Wall-clock time from the accepted initiation to completion
    Success(Duration),
    /// Failure reason
    Failed(FailureReason),
}

impl JobOutcome {
    /// Whether the export succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }
}

/// A single in-flight database export
#[derive(Debug)]
pub struct ExportJob {
    /// Instance being exported
    pub instance: InstanceId,

    /// Database being exported
    pub database: DatabaseName,

    /// Destination object URI
    pub target_uri: String,

    /// Wall-clock start of the accepted initiation
    pub started_at: DateTime<Utc>,

    /// Monotonic start of the accepted initiation
    started: Instant,

    /// Current lifecycle state
    state: ExportState,
}

impl ExportJob {
    /// Creates a job in the Initiating state
    pub fn new(instance: InstanceId, database: DatabaseName, target_uri: String) -> Self {
        Self {
            instance,
            database,
            target_uri,
            started_at: Utc::now(),
            started: Instant::now(),
            state: ExportState::Initiating,
        }
    }

    /// Current state
    pub fn state(&self) -> &ExportState {
        &self.state
    }

    /// Operation handle, once the provider has assigned one
    pub fn operation(&self) -> Option<&OperationHandle> {
        match &self.state {
            ExportState::Pending(handle) => Some(handle),
            _ => None,
        }
    }

    /// Restarts the duration clock; called for every initiation attempt
    pub(crate) fn mark_attempt(&mut self) {
        self.started_at = Utc::now();
        self.started = Instant::now();
    }

    /// Time since the current initiation attempt
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn transition(&mut self, next: ExportState) {
        debug_assert!(!self.state.is_terminal(), "terminal export state is final");
        tracing::debug!(
            instance = %self.instance,
            database = %self.database,
            from = ?self.state,
            to = ?next,
            "Export state transition"
        );
        self.state = next;
    }

    /// Converts a terminal job into its outcome
    ///
    /// Returns `None` while the job is still Initiating or Pending.
    pub fn outcome(&self) -> Option<JobOutcome> {
        match &self.state {
            ExportState::Succeeded => Some(JobOutcome::Success(self.elapsed())),
            ExportState::Failed(reason) => Some(JobOutcome::Failed(reason.clone())),
            _ => None,
        }
    }
}
