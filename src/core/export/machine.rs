//! Export state machine
//!
//! Drives one [`ExportJob`] from initiation to a terminal state:
//!
//! ```text
//! Initiating --conflict--> (backoff) --> Initiating      (bounded attempts)
//! Initiating --completed--> Succeeded
//! Initiating --handle-----> Pending --DONE--> Succeeded
//!                                   --FAILED--> Failed
//! Initiating --other error / attempts exhausted--> Failed
//! ```
//!
//! The only waits are the conflict backoff and the poll interval; both suspend
//! the calling task only.

use super::policy::ExportPolicy;
use crate::adapters::gateway::{ExportRequest, InitiateResponse, OperationStatus, RemoteGateway};
use crate::domain::{ExportJob, ExportState, FailureReason, JobOutcome};
use std::sync::Arc;
use tokio::time::Instant;

/// Runs export jobs against a [`RemoteGateway`]
#[derive(Clone)]
pub struct ExportStateMachine {
    gateway: Arc<dyn RemoteGateway>,
    policy: ExportPolicy,
}

impl ExportStateMachine {
    /// Creates a state machine with the given policy
    pub fn new(gateway: Arc<dyn RemoteGateway>, policy: ExportPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Policy in effect
    pub fn policy(&self) -> &ExportPolicy {
        &self.policy
    }

    /// Runs `job` to a terminal state and returns its outcome
    ///
    /// The success duration is measured from the initiation attempt that the
    /// provider accepted, not from the first attempt.
    pub async fn run(&self, job: &mut ExportJob, project: &str) -> JobOutcome {
        self.initiate(job, project).await;
        self.poll(job, project).await;

        match job.outcome() {
            Some(outcome) => outcome,
            None => {
                let reason = FailureReason::Provider(format!(
                    "export stopped in non-terminal state {:?}",
                    job.state()
                ));
                job.transition(ExportState::Failed(reason.clone()));
                JobOutcome::Failed(reason)
            }
        }
    }

    /// Requests the export, retrying while the instance is busy
    ///
    /// Leaves the job Pending, Succeeded or Failed.
    pub async fn initiate(&self, job: &mut ExportJob, project: &str) {
        let attempts = self.policy.conflict_attempts.max(1);

        for attempt in 1..=attempts {
            job.mark_attempt();
            let request = ExportRequest {
                instance: &job.instance,
                database: &job.database,
                target_uri: &job.target_uri,
                project,
                offload: self.policy.offload,
            };

            let response = self.gateway.initiate_export(request).await;
            match response {
                Ok(InitiateResponse::Completed) => {
                    tracing::info!(attempt, "Export completed synchronously");
                    job.transition(ExportState::Succeeded);
                    return;
                }
                Ok(InitiateResponse::Pending(handle)) => {
                    tracing::info!(attempt, operation = %handle, "Export initiated");
                    job.transition(ExportState::Pending(handle));
                    return;
                }
                Err(e) if e.is_conflict() => {
                    if attempt < attempts {
                        crate::log_retry_attempt!(attempt, attempts, e);
                        tokio::time::sleep(self.policy.conflict_backoff).await;
                    } else {
                        tracing::warn!(attempt, error = %e, "Instance still busy, giving up");
                    }
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Export initiation failed");
                    job.transition(ExportState::Failed(FailureReason::Initiation(
                        e.to_string(),
                    )));
                    return;
                }
            }
        }

        job.transition(ExportState::Failed(FailureReason::ConflictExhausted {
            attempts,
        }));
    }

    /// Polls a Pending job until the provider reports a terminal status
    ///
    /// Status query errors are transient and retried on the next interval. A
    /// job that is not Pending is left untouched.
    pub async fn poll(&self, job: &mut ExportJob, project: &str) {
        let Some(handle) = job.operation().cloned() else {
            return;
        };
        let pending_since = Instant::now();
        let mut queries: u64 = 0;

        loop {
            tokio::time::sleep(self.policy.poll_interval).await;
            queries += 1;

            match self.gateway.query_operation_status(&handle, project).await {
                Ok(OperationStatus::Done) => {
                    tracing::info!(operation = %handle, queries, "Export operation done");
                    job.transition(ExportState::Succeeded);
                    return;
                }
                Ok(OperationStatus::Failed(detail)) => {
                    tracing::error!(operation = %handle, detail = %detail, "Export operation failed");
                    job.transition(ExportState::Failed(FailureReason::Provider(detail)));
                    return;
                }
                Ok(OperationStatus::Running) => {
                    tracing::debug!(operation = %handle, queries, "Export still running");
                }
                Err(e) => {
                    tracing::warn!(
                        operation = %handle,
                        error = %e,
                        "Status query failed, retrying on next interval"
                    );
                }
            }

            if let Some(limit) = self.policy.max_poll_duration {
                let waited = pending_since.elapsed();
                if waited >= limit {
                    tracing::error!(
                        operation = %handle,
                        waited_secs = waited.as_secs(),
                        "Export exceeded the polling ceiling"
                    );
                    job.transition(ExportState::Failed(FailureReason::PollTimeout(waited)));
                    return;
                }
            }
        }
    }
}
