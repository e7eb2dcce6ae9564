//! Export coordinator - main orchestrator for the backup run
//!
//! The coordinator performs housekeeping, authenticates once, then runs one
//! [`InstanceWorker`] task per instance. A semaphore admits at most
//! `max_workers` of them at a time; later instances queue for a permit and
//! never wait on the outcome of earlier ones.

use super::machine::ExportStateMachine;
use super::policy::ExportPolicy;
use super::summary::{InstanceReport, RunReport};
use super::worker::{instance_failure_subject, InstanceWorker};
use crate::adapters::gateway::RemoteGateway;
use crate::config::BackupConfig;
use crate::core::context::RunContext;
use crate::core::enumerate::DatabaseEnumerator;
use crate::core::housekeeping::purge_stale_logs;
use crate::domain::{BackupError, Instance, Result};
use crate::notify::NotificationSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::Instrument;

/// Local log retention applied before a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRetention {
    /// Log directory
    pub dir: PathBuf,
    /// Maximum file age
    pub retention: Duration,
}

/// Export coordinator
pub struct ExportCoordinator {
    gateway: Arc<dyn RemoteGateway>,
    notifier: Arc<dyn NotificationSink>,
    context: Arc<RunContext>,
    policy: ExportPolicy,
    max_workers: usize,
    excluded: Vec<String>,
    key_file: PathBuf,
    log_retention: Option<LogRetention>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(
        config: &BackupConfig,
        gateway: Arc<dyn RemoteGateway>,
        notifier: Arc<dyn NotificationSink>,
        context: Arc<RunContext>,
    ) -> Self {
        let log_retention = config.logging.local_enabled.then(|| LogRetention {
            dir: PathBuf::from(&config.logging.local_path),
            retention: Duration::from_secs(config.logging.retention_days * 24 * 60 * 60),
        });

        Self {
            gateway,
            notifier,
            context,
            policy: ExportPolicy::from_config(&config.export),
            max_workers: config.export.max_workers,
            excluded: config.export.excluded_databases.clone(),
            key_file: PathBuf::from(&config.gcp.key_file),
            log_retention,
        }
    }

    /// Override the worker budget
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Override the export policy
    pub fn with_policy(mut self, policy: ExportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Worker budget in effect
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Execute the backup run
    ///
    /// This is the main entry point. It:
    /// 1. Purges stale local log files
    /// 2. Activates the service account (failure aborts the run)
    /// 3. Runs one worker per instance, at most `max_workers` at a time
    /// 4. Waits for every worker and aggregates their reports
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Authentication`] when the provider rejects the
    /// credentials. Failures inside instances never surface as errors; they
    /// are part of the report.
    pub async fn execute_export(&self, instances: Vec<Instance>) -> Result<RunReport> {
        let span = self.context.span.clone();
        self.execute(instances).instrument(span).await
    }

    async fn execute(&self, instances: Vec<Instance>) -> Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::new(self.context.run_id, self.context.run_date);

        tracing::info!(
            instances = instances.len(),
            max_workers = self.max_workers,
            "Starting backup run"
        );

        if let Some(logs) = &self.log_retention {
            purge_stale_logs(&logs.dir, logs.retention, SystemTime::now());
        }

        if let Err(e) = self.gateway.authenticate(&self.key_file).await {
            tracing::error!(error = %e, "Authentication failed, aborting run");
            self.notifier
                .notify("Backup run aborted: authentication failed", &e.to_string())
                .await;
            return Err(BackupError::Authentication(e.to_string()));
        }

        let worker = Arc::new(InstanceWorker::new(
            DatabaseEnumerator::new(self.gateway.clone(), self.excluded.clone()),
            ExportStateMachine::new(self.gateway.clone(), self.policy.clone()),
            self.notifier.clone(),
            self.context.clone(),
        ));
        let permits = Arc::new(Semaphore::new(self.max_workers.max(1)));
        let ids: Vec<_> = instances.iter().map(|i| i.id.clone()).collect();

        let mut tasks = JoinSet::new();
        for (index, instance) in instances.into_iter().enumerate() {
            let worker = worker.clone();
            let permits = permits.clone();
            let notifier = self.notifier.clone();
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, InstanceReport::fatal(instance.id, "worker pool closed"));
                };
                // A panicking worker must still produce a report
                let id = instance.id.clone();
                let handle = tokio::spawn(async move { worker.run(&instance).await });
                match handle.await {
                    Ok(instance_report) => (index, instance_report),
                    Err(e) => {
                        let reason = format!("instance worker failed: {e}");
                        tracing::error!(instance = %id, reason = %reason, "Instance worker failed");
                        notifier
                            .notify(&instance_failure_subject(id.as_str()), &reason)
                            .await;
                        (index, InstanceReport::fatal(id, reason))
                    }
                }
            });
        }

        let mut slots: Vec<Option<InstanceReport>> = vec![None; ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, instance_report)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(instance_report);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Instance task failed"),
            }
        }

        for (id, slot) in ids.into_iter().zip(slots) {
            let instance_report = match slot {
                Some(instance_report) => instance_report,
                None => {
                    let reason = "instance task ended without a report".to_string();
                    self.notifier
                        .notify(&instance_failure_subject(id.as_str()), &reason)
                        .await;
                    InstanceReport::fatal(id, reason)
                }
            };
            report.instances.push(instance_report);
        }

        let report = report.with_duration(started.elapsed());
        report.log_summary();
        Ok(report)
    }
}
