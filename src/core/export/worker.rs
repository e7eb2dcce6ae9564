//! Instance worker
//!
//! Exports the databases of one instance strictly one after another, smallest
//! first. A failed database is recorded and notified, then the next one is
//! started. Problems that make the whole instance unusable are notified once
//! and end the worker without attempting any export.

use super::machine::ExportStateMachine;
use super::summary::{ExportRecord, InstanceReport};
use crate::core::context::RunContext;
use crate::core::enumerate::DatabaseEnumerator;
use crate::domain::{ExportJob, Instance, JobOutcome};
use crate::notify::NotificationSink;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;

/// Subject of a per-database failure notification
pub fn export_failure_subject(instance: &str, database: &str) -> String {
    format!("Backup export failed: {instance}/{database}")
}

/// Subject of a fatal instance notification
pub fn instance_failure_subject(instance: &str) -> String {
    format!("Backup instance failed: {instance}")
}

/// Runs all exports of one instance
#[derive(Clone)]
pub struct InstanceWorker {
    enumerator: DatabaseEnumerator,
    machine: ExportStateMachine,
    notifier: Arc<dyn NotificationSink>,
    context: Arc<RunContext>,
}

impl InstanceWorker {
    /// Creates a worker
    pub fn new(
        enumerator: DatabaseEnumerator,
        machine: ExportStateMachine,
        notifier: Arc<dyn NotificationSink>,
        context: Arc<RunContext>,
    ) -> Self {
        Self {
            enumerator,
            machine,
            notifier,
            context,
        }
    }

    /// Exports every database of `instance` and reports the results
    pub async fn run(&self, instance: &Instance) -> InstanceReport {
        let span = tracing::info_span!(
            parent: &self.context.span,
            "instance",
            instance = %instance.id
        );
        self.run_inner(instance).instrument(span).await
    }

    async fn run_inner(&self, instance: &Instance) -> InstanceReport {
        let started = Instant::now();
        tracing::info!(host = %instance.host, project = %instance.project, "Starting instance backup");

        if let Err(reason) = preflight(instance).await {
            tracing::error!(reason = %reason, "Instance cannot be backed up");
            self.notifier
                .notify(&instance_failure_subject(instance.id.as_str()), &reason)
                .await;
            return InstanceReport::fatal(instance.id.clone(), reason)
                .with_duration(started.elapsed());
        }

        let enumeration = self.enumerator.list(instance).await;
        if enumeration.is_unavailable() {
            let report = InstanceReport::enumeration_failed(instance.id.clone());
            self.notifier
                .notify(
                    &instance_failure_subject(instance.id.as_str()),
                    report.error.as_deref().unwrap_or_default(),
                )
                .await;
            return report.with_duration(started.elapsed());
        }
        if enumeration.databases.is_empty() {
            tracing::warn!("No databases to export");
        }

        let mut report = InstanceReport::completed(instance.id.clone(), enumeration.source);
        for database in enumeration.databases {
            let target_uri =
                instance
                    .storage
                    .object_uri(&instance.id, self.context.run_date, &database.name);
            let mut job = ExportJob::new(instance.id.clone(), database.name.clone(), target_uri);

            let span = tracing::info_span!(
                "database",
                database = %database.name,
                size_mb = database.size_mb
            );
            let outcome = self
                .machine
                .run(&mut job, &instance.project)
                .instrument(span)
                .await;

            match &outcome {
                JobOutcome::Success(duration) => tracing::info!(
                    database = %database.name,
                    target = %job.target_uri,
                    duration_secs = duration.as_secs(),
                    "Database exported"
                ),
                JobOutcome::Failed(reason) => {
                    tracing::error!(
                        database = %database.name,
                        target = %job.target_uri,
                        reason = %reason,
                        "Database export failed"
                    );
                    self.notifier
                        .notify(
                            &export_failure_subject(instance.id.as_str(), database.name.as_str()),
                            &format!("{reason} (target {})", job.target_uri),
                        )
                        .await;
                }
            }

            report.record(ExportRecord {
                database: database.name,
                size_mb: database.size_mb,
                target_uri: job.target_uri,
                outcome,
            });
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Instance backup finished"
        );
        report.with_duration(started.elapsed())
    }
}

/// Checks the instance settings that enumeration and export depend on
async fn preflight(instance: &Instance) -> Result<(), String> {
    if instance.host.trim().is_empty() {
        return Err("instance host is not configured".to_string());
    }

    let credentials = &instance.credentials;
    if credentials.username.trim().is_empty() {
        return Err("database username is not configured".to_string());
    }
    if credentials.password.expose_secret().is_empty() {
        return Err("database password is not configured".to_string());
    }

    if let Some(dir) = &instance.tls_dir {
        if let Err(e) = tokio::fs::read_dir(dir).await {
            return Err(format!(
                "TLS certificate directory {} is not readable: {e}",
                dir.display()
            ));
        }
    }

    Ok(())
}
