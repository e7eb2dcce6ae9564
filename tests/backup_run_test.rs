//! Integration tests for a full backup run
//!
//! The coordinator is driven against a scripted in-memory gateway with tokio's
//! clock paused, so backoff and polling waits complete instantly while the
//! measured durations stay exact.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use cloudsql_backup::adapters::gateway::{
    ExportRequest, InitiateResponse, OperationStatus, RemoteGateway,
};
use cloudsql_backup::config::{secret_string, BackupConfig};
use cloudsql_backup::core::context::RunContext;
use cloudsql_backup::core::enumerate::EnumerationSource;
use cloudsql_backup::core::export::{ExportCoordinator, InstanceStatus, RunReport};
use cloudsql_backup::domain::{
    BackupError, DbCredentials, FailureReason, GatewayError, Instance, InstanceId, JobOutcome,
    OperationHandle, StorageLocation,
};
use cloudsql_backup::notify::NotificationSink;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const PREFIX: &str = "gs://backups/Backups/Current/MYSQL";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Listing(String),
    Names(String),
    Initiate {
        instance: String,
        database: String,
        target_uri: String,
    },
    Status(String),
}

#[derive(Default)]
struct Journal {
    calls: Vec<Call>,
    // instance -> handle of its pending export
    pending: HashMap<String, String>,
    max_pending_instances: usize,
    overlapping: Vec<String>,
}

type Initiation = Result<InitiateResponse, GatewayError>;

/// In-memory gateway with per-database initiation scripts
///
/// Unscripted exports are accepted as pending and report DONE on the first
/// status query.
#[derive(Default)]
struct ScriptedGateway {
    reject_auth: bool,
    listings: HashMap<String, String>,
    names: HashMap<String, Vec<String>>,
    panic_on: Option<String>,
    initiations: Mutex<HashMap<(String, String), VecDeque<Initiation>>>,
    statuses: Mutex<HashMap<String, VecDeque<OperationStatus>>>,
    journal: Mutex<Journal>,
}

impl ScriptedGateway {
    fn listing(mut self, instance: &str, raw: &str) -> Self {
        self.listings.insert(instance.to_string(), raw.to_string());
        self
    }

    fn names(mut self, instance: &str, names: &[&str]) -> Self {
        self.names.insert(
            instance.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    fn initiations(self, instance: &str, database: &str, script: Vec<Initiation>) -> Self {
        self.initiations
            .lock()
            .unwrap()
            .insert((instance.to_string(), database.to_string()), script.into());
        self
    }

    fn statuses(self, handle: &str, script: Vec<OperationStatus>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(handle.to_string(), script.into());
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.journal.lock().unwrap().calls.clone()
    }

    fn initiated(&self, instance: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Initiate {
                    instance: i,
                    database,
                    ..
                } if i == instance => Some(database),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RemoteGateway for ScriptedGateway {
    async fn authenticate(&self, _key_file: &Path) -> Result<(), GatewayError> {
        if self.reject_auth {
            Err(GatewayError::AuthenticationFailed(
                "invalid_grant: account not found".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    async fn list_databases_by_size(&self, instance: &Instance) -> Result<String, GatewayError> {
        let id = instance.id.to_string();
        self.journal.lock().unwrap().calls.push(Call::Listing(id.clone()));
        if self.panic_on.as_deref() == Some(id.as_str()) {
            panic!("listing exploded for {id}");
        }
        self.listings
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::CommandFailed {
                program: "mysql".to_string(),
                code: Some(1),
                stderr: "ERROR 2003 (HY000): Can't connect to MySQL server".to_string(),
            })
    }

    async fn list_database_names(
        &self,
        instance: &Instance,
    ) -> Result<Vec<String>, GatewayError> {
        let id = instance.id.to_string();
        self.journal.lock().unwrap().calls.push(Call::Names(id.clone()));
        self.names
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::CommandFailed {
                program: "gcloud".to_string(),
                code: Some(1),
                stderr: "ERROR: (gcloud.sql.databases.list) instance not found".to_string(),
            })
    }

    async fn initiate_export(
        &self,
        request: ExportRequest<'_>,
    ) -> Result<InitiateResponse, GatewayError> {
        let instance = request.instance.to_string();
        let database = request.database.to_string();

        let scripted = self
            .initiations
            .lock()
            .unwrap()
            .get_mut(&(instance.clone(), database.clone()))
            .and_then(|script| script.pop_front());
        let response = scripted.unwrap_or_else(|| {
            Ok(InitiateResponse::Pending(
                OperationHandle::new(format!("op-{instance}-{database}")).unwrap(),
            ))
        });

        let mut journal = self.journal.lock().unwrap();
        journal.calls.push(Call::Initiate {
            instance: instance.clone(),
            database: database.clone(),
            target_uri: request.target_uri.to_string(),
        });
        if journal.pending.contains_key(&instance) {
            journal.overlapping.push(format!("{instance}/{database}"));
        }
        if let Ok(InitiateResponse::Pending(handle)) = &response {
            journal.pending.insert(instance, handle.to_string());
            journal.max_pending_instances =
                journal.max_pending_instances.max(journal.pending.len());
        }
        response
    }

    async fn query_operation_status(
        &self,
        handle: &OperationHandle,
        _project: &str,
    ) -> Result<OperationStatus, GatewayError> {
        let handle = handle.to_string();
        let status = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(&handle)
            .and_then(|script| script.pop_front())
            .unwrap_or(OperationStatus::Done);

        let mut journal = self.journal.lock().unwrap();
        journal.calls.push(Call::Status(handle.clone()));
        if status != OperationStatus::Running {
            journal.pending.retain(|_, pending| *pending != handle);
        }
        Ok(status)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, subject: &str, detail: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), detail.to_string()));
    }
}

fn config(max_workers: usize) -> BackupConfig {
    let mut config: BackupConfig = toml::from_str(
        r#"
[gcp]
key_file = "/keys/sa.json"
project = "proj"
bucket = "gs://backups"
path_prefix = "Backups/Current/MYSQL"

[credentials]
username = "backup"
password = "pw"

[[instances]]
name = "placeholder"

[logging]
local_enabled = false
"#,
    )
    .unwrap();
    config.export.max_workers = max_workers;
    config
}

fn instance(name: &str) -> Instance {
    Instance {
        id: InstanceId::new(name).unwrap(),
        host: "10.0.0.5".to_string(),
        project: "proj".to_string(),
        storage: StorageLocation::new("gs://backups", "Backups/Current/MYSQL").unwrap(),
        tls_dir: None,
        credentials: Arc::new(DbCredentials {
            username: "backup".to_string(),
            password: secret_string("pw".to_string()),
        }),
    }
}

fn context() -> Arc<RunContext> {
    Arc::new(RunContext::with_start(
        Utc::now(),
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
    ))
}

async fn run_with(
    config: &BackupConfig,
    gateway: &Arc<ScriptedGateway>,
    notifier: &Arc<RecordingNotifier>,
    instances: Vec<Instance>,
) -> cloudsql_backup::domain::Result<RunReport> {
    ExportCoordinator::new(config, gateway.clone(), notifier.clone(), context())
        .execute_export(instances)
        .await
}

async fn run(
    max_workers: usize,
    gateway: &Arc<ScriptedGateway>,
    notifier: &Arc<RecordingNotifier>,
    instances: Vec<Instance>,
) -> RunReport {
    run_with(&config(max_workers), gateway, notifier, instances)
        .await
        .unwrap()
}

fn conflict() -> Initiation {
    Err(GatewayError::Conflict(
        "HTTPError 409: Operation failed because another operation was already in progress."
            .to_string(),
    ))
}

fn pending(handle: &str) -> Initiation {
    Ok(InitiateResponse::Pending(OperationHandle::new(handle).unwrap()))
}

#[tokio::test(start_paused = true)]
async fn test_databases_exported_smallest_first() {
    let gateway = Arc::new(ScriptedGateway::default().listing(
        "i1",
        "big\t300.5\nsmall\t0.2\nmid\t12\nNULLDB\tNULL\n",
    ));
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1")]).await;

    assert_eq!(gateway.initiated("i1"), ["NULLDB", "small", "mid", "big"]);

    let i1 = report.instance("i1").unwrap();
    assert_eq!(i1.status, InstanceStatus::Completed);
    assert_eq!(i1.source, Some(EnumerationSource::Primary));
    let order: Vec<_> = i1.exports.iter().map(|r| r.database.to_string()).collect();
    assert_eq!(order, ["NULLDB", "small", "mid", "big"]);
    for record in &i1.exports {
        assert_eq!(record.outcome, JobOutcome::Success(Duration::from_secs(30)));
    }

    assert!(report.is_successful());
    assert_eq!(report.total_succeeded(), 4);
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_target_uris_follow_naming_scheme() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("prod-1", "sales\t1.5\n")
            .listing("prod-2", "crm\t2.5\n"),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("prod-1"), instance("prod-2")]).await;

    let uris: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Initiate { target_uri, .. } => Some(target_uri),
            _ => None,
        })
        .collect();
    assert!(uris.contains(&format!("{PREFIX}/prod-1/2024-01-05_sales.sql.gz")));
    assert!(uris.contains(&format!("{PREFIX}/prod-2/2024-01-05_crm.sql.gz")));
    assert_eq!(
        report.instance("prod-1").unwrap().exports[0].target_uri,
        format!("{PREFIX}/prod-1/2024-01-05_sales.sql.gz")
    );
}

#[tokio::test(start_paused = true)]
async fn test_one_export_in_flight_per_instance() {
    let running = || vec![OperationStatus::Running, OperationStatus::Running];
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "a\t1\nb\t2\nc\t3\n")
            .listing("i2", "x\t1\ny\t2\n")
            .statuses("op-i1-a", running())
            .statuses("op-i1-b", running())
            .statuses("op-i2-x", running()),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1"), instance("i2")]).await;

    let journal = gateway.journal.lock().unwrap();
    assert!(journal.overlapping.is_empty(), "{:?}", journal.overlapping);
    assert_eq!(journal.max_pending_instances, 2);
    drop(journal);

    assert!(report.is_successful());
    assert_eq!(
        report.instance("i1").unwrap().exports[0].outcome,
        JobOutcome::Success(Duration::from_secs(90))
    );
}

#[tokio::test(start_paused = true)]
async fn test_worker_budget_limits_active_instances() {
    let mut gateway = ScriptedGateway::default();
    for name in ["i1", "i2", "i3", "i4", "i5"] {
        gateway = gateway.listing(name, "db\t1\n");
    }
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(RecordingNotifier::default());
    let instances = Vec::from(["i1", "i2", "i3", "i4", "i5"].map(instance));

    let started = tokio::time::Instant::now();
    let report = run(2, &gateway, &notifier, instances).await;

    assert_eq!(gateway.journal.lock().unwrap().max_pending_instances, 2);
    // three admission waves of one 30s poll each
    assert_eq!(started.elapsed(), Duration::from_secs(90));
    assert_eq!(report.total_succeeded(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_single_worker_runs_instances_in_order() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "a\t1\nb\t2\n")
            .listing("i2", "c\t1\n")
            .listing("i3", "d\t1\n"),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(
        1,
        &gateway,
        &notifier,
        vec![instance("i1"), instance("i2"), instance("i3")],
    )
    .await;

    let listed: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Listing(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(listed, ["i1", "i2", "i3"]);
    assert_eq!(gateway.journal.lock().unwrap().max_pending_instances, 1);

    let ids: Vec<_> = report.instances.iter().map(|r| r.instance.to_string()).collect();
    assert_eq!(ids, ["i1", "i2", "i3"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_export_does_not_stop_the_instance() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "a\t1\nb\t2\nc\t3\n")
            .listing("i2", "d\t1\n")
            .initiations(
                "i1",
                "b",
                vec![Err(GatewayError::CommandFailed {
                    program: "gcloud".to_string(),
                    code: Some(1),
                    stderr: "ERROR: The caller does not have permission".to_string(),
                })],
            )
            .statuses(
                "op-i1-c",
                vec![OperationStatus::Failed(
                    "ERROR_RDBMS: mysqldump: Got error: 1045".to_string(),
                )],
            ),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1"), instance("i2")]).await;

    assert_eq!(gateway.initiated("i1"), ["a", "b", "c"]);

    let i1 = report.instance("i1").unwrap();
    assert_eq!(i1.status, InstanceStatus::Completed);
    assert_eq!(i1.succeeded(), 1);
    assert_eq!(i1.failed(), 2);
    assert!(matches!(
        &i1.exports[1].outcome,
        JobOutcome::Failed(FailureReason::Initiation(msg)) if msg.contains("permission")
    ));
    assert!(matches!(
        &i1.exports[2].outcome,
        JobOutcome::Failed(FailureReason::Provider(msg)) if msg.contains("1045")
    ));
    assert!(report.instance("i2").unwrap().is_successful());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "Backup export failed: i1/b");
    assert!(sent[0]
        .1
        .contains(&format!("{PREFIX}/i1/2024-01-05_b.sql.gz")));
    assert_eq!(sent[1].0, "Backup export failed: i1/c");
    assert!(!report.is_successful());
}

#[tokio::test(start_paused = true)]
async fn test_enumeration_failure_is_isolated() {
    let gateway = Arc::new(ScriptedGateway::default().listing("i2", "d\t1\n"));
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1"), instance("i2")]).await;

    let i1 = report.instance("i1").unwrap();
    assert_eq!(i1.status, InstanceStatus::EnumerationFailed);
    assert_eq!(i1.source, Some(EnumerationSource::Unavailable));
    assert!(i1.exports.is_empty());
    assert!(gateway.initiated("i1").is_empty());
    assert!(gateway.calls().contains(&Call::Names("i1".to_string())));

    assert!(report.instance("i2").unwrap().is_successful());
    assert_eq!(report.failed_instances(), 1);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Backup instance failed: i1");
}

#[tokio::test(start_paused = true)]
async fn test_fallback_enumeration_keeps_provider_order() {
    let gateway = Arc::new(ScriptedGateway::default().names("i1", &["zeta", "mysql", "alpha"]));
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1")]).await;

    assert_eq!(gateway.initiated("i1"), ["zeta", "alpha"]);
    let i1 = report.instance("i1").unwrap();
    assert_eq!(i1.source, Some(EnumerationSource::Fallback));
    assert!(i1.exports.iter().all(|r| r.size_mb == 0.0));
    assert!(report.is_successful());
}

#[tokio::test(start_paused = true)]
async fn test_conflict_twice_then_success() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "sales\t10\n")
            .initiations("i1", "sales", vec![conflict(), conflict(), pending("op-3")])
            .statuses("op-3", vec![OperationStatus::Running, OperationStatus::Done]),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let started = tokio::time::Instant::now();
    let report = run(2, &gateway, &notifier, vec![instance("i1")]).await;

    assert_eq!(gateway.initiated("i1").len(), 3);
    // two 60s backoffs, then two 30s polls
    assert_eq!(started.elapsed(), Duration::from_secs(180));
    assert_eq!(
        report.instance("i1").unwrap().exports[0].outcome,
        JobOutcome::Success(Duration::from_secs(60))
    );
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_conflict_exhausted_moves_on() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "a\t1\nb\t2\n")
            .initiations("i1", "a", vec![conflict(), conflict(), conflict()]),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1")]).await;

    assert_eq!(gateway.initiated("i1"), ["a", "a", "a", "b"]);
    let i1 = report.instance("i1").unwrap();
    assert_eq!(
        i1.exports[0].outcome,
        JobOutcome::Failed(FailureReason::ConflictExhausted { attempts: 3 })
    );
    assert!(i1.exports[1].outcome.is_success());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Backup export failed: i1/a");
}

#[tokio::test(start_paused = true)]
async fn test_synchronous_completion_skips_polling() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "tiny\t0.01\n")
            .initiations("i1", "tiny", vec![Ok(InitiateResponse::Completed)]),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1")]).await;

    assert!(!gateway
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Status(_))));
    assert_eq!(
        report.instance("i1").unwrap().exports[0].outcome,
        JobOutcome::Success(Duration::ZERO)
    );
}

#[tokio::test(start_paused = true)]
async fn test_authentication_failure_aborts_run() {
    let gateway = Arc::new(ScriptedGateway {
        reject_auth: true,
        ..ScriptedGateway::default()
    });
    let notifier = Arc::new(RecordingNotifier::default());

    let result = run_with(&config(2), &gateway, &notifier, vec![instance("i1")]).await;

    assert!(matches!(result, Err(BackupError::Authentication(_))));
    assert!(gateway.calls().is_empty());
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Backup run aborted: authentication failed");
    assert!(sent[0].1.contains("invalid_grant"));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_worker_is_reported_as_fatal() {
    let gateway = Arc::new(ScriptedGateway {
        panic_on: Some("i1".to_string()),
        ..ScriptedGateway::default().listing("i2", "d\t1\n")
    });
    let notifier = Arc::new(RecordingNotifier::default());

    let report = run(2, &gateway, &notifier, vec![instance("i1"), instance("i2")]).await;

    let ids: Vec<_> = report.instances.iter().map(|r| r.instance.to_string()).collect();
    assert_eq!(ids, ["i1", "i2"]);
    assert_eq!(report.instances[0].status, InstanceStatus::Fatal);
    assert!(report.instances[1].is_successful());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Backup instance failed: i1");
}

#[test]
fn test_release_profile_unwinds_so_worker_panics_stay_isolated() {
    let manifest: toml::Value = toml::from_str(include_str!("../Cargo.toml")).unwrap();
    let panic = manifest
        .get("profile")
        .and_then(|p| p.get("release"))
        .and_then(|r| r.get("panic"))
        .and_then(|v| v.as_str());
    assert_ne!(panic, Some("abort"));
}

#[tokio::test(start_paused = true)]
async fn test_unusable_instance_fails_before_enumeration() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "a\t1\n")
            .listing("i2", "b\t1\n"),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let mut broken = instance("i1");
    broken.host = String::new();

    let report = run(2, &gateway, &notifier, vec![broken, instance("i2")]).await;

    let i1 = report.instance("i1").unwrap();
    assert_eq!(i1.status, InstanceStatus::Fatal);
    assert!(i1.error.as_deref().unwrap().contains("host"));
    assert!(!gateway.calls().contains(&Call::Listing("i1".to_string())));
    assert!(report.instance("i2").unwrap().is_successful());
    assert_eq!(notifier.sent()[0].0, "Backup instance failed: i1");
}

#[tokio::test(start_paused = true)]
async fn test_poll_ceiling_fails_stuck_export() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .listing("i1", "a\t1\nb\t2\n")
            .statuses("op-i1-a", vec![OperationStatus::Running; 10]),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let mut config = config(2);
    config.export.max_poll_duration_secs = Some(120);

    let report = run_with(&config, &gateway, &notifier, vec![instance("i1")])
        .await
        .unwrap();

    let i1 = report.instance("i1").unwrap();
    assert!(matches!(
        i1.exports[0].outcome,
        JobOutcome::Failed(FailureReason::PollTimeout(_))
    ));
    assert!(i1.exports[1].outcome.is_success());
}

#[tokio::test]
async fn test_stale_logs_purged_before_authentication() {
    let dir = TempDir::new().unwrap();
    let stale = dir.path().join("cloudsql-backup.2024-01-01.log");
    let fresh = dir.path().join("cloudsql-backup.2024-03-01.log");
    std::fs::write(&stale, "{}\n").unwrap();
    std::fs::write(&fresh, "{}\n").unwrap();
    std::fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(40 * 24 * 60 * 60))
        .unwrap();

    let mut config = config(2);
    config.logging.local_enabled = true;
    config.logging.local_path = dir.path().to_string_lossy().to_string();
    config.logging.retention_days = 30;

    let gateway = Arc::new(ScriptedGateway {
        reject_auth: true,
        ..ScriptedGateway::default()
    });
    let notifier = Arc::new(RecordingNotifier::default());

    let result = run_with(&config, &gateway, &notifier, vec![instance("i1")]).await;

    assert!(result.is_err());
    assert!(!stale.exists());
    assert!(fresh.exists());
}
