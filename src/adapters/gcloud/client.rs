//! gcloud CLI client
//!
//! Wraps the `gcloud` subcommands the export engine needs and converts their
//! textual output into typed gateway results.

use super::models::SqlOperation;
use crate::adapters::gateway::{ExportRequest, InitiateResponse, OperationStatus};
use crate::adapters::process::{CommandRunner, CommandSpec};
use crate::domain::{GatewayError, InstanceId, OperationHandle};
use std::path::Path;
use std::sync::Arc;

/// Whether gcloud's stderr describes an operation conflict on the instance
///
/// Cloud SQL allows one administrative operation per instance at a time and
/// rejects concurrent requests with HTTP 409.
pub fn is_conflict(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("httperror 409")
        || lower.contains("409 conflict")
        || lower.contains("already in progress")
        || (lower.contains("another operation") && lower.contains("in progress"))
}

/// Client for the `gcloud` tool
#[derive(Clone)]
pub struct GcloudCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl GcloudCli {
    /// Creates a client invoking `program` through `runner`
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// `gcloud auth activate-service-account --key-file=<key>`
    pub async fn activate_service_account(&self, key_file: &Path) -> Result<(), GatewayError> {
        let spec = CommandSpec::new(&self.program).args([
            "auth".to_string(),
            "activate-service-account".to_string(),
            format!("--key-file={}", key_file.display()),
        ]);

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(GatewayError::AuthenticationFailed(
                output.stderr.trim().to_string(),
            ));
        }

        tracing::info!(key_file = %key_file.display(), "Service account activated");
        Ok(())
    }

    /// `gcloud sql databases list`, one name per line
    pub async fn list_databases(
        &self,
        instance: &InstanceId,
        project: &str,
    ) -> Result<Vec<String>, GatewayError> {
        let spec = CommandSpec::new(&self.program).args([
            "sql".to_string(),
            "databases".to_string(),
            "list".to_string(),
            format!("--instance={instance}"),
            format!("--project={project}"),
            "--format=value(name)".to_string(),
        ]);

        let output = self.runner.run(&spec).await?.into_result(&self.program)?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `gcloud sql export sql ... --async`
    pub async fn export_sql(
        &self,
        request: ExportRequest<'_>,
    ) -> Result<InitiateResponse, GatewayError> {
        let mut args = vec![
            "sql".to_string(),
            "export".to_string(),
            "sql".to_string(),
            request.instance.to_string(),
            request.target_uri.to_string(),
            format!("--database={}", request.database),
        ];
        if request.offload {
            args.push("--offload".to_string());
        }
        args.extend([
            "--async".to_string(),
            format!("--project={}", request.project),
            "--format=json".to_string(),
            "--quiet".to_string(),
        ]);
        let spec = CommandSpec::new(&self.program).args(args);

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            let stderr = output.stderr.trim().to_string();
            if is_conflict(&stderr) {
                return Err(GatewayError::Conflict(stderr));
            }
            return Err(GatewayError::CommandFailed {
                program: self.program.clone(),
                code: output.code,
                stderr,
            });
        }

        let operation = parse_operation(&output.stdout)?;
        match operation.to_status() {
            OperationStatus::Done => Ok(InitiateResponse::Completed),
            OperationStatus::Failed(detail) => Err(GatewayError::OperationFailed(detail)),
            OperationStatus::Running => {
                let handle = OperationHandle::new(operation.name)
                    .map_err(GatewayError::InvalidOutput)?;
                Ok(InitiateResponse::Pending(handle))
            }
        }
    }

    /// `gcloud sql operations describe <handle>`
    pub async fn describe_operation(
        &self,
        handle: &OperationHandle,
        project: &str,
    ) -> Result<OperationStatus, GatewayError> {
        let spec = CommandSpec::new(&self.program).args([
            "sql".to_string(),
            "operations".to_string(),
            "describe".to_string(),
            handle.to_string(),
            format!("--project={project}"),
            "--format=json".to_string(),
        ]);

        let output = self.runner.run(&spec).await?.into_result(&self.program)?;
        Ok(parse_operation(&output.stdout)?.to_status())
    }
}

fn parse_operation(stdout: &str) -> Result<SqlOperation, GatewayError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::InvalidOutput(
            "gcloud returned no operation".to_string(),
        ));
    }

    // Some gcloud versions wrap a single resource in a list
    if trimmed.starts_with('[') {
        let mut operations: Vec<SqlOperation> = serde_json::from_str(trimmed)
            .map_err(|e| GatewayError::InvalidOutput(format!("operation JSON: {e}")))?;
        return operations
            .pop()
            .ok_or_else(|| GatewayError::InvalidOutput("empty operation list".to_string()));
    }

    serde_json::from_str(trimmed)
        .map_err(|e| GatewayError::InvalidOutput(format!("operation JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::process::CommandOutput;
    use crate::domain::DatabaseName;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use test_case::test_case;

    /// Replays one canned output and records the command it was given
    struct CannedRunner {
        output: CommandOutput,
        seen: Mutex<Vec<CommandSpec>>,
    }

    impl CannedRunner {
        fn new(output: CommandOutput) -> Arc<Self> {
            Arc::new(Self {
                output,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_args(&self) -> Vec<String> {
            self.seen.lock().unwrap().last().unwrap().args.clone()
        }
    }

    #[async_trait]
    impl CommandRunner for CannedRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, GatewayError> {
            self.seen.lock().unwrap().push(spec.clone());
            Ok(self.output.clone())
        }
    }

    fn request<'a>(
        instance: &'a InstanceId,
        database: &'a DatabaseName,
        offload: bool,
    ) -> ExportRequest<'a> {
        ExportRequest {
            instance,
            database,
            target_uri: "gs://b/p/i1/2024-01-05_sales.sql.gz",
            project: "proj",
            offload,
        }
    }

    #[test_case("ERROR: (gcloud.sql.export.sql) HTTPError 409: Operation failed because another operation was already in progress." ; "http 409")]
    #[test_case("The operation is already in progress on this instance" ; "already in progress")]
    #[test_case("409 Conflict" ; "status line")]
    #[test_case("Another operation is in progress for this instance" ; "another operation in progress")]
    fn test_conflict_detected(stderr: &str) {
        assert!(is_conflict(stderr));
    }

    #[test_case("ERROR: (gcloud.sql.export.sql) HTTPError 403: The client is not authorized" ; "forbidden")]
    #[test_case("ERROR: (gcloud.sql.export.sql) HTTPError 404: The Cloud SQL instance does not exist." ; "missing instance")]
    #[test_case("ERROR: (gcloud.sql.export.sql) Export depends on another operation that failed." ; "another operation without conflict")]
    fn test_conflict_not_detected(stderr: &str) {
        assert!(!is_conflict(stderr));
    }

    #[tokio::test]
    async fn test_export_pending() {
        let runner = CannedRunner::new(CommandOutput::ok(
            r#"{"name":"op-123","status":"PENDING","operationType":"EXPORT"}"#,
        ));
        let client = GcloudCli::new(runner.clone(), "gcloud");
        let instance = InstanceId::new("i1").unwrap();
        let database = DatabaseName::new("sales").unwrap();

        let response = client
            .export_sql(request(&instance, &database, true))
            .await
            .unwrap();

        assert_eq!(
            response,
            InitiateResponse::Pending(OperationHandle::new("op-123").unwrap())
        );
        let args = runner.last_args();
        assert_eq!(&args[..5], ["sql", "export", "sql", "i1", "gs://b/p/i1/2024-01-05_sales.sql.gz"]);
        assert!(args.contains(&"--database=sales".to_string()));
        assert!(args.contains(&"--offload".to_string()));
        assert!(args.contains(&"--async".to_string()));
        assert!(args.contains(&"--project=proj".to_string()));
    }

    #[tokio::test]
    async fn test_export_without_offload() {
        let runner = CannedRunner::new(CommandOutput::ok(r#"{"name":"op","status":"RUNNING"}"#));
        let client = GcloudCli::new(runner.clone(), "gcloud");
        let instance = InstanceId::new("i1").unwrap();
        let database = DatabaseName::new("sales").unwrap();

        client
            .export_sql(request(&instance, &database, false))
            .await
            .unwrap();
        assert!(!runner.last_args().contains(&"--offload".to_string()));
    }

    #[tokio::test]
    async fn test_export_completed_synchronously() {
        let runner = CannedRunner::new(CommandOutput::ok(r#"{"name":"op","status":"DONE"}"#));
        let client = GcloudCli::new(runner, "gcloud");
        let instance = InstanceId::new("i1").unwrap();
        let database = DatabaseName::new("sales").unwrap();

        let response = client
            .export_sql(request(&instance, &database, true))
            .await
            .unwrap();
        assert_eq!(response, InitiateResponse::Completed);
    }

    #[tokio::test]
    async fn test_export_conflict() {
        let runner = CannedRunner::new(CommandOutput::failed(
            1,
            "ERROR: (gcloud.sql.export.sql) HTTPError 409: Operation failed because another operation was already in progress.",
        ));
        let client = GcloudCli::new(runner, "gcloud");
        let instance = InstanceId::new("i1").unwrap();
        let database = DatabaseName::new("sales").unwrap();

        let err = client
            .export_sql(request(&instance, &database, true))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_export_other_failure() {
        let runner = CannedRunner::new(CommandOutput::failed(
            1,
            "ERROR: (gcloud.sql.export.sql) HTTPError 403: not authorized",
        ));
        let client = GcloudCli::new(runner, "gcloud");
        let instance = InstanceId::new("i1").unwrap();
        let database = DatabaseName::new("sales").unwrap();

        let err = client
            .export_sql(request(&instance, &database, true))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_export_unparseable_output() {
        let runner = CannedRunner::new(CommandOutput::ok("Export started"));
        let client = GcloudCli::new(runner, "gcloud");
        let instance = InstanceId::new("i1").unwrap();
        let database = DatabaseName::new("sales").unwrap();

        let err = client
            .export_sql(request(&instance, &database, true))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn test_describe_operation() {
        let runner = CannedRunner::new(CommandOutput::ok(
            r#"[{"name":"op-123","status":"DONE","error":{"errors":[{"message":"bucket not writable"}]}}]"#,
        ));
        let client = GcloudCli::new(runner.clone(), "gcloud");

        let status = client
            .describe_operation(&OperationHandle::new("op-123").unwrap(), "proj")
            .await
            .unwrap();

        assert_eq!(status, OperationStatus::Failed("bucket not writable".to_string()));
        assert_eq!(
            runner.last_args(),
            ["sql", "operations", "describe", "op-123", "--project=proj", "--format=json"]
        );
    }

    #[tokio::test]
    async fn test_list_databases() {
        let runner = CannedRunner::new(CommandOutput::ok("mysql\nsales\n\n  crm \n"));
        let client = GcloudCli::new(runner, "gcloud");

        let names = client
            .list_databases(&InstanceId::new("i1").unwrap(), "proj")
            .await
            .unwrap();
        assert_eq!(names, ["mysql", "sales", "crm"]);
    }

    #[tokio::test]
    async fn test_activate_service_account_failure() {
        let runner = CannedRunner::new(CommandOutput::failed(1, "ERROR: invalid key file"));
        let client = GcloudCli::new(runner, "gcloud");

        let err = client
            .activate_service_account(Path::new("/keys/sa.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationFailed(msg) if msg.contains("invalid key")));
    }
}
