//! Gateway factory
//!
//! Builds the production gateway from configuration.

use super::cloudsql::CloudSqlGateway;
use super::traits::RemoteGateway;
use crate::adapters::gcloud::GcloudCli;
use crate::adapters::mysql::MysqlCli;
use crate::adapters::process::{CommandRunner, ProcessRunner};
use crate::config::BackupConfig;
use std::sync::Arc;
use std::time::Duration;

/// Create the command-line backed gateway described by `config`
pub fn create_gateway(config: &BackupConfig) -> Arc<dyn RemoteGateway> {
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(Duration::from_secs(
        config.export.command_timeout_secs,
    )));
    create_gateway_with_runner(config, runner)
}

/// Create the gateway on top of a caller-supplied command runner
pub fn create_gateway_with_runner(
    config: &BackupConfig,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn RemoteGateway> {
    tracing::debug!(
        gcloud = %config.gcp.gcloud_path,
        mysql = %config.credentials.mysql_path,
        "Creating Cloud SQL gateway"
    );

    let gcloud = GcloudCli::new(runner.clone(), config.gcp.gcloud_path.clone());
    let mysql = MysqlCli::new(
        runner,
        config.credentials.mysql_path.clone(),
        &config.export.excluded_databases,
    );

    Arc::new(CloudSqlGateway::new(gcloud, mysql))
}
