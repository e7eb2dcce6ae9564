//! Production gateway backed by the gcloud and mysql command line tools

use super::traits::{ExportRequest, InitiateResponse, OperationStatus, RemoteGateway};
use crate::adapters::gcloud::GcloudCli;
use crate::adapters::mysql::MysqlCli;
use crate::domain::{GatewayError, Instance, OperationHandle};
use async_trait::async_trait;
use std::path::Path;

/// [`RemoteGateway`] that shells out to `gcloud` and `mysql`
#[derive(Clone)]
pub struct CloudSqlGateway {
    gcloud: GcloudCli,
    mysql: MysqlCli,
}

impl CloudSqlGateway {
    /// Creates a gateway from its two tool clients
    pub fn new(gcloud: GcloudCli, mysql: MysqlCli) -> Self {
        Self { gcloud, mysql }
    }
}

#[async_trait]
impl RemoteGateway for CloudSqlGateway {
    async fn authenticate(&self, key_file: &Path) -> Result<(), GatewayError> {
        self.gcloud.activate_service_account(key_file).await
    }

    async fn list_databases_by_size(&self, instance: &Instance) -> Result<String, GatewayError> {
        self.mysql.size_listing(instance).await
    }

    async fn list_database_names(
        &self,
        instance: &Instance,
    ) -> Result<Vec<String>, GatewayError> {
        self.gcloud
            .list_databases(&instance.id, &instance.project)
            .await
    }

    async fn initiate_export(
        &self,
        request: ExportRequest<'_>,
    ) -> Result<InitiateResponse, GatewayError> {
        self.gcloud.export_sql(request).await
    }

    async fn query_operation_status(
        &self,
        handle: &OperationHandle,
        project: &str,
    ) -> Result<OperationStatus, GatewayError> {
        self.gcloud.describe_operation(handle, project).await
    }
}
