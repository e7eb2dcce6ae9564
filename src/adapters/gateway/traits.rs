//! Remote command gateway abstraction
//!
//! This module defines the trait every backend of the export engine talks
//! through. The production implementation shells out to `gcloud` and `mysql`;
//! tests substitute scripted implementations.

use crate::domain::{DatabaseName, GatewayError, Instance, InstanceId, OperationHandle};
use async_trait::async_trait;
use std::path::Path;

/// Parameters of one export request
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    /// Instance to export from
    pub instance: &'a InstanceId,

    /// Database to export
    pub database: &'a DatabaseName,

    /// Destination object URI
    pub target_uri: &'a str,

    /// Provider project of the instance
    pub project: &'a str,

    /// Use serverless (offloaded) export
    pub offload: bool,
}

/// Provider answer to an accepted export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiateResponse {
    /// The export already finished (tiny databases complete synchronously)
    Completed,

    /// The export runs asynchronously under this handle
    Pending(OperationHandle),
}

/// Status of an asynchronous provider operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// Still queued or running
    Running,

    /// Finished successfully
    Done,

    /// Finished with the provider-reported failure detail
    Failed(String),
}

/// Gateway to the database engine and the cloud provider
///
/// All methods are read-only except [`RemoteGateway::initiate_export`].
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Activate the service account credentials
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AuthenticationFailed`] when the provider
    /// rejects the key.
    async fn authenticate(&self, key_file: &Path) -> Result<(), GatewayError>;

    /// Query per-database size metadata directly against the engine
    ///
    /// Returns the raw tabular output (`name<TAB>sizeMB` rows); parsing is the
    /// enumerator's job.
    async fn list_databases_by_size(&self, instance: &Instance) -> Result<String, GatewayError>;

    /// Ask the provider's management API for the database names
    async fn list_database_names(&self, instance: &Instance)
        -> Result<Vec<String>, GatewayError>;

    /// Request an asynchronous export
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Conflict`] when the instance is busy with
    /// another operation; any other error is not retryable.
    async fn initiate_export(
        &self,
        request: ExportRequest<'_>,
    ) -> Result<InitiateResponse, GatewayError>;

    /// Query the status of an operation
    async fn query_operation_status(
        &self,
        handle: &OperationHandle,
        project: &str,
    ) -> Result<OperationStatus, GatewayError>;
}
