//! gcloud JSON output models
//!
//! Only the fields of the Cloud SQL operation resource that drive the export
//! state machine are modelled.

use crate::adapters::gateway::OperationStatus;
use serde::{Deserialize, Serialize};

/// Operation lifecycle status as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlOperationStatus {
    /// Queued
    Pending,
    /// Running
    Running,
    /// Finished (check `error` for failure)
    Done,
    /// Anything this client does not know about
    #[serde(other)]
    Unknown,
}

/// Cloud SQL operation resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlOperation {
    /// Operation identifier
    pub name: String,

    /// Lifecycle status
    pub status: SqlOperationStatus,

    /// Operation type (e.g. `EXPORT`)
    #[serde(default)]
    pub operation_type: Option<String>,

    /// Failure details, present only when the operation failed
    #[serde(default)]
    pub error: Option<SqlOperationErrors>,
}

/// Error envelope of an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlOperationErrors {
    /// Individual errors
    #[serde(default)]
    pub errors: Vec<SqlOperationError>,
}

/// One provider error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlOperationError {
    /// Error code
    #[serde(default)]
    pub code: Option<String>,

    /// Human readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl SqlOperation {
    /// Joined failure detail, if the operation carries any error
    pub fn failure_detail(&self) -> Option<String> {
        let errors = self.error.as_ref()?;
        if errors.errors.is_empty() {
            return Some("operation reported an error without details".to_string());
        }
        Some(
            errors
                .errors
                .iter()
                .map(|e| match (&e.code, &e.message) {
                    (Some(code), Some(message)) => format!("{code}: {message}"),
                    (None, Some(message)) => message.clone(),
                    (Some(code), None) => code.clone(),
                    (None, None) => "unknown error".to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Maps the resource onto the gateway status
    pub fn to_status(&self) -> OperationStatus {
        match self.status {
            SqlOperationStatus::Done => match self.failure_detail() {
                Some(detail) => OperationStatus::Failed(detail),
                None => OperationStatus::Done,
            },
            _ => OperationStatus::Running,
        }
    }
}
