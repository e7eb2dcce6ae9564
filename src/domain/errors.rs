//! Domain error types
//!
//! This module defines the error hierarchy for the backup orchestrator.
//! Errors never expose the process or HTTP types of the underlying tools.

use thiserror::Error;

/// Main backup error type
///
/// This is the primary error type used throughout the application.
/// It wraps the gateway errors and classifies the rest by concern.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cloud provider authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Remote command gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Database enumeration errors
    #[error("Enumeration error: {0}")]
    Enumeration(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Remote command gateway errors
///
/// Errors raised while invoking the cloud provider or database client tools.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The instance already runs a conflicting operation (HTTP 409)
    #[error("Conflicting operation in progress: {0}")]
    Conflict(String),

    /// The tool ran but exited unsuccessfully
    #[error("{program} exited with code {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool could not be started at all
    #[error("Failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },

    /// The tool did not finish within its deadline
    #[error("{program} did not finish within {secs}s")]
    Timeout { program: String, secs: u64 },

    /// The tool produced output that does not match the expected grammar
    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    /// The provider accepted the request but reported the operation as failed
    #[error("Provider operation failed: {0}")]
    OperationFailed(String),

    /// Credential activation failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl GatewayError {
    /// Whether this error is the transient resource-conflict rejection
    pub fn is_conflict(&self) -> bool {
        matches!(self, GatewayError::Conflict(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        BackupError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        BackupError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BackupError {
    fn from(err: toml::de::Error) -> Self {
        BackupError::Configuration(format!("TOML parse error: {err}"))
    }
}
