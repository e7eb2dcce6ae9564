//! Configuration schema types
//!
//! This module defines the TOML configuration structure. Validation here is
//! limited to what would make the whole run meaningless; problems that only
//! affect one instance (missing host, unreadable TLS bundle) are detected by
//! that instance's worker so sibling instances still run.

use crate::config::SecretString;
use crate::domain::{DbCredentials, Instance, InstanceId, StorageLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Main configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Cloud provider settings
    pub gcp: GcpConfig,

    /// Database login shared by every instance
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Export scheduling and retry settings
    #[serde(default)]
    pub export: ExportConfig,

    /// TLS defaults for database connections
    #[serde(default)]
    pub tls: TlsConfig,

    /// Instances to back up
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Failure notification settings
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl BackupConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any run-wide configuration value is invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.gcp.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        self.notification.validate()?;

        if self.instances.is_empty() {
            return Err("at least one [[instances]] entry is required".to_string());
        }

        let mut seen = HashSet::new();
        for instance in &self.instances {
            instance.validate()?;
            if !seen.insert(instance.name.as_str()) {
                return Err(format!("duplicate instance name '{}'", instance.name));
            }
        }

        Ok(())
    }

    /// Resolves every configured instance against the run-wide defaults
    ///
    /// Per-instance overrides win over the `[gcp]` and `[tls]` defaults.
    pub fn resolve_instances(&self) -> Result<Vec<Instance>, String> {
        let credentials = Arc::new(DbCredentials {
            username: self.credentials.username.clone(),
            password: self
                .credentials
                .password
                .clone()
                .unwrap_or_else(|| crate::config::secret_string(String::new())),
        });

        self.instances
            .iter()
            .map(|instance| instance.resolve(self, credentials.clone()))
            .collect()
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Cloud provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Service account key file activated before any work is scheduled
    pub key_file: String,

    /// Default project for instances that do not override it
    pub project: String,

    /// Default export bucket (with or without `gs://`)
    pub bucket: String,

    /// Default object path prefix inside the bucket
    #[serde(default)]
    pub path_prefix: String,

    /// Path of the `gcloud` executable
    #[serde(default = "default_gcloud_path")]
    pub gcloud_path: String,
}

impl GcpConfig {
    fn validate(&self) -> Result<(), String> {
        if self.key_file.trim().is_empty() {
            return Err("gcp.key_file cannot be empty".to_string());
        }
        if self.project.trim().is_empty() {
            return Err("gcp.project cannot be empty".to_string());
        }
        StorageLocation::new(&self.bucket, &self.path_prefix)
            .map_err(|e| format!("gcp.bucket: {e}"))?;
        Ok(())
    }
}

/// Database login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Database user
    #[serde(default)]
    pub username: String,

    /// Database password
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Path of the `mysql` client executable
    #[serde(default = "default_mysql_path")]
    pub mysql_path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            mysql_path: default_mysql_path(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Number of instances exported concurrently
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Initiation attempts when the instance reports a conflicting operation
    #[serde(default = "default_conflict_retry_attempts")]
    pub conflict_retry_attempts: u32,

    /// Delay between conflicting initiation attempts, in seconds
    #[serde(default = "default_conflict_backoff_secs")]
    pub conflict_backoff_secs: u64,

    /// Delay between operation status queries, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Optional ceiling on how long one export may stay pending, in seconds.
    /// Unset means poll until the provider reports a terminal status.
    #[serde(default)]
    pub max_poll_duration_secs: Option<u64>,

    /// Use serverless export so the source instance is not loaded
    #[serde(default = "default_true")]
    pub offload: bool,

    /// Schemas never exported
    #[serde(default = "default_excluded_databases")]
    pub excluded_databases: Vec<String>,

    /// Deadline for a single gcloud or mysql invocation, in seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 || self.max_workers > 32 {
            return Err(format!(
                "export.max_workers must be between 1 and 32, got {}",
                self.max_workers
            ));
        }

        if self.conflict_retry_attempts == 0 || self.conflict_retry_attempts > 10 {
            return Err(format!(
                "export.conflict_retry_attempts must be between 1 and 10, got {}",
                self.conflict_retry_attempts
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err("export.poll_interval_secs must be > 0".to_string());
        }

        if self.max_poll_duration_secs == Some(0) {
            return Err("export.max_poll_duration_secs must be > 0 when set".to_string());
        }

        if self.command_timeout_secs == 0 {
            return Err("export.command_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            conflict_retry_attempts: default_conflict_retry_attempts(),
            conflict_backoff_secs: default_conflict_backoff_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_duration_secs: None,
            offload: true,
            excluded_databases: default_excluded_databases(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

/// TLS defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Directory holding one certificate bundle directory per instance
    #[serde(default = "default_cert_root")]
    pub cert_root: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_root: default_cert_root(),
        }
    }
}

/// One instance to back up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Provider instance name
    pub name: String,

    /// Host the database client connects to
    #[serde(default)]
    pub host: String,

    /// Connect to the database over TLS
    #[serde(default, alias = "ssl")]
    pub tls: bool,

    /// Certificate bundle directory (defaults to `<tls.cert_root>/<name>`)
    #[serde(default)]
    pub tls_cert_dir: Option<String>,

    /// Project override
    #[serde(default)]
    pub project: Option<String>,

    /// Bucket override
    #[serde(default)]
    pub bucket: Option<String>,

    /// Path prefix override
    #[serde(default)]
    pub path_prefix: Option<String>,
}

impl InstanceConfig {
    fn validate(&self) -> Result<(), String> {
        InstanceId::new(&self.name).map_err(|e| format!("instances.name: {e}"))?;

        if self.bucket.is_some() || self.path_prefix.is_some() {
            StorageLocation::new(
                self.bucket.as_deref().unwrap_or("placeholder"),
                self.path_prefix.as_deref().unwrap_or_default(),
            )
            .map_err(|e| format!("instance '{}': {e}", self.name))?;
        }

        Ok(())
    }

    fn resolve(
        &self,
        config: &BackupConfig,
        credentials: Arc<DbCredentials>,
    ) -> Result<Instance, String> {
        let id = InstanceId::new(&self.name)?;
        let storage = StorageLocation::new(
            self.bucket.as_deref().unwrap_or(&config.gcp.bucket),
            self.path_prefix
                .as_deref()
                .unwrap_or(&config.gcp.path_prefix),
        )?;
        let tls_dir = self.tls.then(|| match &self.tls_cert_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(&config.tls.cert_root).join(&self.name),
        });

        Ok(Instance {
            id,
            host: self.host.trim().to_string(),
            project: self
                .project
                .clone()
                .unwrap_or_else(|| config.gcp.project.clone()),
            storage,
            tls_dir,
            credentials,
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log file name prefix; files roll daily as `<prefix>.<date>.log`
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Log files older than this many days are purged at startup
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

impl LoggingConfig {
    /// Console-only logging, used by commands that do not write log files
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        if self.file_prefix.trim().is_empty() {
            return Err("logging.file_prefix cannot be empty".to_string());
        }
        if self.retention_days == 0 {
            return Err("logging.retention_days must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            file_prefix: default_file_prefix(),
            retention_days: default_retention_days(),
        }
    }
}

/// Notification sink selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Record notifications in the log only
    #[default]
    Log,
    /// Run an external alert program
    Command,
    /// POST a JSON payload to a webhook
    Webhook,
}

/// Failure notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Sink type
    #[serde(default)]
    pub kind: NotificationKind,

    /// Program run for `kind = "command"`
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments placed before the subject and detail
    #[serde(default)]
    pub args: Vec<String>,

    /// Endpoint for `kind = "webhook"`
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Delivery timeout in seconds
    #[serde(default = "default_notification_timeout_secs")]
    pub timeout_secs: u64,
}

impl NotificationConfig {
    fn validate(&self) -> Result<(), String> {
        match self.kind {
            NotificationKind::Log => {}
            NotificationKind::Command => {
                if self
                    .command
                    .as_deref()
                    .map(|c| c.trim().is_empty())
                    .unwrap_or(true)
                {
                    return Err(
                        "notification.command is required when kind = 'command'".to_string()
                    );
                }
            }
            NotificationKind::Webhook => {
                let raw = self.webhook_url.as_deref().unwrap_or_default();
                let url = url::Url::parse(raw)
                    .map_err(|e| format!("notification.webhook_url is invalid: {e}"))?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(
                        "notification.webhook_url must start with http:// or https://".to_string(),
                    );
                }
            }
        }

        if self.timeout_secs == 0 {
            return Err("notification.timeout_secs must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            kind: NotificationKind::Log,
            command: None,
            args: Vec::new(),
            webhook_url: None,
            timeout_secs: default_notification_timeout_secs(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_gcloud_path() -> String {
    "gcloud".to_string()
}

fn default_mysql_path() -> String {
    "mysql".to_string()
}

fn default_max_workers() -> usize {
    2
}

fn default_conflict_retry_attempts() -> u32 {
    3
}

fn default_conflict_backoff_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    30
}

pub(crate) fn default_excluded_databases() -> Vec<String> {
    ["mysql", "information_schema", "performance_schema", "sys"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_command_timeout_secs() -> u64 {
    600
}

fn default_cert_root() -> String {
    "/ssl-certs".to_string()
}

fn default_local_path() -> String {
    "/backup/logs".to_string()
}

fn default_file_prefix() -> String {
    "MYSQL_backup".to_string()
}

fn default_retention_days() -> u64 {
    30
}

fn default_notification_timeout_secs() -> u64 {
    10
}
