//! Configuration management.
//!
//! TOML-based configuration loading, parsing and validation.
//!
//! # Overview
//!
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `BACKUP_*` environment overrides
//! - Default values for optional settings
//! - Run-wide validation (per-instance problems are left to the instance worker)
//!
//! # Example Configuration
//!
//! ```toml
//! [gcp]
//! key_file = "/root/jsonfiles/sa.json"
//! project = "dba-prod"
//! bucket = "gs://dba-bucket"
//! path_prefix = "Backups/Current/MYSQL"
//!
//! [credentials]
//! username = "backup"
//! password = "${BACKUP_DB_PASSWORD}"
//!
//! [export]
//! max_workers = 2
//!
//! [[instances]]
//! name = "orders-db"
//! host = "10.0.0.5"
//! tls = true
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cloudsql_backup::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("backup.toml")?;
//! println!("Workers: {}", config.export.max_workers);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, BackupConfig, CredentialsConfig, ExportConfig, GcpConfig, InstanceConfig,
    LoggingConfig, NotificationConfig, NotificationKind, TlsConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
