//! Domain models and types for the backup orchestrator.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`InstanceId`], [`DatabaseName`], [`OperationHandle`])
//! - **Run models** ([`Instance`], [`StorageLocation`], [`DatabaseRef`])
//! - **Export lifecycle** ([`ExportJob`], [`ExportState`], [`JobOutcome`], [`FailureReason`])
//! - **Error types** ([`BackupError`], [`GatewayError`]) and the [`Result`] alias
//!
//! # Object naming
//!
//! ```rust
//! use cloudsql_backup::domain::{DatabaseName, InstanceId, StorageLocation};
//! use chrono::NaiveDate;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let location = StorageLocation::new("gs://backups", "Backups/Current/MYSQL")?;
//! let uri = location.object_uri(
//!     &InstanceId::new("prod-1")?,
//!     NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!     &DatabaseName::new("sales")?,
//! );
//! assert_eq!(uri, "gs://backups/Backups/Current/MYSQL/prod-1/2024-01-05_sales.sql.gz");
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod instance;
pub mod job;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{BackupError, GatewayError};
pub use ids::{DatabaseName, InstanceId, OperationHandle};
pub use instance::{DatabaseRef, DbCredentials, Instance, StorageLocation};
pub use job::{ExportJob, ExportState, FailureReason, JobOutcome};
pub use result::Result;
