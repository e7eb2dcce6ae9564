//! Core business logic.
//!
//! This module contains the export engine and the pieces it is built from.
//!
//! # Modules
//!
//! - [`context`] - Run identity and date shared by all components
//! - [`enumerate`] - Database discovery and size ordering
//! - [`export`] - State machine, instance worker, coordinator and reports
//! - [`housekeeping`] - Stale log purge
//!
//! # Export Workflow
//!
//! 1. **Housekeeping**: Purge local log files past their retention
//! 2. **Authenticate**: Activate the service account once
//! 3. **Schedule**: Admit at most `max_workers` instances at a time
//! 4. **Enumerate**: List each instance's databases, smallest first
//! 5. **Export**: Initiate, retry on conflict, poll until terminal
//! 6. **Report**: Aggregate per-instance results
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudsql_backup::adapters::gateway::create_gateway;
//! use cloudsql_backup::config::load_config;
//! use cloudsql_backup::core::context::RunContext;
//! use cloudsql_backup::core::export::ExportCoordinator;
//! use cloudsql_backup::notify::create_notifier;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("backup.toml")?;
//! let instances = config.resolve_instances()?;
//!
//! let coordinator = ExportCoordinator::new(
//!     &config,
//!     create_gateway(&config),
//!     create_notifier(&config.notification)?,
//!     Arc::new(RunContext::new()),
//! );
//! let report = coordinator.execute_export(instances).await?;
//!
//! println!("Succeeded: {}", report.total_succeeded());
//! println!("Failed: {}", report.total_failed());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod enumerate;
pub mod export;
pub mod housekeeping;
