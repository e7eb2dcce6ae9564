// cloudsql-backup - Cloud SQL export orchestrator
// Copyright (c) 2025 cloudsql-backup Contributors
// Licensed under the MIT License

//! # cloudsql-backup - Cloud SQL export orchestrator
//!
//! cloudsql-backup exports every database of a set of managed MySQL instances
//! to cloud object storage, one compressed SQL dump per database per day.
//!
//! ## Overview
//!
//! A run:
//! - **Authenticates** once with a service account key before scheduling work
//! - **Enumerates** each instance's databases, smallest first
//! - **Exports** them one at a time per instance, retrying initiation while
//!   the instance reports a conflicting operation and polling until done
//! - **Runs** a bounded number of instances concurrently
//! - **Notifies** on every failure and never lets one failure stop the rest
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Enumeration, the export state machine and the coordinator
//! - [`adapters`] - External tools (`gcloud`, `mysql`) behind [`adapters::gateway::RemoteGateway`]
//! - [`notify`] - Failure notification sinks
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloudsql_backup::adapters::gateway::create_gateway;
//! use cloudsql_backup::config::load_config;
//! use cloudsql_backup::core::context::RunContext;
//! use cloudsql_backup::core::export::ExportCoordinator;
//! use cloudsql_backup::notify::create_notifier;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("backup.toml")?;
//!     let instances = config.resolve_instances()?;
//!
//!     let coordinator = ExportCoordinator::new(
//!         &config,
//!         create_gateway(&config),
//!         create_notifier(&config.notification)?,
//!         Arc::new(RunContext::new()),
//!     );
//!     let report = coordinator.execute_export(instances).await?;
//!
//!     println!("{} exports succeeded", report.total_succeeded());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::BackupError`]; tool invocations return
//! [`domain::GatewayError`]. Per-database and per-instance failures are not
//! errors at all: they are recorded in the [`core::export::RunReport`].
//!
//! ## Logging
//!
//! Every event of a run is emitted inside a `backup_run` span carrying the
//! run id, with nested `instance` and `database` spans.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod notify;
