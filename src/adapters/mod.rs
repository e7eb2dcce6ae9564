//! External system integrations.
//!
//! This module provides adapters for the tools the orchestrator drives:
//!
//! - [`gateway`] - The [`RemoteGateway`](gateway::RemoteGateway) trait and its factory
//! - [`gcloud`] - Cloud SQL management through the `gcloud` CLI
//! - [`mysql`] - Schema size queries through the `mysql` CLI
//! - [`process`] - Command execution shared by both clients
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. Every tool invocation goes
//! through a [`CommandRunner`](process::CommandRunner), and the export engine
//! only sees the gateway trait.
//!
//! ```rust,no_run
//! use cloudsql_backup::adapters::gateway::create_gateway;
//! use cloudsql_backup::config::load_config;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("backup.toml")?;
//! let gateway = create_gateway(&config);
//! gateway.authenticate(Path::new(&config.gcp.key_file)).await?;
//! # Ok(())
//! # }
//! ```

pub mod gateway;
pub mod gcloud;
pub mod mysql;
pub mod process;
