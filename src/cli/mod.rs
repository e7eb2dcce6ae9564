//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code: every export succeeded
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code: the run finished with failed exports or instances
pub const EXIT_PARTIAL_FAILURE: i32 = 1;
/// Exit code: configuration could not be loaded or is invalid
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Exit code: the provider rejected the service account
pub const EXIT_AUTH_ERROR: i32 = 3;
/// Exit code: any other fatal error
pub const EXIT_FATAL: i32 = 5;

/// cloudsql-backup - Cloud SQL export orchestrator
#[derive(Parser, Debug)]
#[command(name = "cloudsql-backup")]
#[command(version, about, long_about = None)]
#[command(author = "cloudsql-backup Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "backup.toml", env = "BACKUP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BACKUP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every database of the configured instances to cloud storage
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// List the databases that would be exported, in export order
    Plan(commands::plan::PlanArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
