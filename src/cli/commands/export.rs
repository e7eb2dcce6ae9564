//! Export command implementation
//!
//! This module implements the `export` command, which runs a full backup of
//! every configured instance (or the `--instance` subset).

use super::select_instances;
use crate::adapters::gateway::create_gateway;
use crate::cli::{
    EXIT_AUTH_ERROR, EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_PARTIAL_FAILURE, EXIT_SUCCESS,
};
use crate::config::load_config;
use crate::core::context::RunContext;
use crate::core::export::{ExportCoordinator, InstanceStatus, RunReport};
use crate::domain::{BackupError, JobOutcome};
use crate::logging::init_logging;
use crate::notify::create_notifier;
use clap::Args;
use std::sync::Arc;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Only export these instances (comma-separated names)
    #[arg(long)]
    pub instance: Option<String>,

    /// Override the number of instances exported concurrently
    #[arg(long)]
    pub max_workers: Option<usize>,
}

impl ExportArgs {
    /// Execute the export command
    ///
    /// Logging is initialized here rather than in `main` because the log
    /// file location comes from the configuration.
    pub async fn execute(&self, config_path: &str, log_level: Option<&str>) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        if let Some(max_workers) = self.max_workers {
            if !(1..=32).contains(&max_workers) {
                eprintln!("--max-workers must be between 1 and 32, got {max_workers}");
                return Ok(EXIT_CONFIG_ERROR);
            }
            config.export.max_workers = max_workers;
        }

        let level = log_level.unwrap_or(&config.application.log_level).to_string();
        let _guard = match init_logging(&level, &config.logging) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Failed to initialize logging: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            config = %config_path,
            "Starting export command"
        );

        let instances = match config
            .resolve_instances()
            .and_then(|all| select_instances(all, self.instance.as_deref()))
        {
            Ok(instances) => instances,
            Err(e) => {
                tracing::error!(error = %e, "Invalid instance selection");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let notifier = match create_notifier(&config.notification) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create notifier");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let context = Arc::new(RunContext::new());
        let coordinator =
            ExportCoordinator::new(&config, create_gateway(&config), notifier, context.clone());

        println!(
            "Starting backup run {} ({} instances, {} workers)",
            context.run_id,
            instances.len(),
            coordinator.max_workers()
        );

        let report = match coordinator.execute_export(instances).await {
            Ok(report) => report,
            Err(BackupError::Authentication(e)) => {
                eprintln!("Authentication failed: {e}");
                return Ok(EXIT_AUTH_ERROR);
            }
            Err(e) => {
                tracing::error!(error = %e, "Backup run failed");
                eprintln!("Backup run failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        print_report(&report);
        Ok(exit_code(&report))
    }
}

/// Maps a finished run onto the process exit code
pub fn exit_code(report: &RunReport) -> i32 {
    if report.is_successful() {
        EXIT_SUCCESS
    } else {
        EXIT_PARTIAL_FAILURE
    }
}

fn print_report(report: &RunReport) {
    println!();
    println!("Backup Summary:");
    for instance in &report.instances {
        match instance.status {
            InstanceStatus::Completed => println!(
                "  {}: {} succeeded, {} failed ({:.0}s)",
                instance.instance,
                instance.succeeded(),
                instance.failed(),
                instance.duration.as_secs_f64()
            ),
            _ => println!(
                "  {}: {:?} - {}",
                instance.instance,
                instance.status,
                instance.error.as_deref().unwrap_or("unknown error")
            ),
        }
        for record in &instance.exports {
            if let JobOutcome::Failed(reason) = &record.outcome {
                println!("    - {}: {reason}", record.database);
            }
        }
    }
    println!(
        "  Total: {} succeeded, {} failed, {} instance(s) not completed",
        report.total_succeeded(),
        report.total_failed(),
        report.failed_instances()
    );
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());
    println!();

    if report.is_successful() {
        println!("Backup completed successfully");
    } else {
        println!("Backup completed with failures");
    }
}
