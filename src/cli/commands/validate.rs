//! Validate config command implementation
//!
//! This module implements the `validate-config` command, which loads the
//! configuration, resolves every instance and prints a summary. It does not
//! contact the provider.

use crate::cli::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let instances = match config.resolve_instances() {
            Ok(instances) => instances,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Project: {}", config.gcp.project);
        println!("  Key File: {}", config.gcp.key_file);
        println!("  Database User: {}", config.credentials.username);
        println!("  Max Workers: {}", config.export.max_workers);
        println!(
            "  Conflict Retry: {} attempts, {}s backoff",
            config.export.conflict_retry_attempts, config.export.conflict_backoff_secs
        );
        println!("  Poll Interval: {}s", config.export.poll_interval_secs);
        match config.export.max_poll_duration_secs {
            Some(secs) => println!("  Max Poll Duration: {secs}s"),
            None => println!("  Max Poll Duration: unlimited"),
        }
        println!("  Excluded Databases: {:?}", config.export.excluded_databases);
        println!("  Notification: {:?}", config.notification.kind);
        println!("  Instances:");
        for instance in &instances {
            println!(
                "    - {} (host {}, project {}, target {}{})",
                instance.id,
                if instance.host.is_empty() { "<unset>" } else { instance.host.as_str() },
                instance.project,
                instance.storage,
                instance
                    .tls_dir
                    .as_ref()
                    .map(|dir| format!(", tls {}", dir.display()))
                    .unwrap_or_default()
            );
        }
        println!();
        Ok(EXIT_SUCCESS)
    }
}
