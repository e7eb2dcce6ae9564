//! Plan command implementation
//!
//! Enumerates the databases of each selected instance and prints them in the
//! order they would be exported, with their target URIs. Nothing is exported.

use super::select_instances;
use crate::adapters::gateway::create_gateway;
use crate::cli::{EXIT_AUTH_ERROR, EXIT_CONFIG_ERROR, EXIT_PARTIAL_FAILURE, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::context::RunContext;
use crate::core::enumerate::DatabaseEnumerator;
use clap::Args;
use std::path::Path;

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Only plan these instances (comma-separated names)
    #[arg(long)]
    pub instance: Option<String>,
}

impl PlanArgs {
    /// Execute the plan command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Planning backup run");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let instances = match config
            .resolve_instances()
            .and_then(|all| select_instances(all, self.instance.as_deref()))
        {
            Ok(instances) => instances,
            Err(e) => {
                println!("❌ Configuration error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let gateway = create_gateway(&config);
        if let Err(e) = gateway.authenticate(Path::new(&config.gcp.key_file)).await {
            println!("❌ Authentication failed: {e}");
            return Ok(EXIT_AUTH_ERROR);
        }

        let context = RunContext::new();
        let enumerator = DatabaseEnumerator::new(gateway, config.export.excluded_databases.clone());
        let mut unavailable = 0;

        for instance in &instances {
            let enumeration = enumerator.list(instance).await;
            println!(
                "📋 {} ({} databases, source: {})",
                instance.id,
                enumeration.databases.len(),
                enumeration.source
            );
            if enumeration.is_unavailable() {
                unavailable += 1;
                println!("   ❌ databases could not be listed");
            }
            for database in &enumeration.databases {
                println!(
                    "   {:>10.2} MB  {}  ->  {}",
                    database.size_mb,
                    database.name,
                    instance
                        .storage
                        .object_uri(&instance.id, context.run_date, &database.name)
                );
            }
            println!();
        }

        Ok(if unavailable == 0 {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL_FAILURE
        })
    }
}
