//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "backup.toml")]
    pub output: String,

    /// Include every optional setting with its default value
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing cloudsql-backup configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let content = if self.with_examples {
            generate_full_config()
        } else {
            generate_minimal_config()
        };

        match fs::write(&self.output, content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your project, bucket and instances", self.output);
                println!("  2. Export BACKUP_DB_PASSWORD (or add it to a .env file)");
                println!("  3. Validate configuration: cloudsql-backup validate-config");
                println!("  4. Preview the run: cloudsql-backup plan");
                println!("  5. Run export: cloudsql-backup export");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

fn generate_minimal_config() -> String {
    r#"# cloudsql-backup configuration

[gcp]
key_file = "/etc/cloudsql-backup/service-account.json"
project = "my-project"
bucket = "gs://my-backups"

[credentials]
username = "backup"
password = "${BACKUP_DB_PASSWORD}"

[[instances]]
name = "orders-db"
host = "10.0.0.5"
"#
    .to_string()
}

fn generate_full_config() -> String {
    r#"# cloudsql-backup configuration
#
# Values of the form ${VAR} are read from the environment.
# Common settings can be overridden with BACKUP_<SECTION>_<KEY>, e.g.
# BACKUP_EXPORT_MAX_WORKERS.

[application]
log_level = "info"  # trace | debug | info | warn | error

[gcp]
key_file = "/etc/cloudsql-backup/service-account.json"
project = "my-project"
bucket = "gs://my-backups"
path_prefix = "mysql"
gcloud_path = "gcloud"

[credentials]
username = "backup"
password = "${BACKUP_DB_PASSWORD}"
mysql_path = "mysql"

[export]
max_workers = 2
conflict_retry_attempts = 3
conflict_backoff_secs = 60
poll_interval_secs = 30
# max_poll_duration_secs = 7200
offload = true
excluded_databases = ["mysql", "information_schema", "performance_schema", "sys"]
command_timeout_secs = 600

[tls]
cert_root = "/etc/cloudsql-backup/ssl-certs"

[[instances]]
name = "orders-db"
host = "10.0.0.5"
tls = true

[[instances]]
name = "crm-db"
host = "10.0.0.6"
project = "crm-project"
bucket = "gs://crm-backups"

[logging]
local_enabled = true
local_path = "/var/log/cloudsql-backup"
# Files roll daily as <file_prefix>.<YYYY-MM-DD>.log
file_prefix = "cloudsql-backup"
retention_days = 30

[notification]
kind = "log"  # log | command | webhook
# command = "/usr/local/bin/send-alert"
# args = ["--channel", "dba"]
# webhook_url = "https://alerts.example.com/hooks/backup"
timeout_secs = 30
"#
    .to_string()
}
