// cloudsql-backup - Cloud SQL export orchestrator
// Copyright (c) 2025 cloudsql-backup Contributors
// Licensed under the MIT License

use clap::Parser;
use cloudsql_backup::cli::{Cli, Commands, EXIT_FATAL};
use cloudsql_backup::config::LoggingConfig;
use cloudsql_backup::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // The export command sets up file logging itself once the config is loaded
    let _guard = if matches!(cli.command, Commands::Export(_)) {
        None
    } else {
        let log_level = cli.log_level.as_deref().unwrap_or("info");
        match init_logging(log_level, &LoggingConfig::console_only()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Failed to initialize logging: {e}");
                process::exit(EXIT_FATAL);
            }
        }
    };

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Export(args) => args.execute(&cli.config, cli.log_level.as_deref()).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Plan(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
