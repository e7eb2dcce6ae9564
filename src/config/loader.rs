//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::BackupConfig;
use crate::domain::errors::BackupError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`BackupConfig`]
/// 4. Applies environment variable overrides (`BACKUP_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`BackupError::Configuration`] if the file cannot be read, a
/// referenced variable is unset, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use cloudsql_backup::config::load_config;
///
/// let config = load_config("backup.toml").expect("Failed to load config");
/// println!("{} instances", config.instances.len());
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<BackupConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(BackupError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BackupError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: BackupConfig = toml::from_str(&contents)
        .map_err(|e| BackupError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        BackupError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied verbatim so documented placeholders do not have
/// to be set.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| BackupError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(BackupError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `BACKUP_*` prefix
///
/// Variables follow the pattern `BACKUP_<SECTION>_<KEY>`, for example
/// `BACKUP_EXPORT_MAX_WORKERS`. Unparseable numeric values are ignored.
fn apply_env_overrides(config: &mut BackupConfig) {
    if let Ok(val) = std::env::var("BACKUP_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Cloud provider overrides
    if let Ok(val) = std::env::var("BACKUP_GCP_KEY_FILE") {
        config.gcp.key_file = val;
    }
    if let Ok(val) = std::env::var("BACKUP_GCP_PROJECT") {
        config.gcp.project = val;
    }
    if let Ok(val) = std::env::var("BACKUP_GCP_BUCKET") {
        config.gcp.bucket = val;
    }
    if let Ok(val) = std::env::var("BACKUP_GCP_PATH_PREFIX") {
        config.gcp.path_prefix = val;
    }

    // Credential overrides
    if let Ok(val) = std::env::var("BACKUP_CREDENTIALS_USERNAME") {
        config.credentials.username = val;
    }
    if let Ok(val) = std::env::var("BACKUP_CREDENTIALS_PASSWORD") {
        config.credentials.password = Some(crate::config::secret_string(val));
    }

    // Export overrides
    if let Ok(val) = std::env::var("BACKUP_EXPORT_MAX_WORKERS") {
        if let Ok(workers) = val.parse() {
            config.export.max_workers = workers;
        }
    }
    if let Ok(val) = std::env::var("BACKUP_EXPORT_POLL_INTERVAL_SECS") {
        if let Ok(secs) = val.parse() {
            config.export.poll_interval_secs = secs;
        }
    }
    if let Ok(val) = std::env::var("BACKUP_EXPORT_MAX_POLL_DURATION_SECS") {
        if let Ok(secs) = val.parse() {
            config.export.max_poll_duration_secs = Some(secs);
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("BACKUP_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("BACKUP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    // Notification overrides
    if let Ok(val) = std::env::var("BACKUP_NOTIFICATION_WEBHOOK_URL") {
        config.notification.webhook_url = Some(val);
    }
}
