//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod export;
pub mod init;
pub mod plan;
pub mod validate;

use crate::domain::Instance;

/// Splits a comma-separated `--instance` value
pub fn parse_instance_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Keeps the instances named in `filter`, preserving configuration order
///
/// # Errors
///
/// Returns the names that match no configured instance.
pub fn select_instances(
    instances: Vec<Instance>,
    filter: Option<&str>,
) -> Result<Vec<Instance>, String> {
    let Some(raw) = filter else {
        return Ok(instances);
    };
    let wanted = parse_instance_filter(raw);

    let unknown: Vec<&str> = wanted
        .iter()
        .filter(|name| !instances.iter().any(|i| i.id.as_str() == name.as_str()))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(format!("Unknown instance(s): {}", unknown.join(", ")));
    }

    Ok(instances
        .into_iter()
        .filter(|i| wanted.iter().any(|name| name == i.id.as_str()))
        .collect())
}
