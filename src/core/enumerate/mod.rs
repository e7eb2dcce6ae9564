//! Database enumeration
//!
//! Lists the exportable databases of an instance, smallest first. The size
//! query against the engine is the primary source; when it cannot be used the
//! provider's name listing is the fallback. Enumeration never fails: when
//! both sources are unavailable the result is empty and says so.

pub mod parser;

pub use parser::{classify_line, parse_size_listing, ListingError, ListingLine, SizedDatabase};

use crate::adapters::gateway::RemoteGateway;
use crate::domain::{DatabaseName, DatabaseRef, Instance};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where an enumeration result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationSource {
    /// Engine size query, ordered by size
    Primary,
    /// Provider name listing, provider order
    Fallback,
    /// Neither source answered
    Unavailable,
}

impl fmt::Display for EnumerationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumerationSource::Primary => write!(f, "primary"),
            EnumerationSource::Fallback => write!(f, "fallback"),
            EnumerationSource::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Databases of one instance in export order
#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    /// Databases, smallest first when the source is [`EnumerationSource::Primary`]
    pub databases: Vec<DatabaseRef>,

    /// Source of the list
    pub source: EnumerationSource,
}

impl Enumeration {
    fn unavailable() -> Self {
        Self {
            databases: Vec::new(),
            source: EnumerationSource::Unavailable,
        }
    }

    /// Whether neither source could be used
    pub fn is_unavailable(&self) -> bool {
        self.source == EnumerationSource::Unavailable
    }
}

/// Lists exportable databases through the gateway
#[derive(Clone)]
pub struct DatabaseEnumerator {
    gateway: Arc<dyn RemoteGateway>,
    excluded: Vec<String>,
}

impl DatabaseEnumerator {
    /// Creates an enumerator that never returns the `excluded` schemas
    pub fn new(gateway: Arc<dyn RemoteGateway>, excluded: Vec<String>) -> Self {
        Self { gateway, excluded }
    }

    /// Lists the databases of `instance`
    pub async fn list(&self, instance: &Instance) -> Enumeration {
        match self.list_by_size(instance).await {
            Ok(databases) => {
                tracing::info!(
                    instance = %instance.id,
                    count = databases.len(),
                    "Enumerated databases by size"
                );
                return Enumeration {
                    databases,
                    source: EnumerationSource::Primary,
                };
            }
            Err(reason) => {
                tracing::warn!(
                    instance = %instance.id,
                    reason = %reason,
                    "Size listing unavailable, falling back to provider listing"
                );
            }
        }

        match self.gateway.list_database_names(instance).await {
            Ok(names) => {
                let databases = self.fallback_refs(instance, names);
                tracing::info!(
                    instance = %instance.id,
                    count = databases.len(),
                    "Enumerated databases from provider listing"
                );
                Enumeration {
                    databases,
                    source: EnumerationSource::Fallback,
                }
            }
            Err(e) => {
                tracing::error!(
                    instance = %instance.id,
                    error = %e,
                    "Provider database listing failed"
                );
                Enumeration::unavailable()
            }
        }
    }

    async fn list_by_size(&self, instance: &Instance) -> Result<Vec<DatabaseRef>, String> {
        let raw = self
            .gateway
            .list_databases_by_size(instance)
            .await
            .map_err(|e| e.to_string())?;
        let parsed = parse_size_listing(&raw, &self.excluded).map_err(|e| e.to_string())?;
        Ok(parsed
            .into_iter()
            .map(|db| DatabaseRef::new(instance.id.clone(), db.name, db.size_mb))
            .collect())
    }

    fn fallback_refs(&self, instance: &Instance, names: Vec<String>) -> Vec<DatabaseRef> {
        names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .filter(|name| !self.excluded.iter().any(|e| e.eq_ignore_ascii_case(name)))
            .filter_map(|name| match DatabaseName::new(name) {
                Ok(name) => Some(DatabaseRef::new(instance.id.clone(), name, 0.0)),
                Err(reason) => {
                    tracing::warn!(instance = %instance.id, reason = %reason, "Skipping database");
                    None
                }
            })
            .collect()
    }
}
