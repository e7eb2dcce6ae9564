//! Domain identifier types with validation
//!
//! Newtype wrappers for the names that flow between the enumerator, the
//! export state machine and the remote gateway. Each type rejects values that
//! would corrupt a command line or a storage object path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database instance identifier newtype wrapper
///
/// This is the provider-side instance name (e.g. the Cloud SQL instance id),
/// which also becomes a path segment of every export object.
///
/// # Examples
///
/// ```
/// use cloudsql_backup::domain::ids::InstanceId;
/// use std::str::FromStr;
///
/// let id = InstanceId::from_str("prod-mysql-01").unwrap();
/// assert_eq!(id.as_str(), "prod-mysql-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    /// Creates a new InstanceId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(InstanceId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Instance ID cannot be empty".to_string());
        }
        if id.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(format!(
                "Instance ID '{id}' cannot contain whitespace or '/'"
            ));
        }
        Ok(Self(id))
    }

    /// Returns the instance ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Database (schema) name newtype wrapper
///
/// A database is the unit of export. Names containing control characters or
/// `/` are rejected because they would end up inside the object URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Creates a new DatabaseName from a string
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Database name cannot be empty".to_string());
        }
        if name.chars().any(|c| c.is_control() || c == '/') {
            return Err(format!(
                "Database name '{}' contains invalid characters",
                name.escape_debug()
            ));
        }
        Ok(Self(name))
    }

    /// Returns the database name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatabaseName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DatabaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of an asynchronous provider operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle(String);

impl OperationHandle {
    /// Creates a new OperationHandle from a string
    pub fn new(handle: impl Into<String>) -> Result<Self, String> {
        let handle = handle.into();
        if handle.trim().is_empty() {
            return Err("Operation handle cannot be empty".to_string());
        }
        Ok(Self(handle.trim().to_string()))
    }

    /// Returns the handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationHandle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
