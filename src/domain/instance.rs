//! Instance, storage location and database reference models
//!
//! An [`Instance`] is resolved once from configuration and stays immutable for
//! the whole run. [`DatabaseRef`] values are produced fresh by the enumerator.

use crate::config::SecretString;
use crate::domain::ids::{DatabaseName, InstanceId};
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Scheme used for export object URIs
pub const STORAGE_SCHEME: &str = "gs://";

/// Database login shared by every instance of a run
#[derive(Debug, Clone)]
pub struct DbCredentials {
    /// Database user
    pub username: String,

    /// Database password, zeroized on drop
    pub password: SecretString,
}

/// Target bucket and path prefix for export objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    bucket: String,
    path_prefix: String,
}

impl StorageLocation {
    /// Creates a storage location
    ///
    /// The bucket may be given with or without the `gs://` scheme. Leading and
    /// trailing slashes are stripped from both parts.
    pub fn new(bucket: impl AsRef<str>, path_prefix: impl AsRef<str>) -> Result<Self, String> {
        let bucket = bucket.as_ref().trim();
        let bucket = bucket
            .strip_prefix(STORAGE_SCHEME)
            .unwrap_or(bucket)
            .trim_matches('/')
            .to_string();
        if bucket.is_empty() {
            return Err("Storage bucket cannot be empty".to_string());
        }
        if bucket.contains('/') {
            return Err(format!(
                "Storage bucket '{bucket}' must not contain a path; use path_prefix instead"
            ));
        }
        let path_prefix = path_prefix.as_ref().trim().trim_matches('/').to_string();
        Ok(Self {
            bucket,
            path_prefix,
        })
    }

    /// Bucket name without scheme
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Path prefix without surrounding slashes (may be empty)
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Builds the export object URI
    ///
    /// The layout is `gs://<bucket>/<prefix>/<instance>/<YYYY-MM-DD>_<database>.sql.gz`
    /// and is relied upon by restore tooling.
    ///
    /// # Examples
    ///
    /// ```
    /// use cloudsql_backup::domain::{DatabaseName, InstanceId, StorageLocation};
    /// use chrono::NaiveDate;
    ///
    /// let location = StorageLocation::new("b", "p").unwrap();
    /// let uri = location.object_uri(
    ///     &InstanceId::new("i1").unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
    ///     &DatabaseName::new("sales").unwrap(),
    /// );
    /// assert_eq!(uri, "gs://b/p/i1/2024-01-05_sales.sql.gz");
    /// ```
    pub fn object_uri(
        &self,
        instance: &InstanceId,
        date: NaiveDate,
        database: &DatabaseName,
    ) -> String {
        let object = format!("{}_{}.sql.gz", date.format("%Y-%m-%d"), database);
        if self.path_prefix.is_empty() {
            format!("{STORAGE_SCHEME}{}/{instance}/{object}", self.bucket)
        } else {
            format!(
                "{STORAGE_SCHEME}{}/{}/{instance}/{object}",
                self.bucket, self.path_prefix
            )
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path_prefix.is_empty() {
            write!(f, "{STORAGE_SCHEME}{}", self.bucket)
        } else {
            write!(f, "{STORAGE_SCHEME}{}/{}", self.bucket, self.path_prefix)
        }
    }
}

/// A database server to back up
#[derive(Debug, Clone)]
pub struct Instance {
    /// Provider instance identifier
    pub id: InstanceId,

    /// Host the database client connects to
    pub host: String,

    /// Provider project the instance lives in
    pub project: String,

    /// Where export objects are written
    pub storage: StorageLocation,

    /// Directory holding `server-ca.pem`, `client-cert.pem` and `client-key.pem`
    /// when the client must connect over TLS
    pub tls_dir: Option<PathBuf>,

    /// Database login
    pub credentials: Arc<DbCredentials>,
}

/// A database discovered on an instance
///
/// The size is advisory and only used to order exports.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseRef {
    /// Owning instance
    pub instance: InstanceId,

    /// Database name
    pub name: DatabaseName,

    /// Approximate size in megabytes
    pub size_mb: f64,
}

impl DatabaseRef {
    /// Creates a new database reference
    pub fn new(instance: InstanceId, name: DatabaseName, size_mb: f64) -> Self {
        Self {
            instance,
            name,
            size_mb,
        }
    }
}
