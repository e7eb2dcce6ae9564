//! Result type alias for the backup orchestrator

use super::errors::BackupError;

/// Result type alias for backup operations
///
/// # Examples
///
/// ```
/// use cloudsql_backup::domain::result::Result;
/// use cloudsql_backup::domain::errors::BackupError;
///
/// fn failing_function() -> Result<()> {
///     Err(BackupError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, BackupError>;
