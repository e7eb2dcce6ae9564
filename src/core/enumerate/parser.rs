//! Size listing parser
//!
//! The engine's size query is run in batch mode and yields one
//! `name<TAB>size_mb` row per schema. The client tool interleaves diagnostic
//! lines with that output, so every line is classified by a fixed grammar
//! before it is trusted. Anything that looks like a data row but does not
//! parse makes the whole listing invalid, and so does output made only of
//! unrecognised lines.

use crate::domain::DatabaseName;
use thiserror::Error;

/// Line prefixes the client tool uses for diagnostics
pub const DIAGNOSTIC_PREFIXES: &[&str] = &["Warning:", "mysql: [Warning]", "WARNING:", "[Warning]"];

/// Columns in a data row
const COLUMNS: usize = 2;

/// A schema and its approximate size
#[derive(Debug, Clone, PartialEq)]
pub struct SizedDatabase {
    /// Schema name
    pub name: DatabaseName,

    /// Data plus index size in megabytes
    pub size_mb: f64,
}

/// Reasons a listing is rejected as a whole
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListingError {
    /// The size column is not a number
    #[error("line {line}: size '{value}' of '{name}' is not a number")]
    InvalidSize {
        line: usize,
        name: String,
        value: String,
    },

    /// The name column is not a usable database name
    #[error("line {line}: {reason}")]
    InvalidName { line: usize, reason: String },

    /// Output was present but no line had the shape of a data row
    #[error("no data rows among {malformed} malformed lines")]
    NoRows { malformed: usize },
}

/// Classification of one output line
#[derive(Debug, Clone, PartialEq)]
pub enum ListingLine<'a> {
    /// Empty or whitespace only
    Blank,
    /// Known client diagnostic
    Diagnostic,
    /// Wrong number of columns
    Malformed,
    /// Candidate data row (name, size column)
    Row(&'a str, &'a str),
}

/// Classifies a single line of the listing
pub fn classify_line(line: &str) -> ListingLine<'_> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return ListingLine::Blank;
    }
    let leading = line.trim_start();
    if DIAGNOSTIC_PREFIXES
        .iter()
        .any(|prefix| leading.starts_with(prefix))
    {
        return ListingLine::Diagnostic;
    }

    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != COLUMNS {
        return ListingLine::Malformed;
    }
    ListingLine::Row(columns[0].trim(), columns[1].trim())
}

fn parse_size(value: &str) -> Option<f64> {
    // Schemas without tables report a NULL sum
    if value.eq_ignore_ascii_case("NULL") {
        return Some(0.0);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|size| size.is_finite() && *size >= 0.0)
}

/// Parses the raw size listing
///
/// Blank lines, diagnostics and rows with the wrong column count are skipped.
/// Names in `excluded` (compared case-insensitively) are dropped. The result
/// is ordered by ascending size, ties broken by name.
///
/// # Errors
///
/// Fails when a two-column row carries a non-numeric size or an unusable
/// name, or when malformed lines are present without a single data row.
/// Callers treat that as an unavailable listing.
///
/// # Examples
///
/// ```
/// use cloudsql_backup::core::enumerate::parse_size_listing;
///
/// let raw = "db1\t12.5\nWarning: password on command line\ndb2\t3.1\n\n";
/// let excluded = vec!["mysql".to_string()];
/// let names: Vec<String> = parse_size_listing(raw, &excluded)
///     .unwrap()
///     .into_iter()
///     .map(|db| db.name.to_string())
///     .collect();
/// assert_eq!(names, ["db2", "db1"]);
/// ```
pub fn parse_size_listing(
    raw: &str,
    excluded: &[String],
) -> Result<Vec<SizedDatabase>, ListingError> {
    let mut databases = Vec::new();
    let mut malformed = 0;
    let mut saw_row = false;

    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let (name, size) = match classify_line(line) {
            ListingLine::Row(name, size) => {
                saw_row = true;
                (name, size)
            }
            ListingLine::Malformed => {
                malformed += 1;
                tracing::debug!(line = line_no, "Discarding malformed listing line");
                continue;
            }
            ListingLine::Blank | ListingLine::Diagnostic => continue,
        };

        if excluded.iter().any(|e| e.eq_ignore_ascii_case(name)) {
            continue;
        }

        let size_mb = parse_size(size).ok_or_else(|| ListingError::InvalidSize {
            line: line_no,
            name: name.to_string(),
            value: size.to_string(),
        })?;
        let name = DatabaseName::new(name).map_err(|reason| ListingError::InvalidName {
            line: line_no,
            reason,
        })?;

        databases.push(SizedDatabase { name, size_mb });
    }

    if malformed > 0 && !saw_row {
        return Err(ListingError::NoRows { malformed });
    }

    databases.sort_by(|a, b| {
        a.size_mb
            .total_cmp(&b.size_mb)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(databases)
}
