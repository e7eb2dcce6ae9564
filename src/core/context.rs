//! Per-run context
//!
//! Everything that identifies one invocation (id, start time, the date used
//! in object names, the root span) is captured once and handed to every
//! component, instead of being read from the clock in many places.

use chrono::{DateTime, Local, NaiveDate, Utc};
use uuid::Uuid;

/// Identity and timing of one backup run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique run identifier, present on every log record of the run
    pub run_id: Uuid,

    /// Run start
    pub started_at: DateTime<Utc>,

    /// Date stamped into export object names
    pub run_date: NaiveDate,

    /// Root span of the run
    pub span: tracing::Span,
}

impl RunContext {
    /// Starts a new run dated with the local calendar day
    pub fn new() -> Self {
        Self::with_start(Utc::now(), Local::now().date_naive())
    }

    /// Creates a run with an explicit start time and object date
    pub fn with_start(started_at: DateTime<Utc>, run_date: NaiveDate) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "backup_run",
            run_id = %run_id,
            run_date = %run_date.format("%Y-%m-%d")
        );
        Self {
            run_id,
            started_at,
            run_date,
            span,
        }
    }

    /// Run date in ISO format (`YYYY-MM-DD`)
    pub fn iso_date(&self) -> String {
        self.run_date.format("%Y-%m-%d").to_string()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
