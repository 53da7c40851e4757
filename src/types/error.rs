//! Error types for the cross-filter library.

use thiserror::Error;

/// All errors that can occur in the cross-filter library.
#[derive(Error, Debug)]
pub enum XfError {
    /// A row could not be normalized into a record. Nothing was loaded.
    #[error("Ingest failed at row {row}, field '{field}': {reason}")]
    Ingest {
        row: usize,
        field: String,
        reason: String,
    },

    /// Malformed filter predicate. The previous filter is retained.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A reducer failed; the group is unusable until the next load.
    #[error("Reducer failed in group {group}: {reason}")]
    Reducer { group: usize, reason: String },

    /// Dimension handle does not belong to this coordinator.
    #[error("Dimension {0} not found")]
    DimensionNotFound(usize),

    /// Group handle does not belong to this coordinator (or has another reducer type).
    #[error("Group {0} not found")]
    GroupNotFound(usize),

    /// Record ID out of range.
    #[error("Record ID {0} not found")]
    RecordNotFound(u32),

    /// Dimension limit reached.
    #[error("Maximum dimensions exceeded: {0}")]
    TooManyDimensions(usize),

    /// Record count does not fit a record ID.
    #[error("Too many records: {0}")]
    TooManyRecords(usize),

    /// CSV reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XfError {
    /// Shorthand for an ingest failure.
    pub fn ingest(row: usize, field: &str, reason: impl Into<String>) -> Self {
        Self::Ingest {
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for cross-filter operations.
pub type XfResult<T> = Result<T, XfError>;
