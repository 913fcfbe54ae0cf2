// Error types for snapshot and collaborator operations
use thiserror::Error;

/// Which part of a table a region request addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A region request outside `0..=limit` or with `start > end`.
    #[error("{axis} range {start}..{end} is out of bounds (limit {limit})")]
    OutOfBounds {
        axis: Axis,
        start: i64,
        end: i64,
        limit: usize,
    },

    #[error("markup row {row} has {found} cells, expected {expected}")]
    RaggedMarkup {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("matrix of {rows}x{columns} cannot hold {cells} cells")]
    MatrixShape {
        rows: usize,
        columns: usize,
        cells: usize,
    },

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("unrecognized image payload ({len} bytes)")]
    UnsupportedImage { len: usize },

    #[error("{0} is not available")]
    NotAvailable(String),

    #[error("snapshot task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Validates a half-open region request against the collaborator's extent.
pub fn check_range(axis: Axis, start: i64, end: i64, limit: usize) -> SnapshotResult<()> {
    if start < 0 || end < 0 || end as u64 > limit as u64 || start > end {
        return Err(SnapshotError::OutOfBounds {
            axis,
            start,
            end,
            limit,
        });
    }
    Ok(())
}
