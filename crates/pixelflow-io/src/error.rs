//! Error types for grid file I/O.

use std::fmt;
use std::io;

use pixelflow_core::{BoundsError, ConfigError};

/// Errors from reading, writing, or applying a grid file.
#[derive(Debug)]
pub enum GridIoError {
    /// The underlying reader or writer failed.
    Io(io::Error),
    /// The first line is not `rows,cols`.
    MalformedHeader {
        /// The offending line.
        line: String,
    },
    /// A cell is not a non-negative integer.
    MalformedCell {
        /// Zero-based grid row.
        row: usize,
        /// Zero-based grid column.
        col: usize,
        /// The offending text.
        value: String,
    },
    /// The file holds a different number of rows than its header says.
    RowCountMismatch {
        /// Rows announced by the header.
        expected: usize,
        /// Rows found.
        got: usize,
    },
    /// A row holds a different number of cells than the header says.
    ColumnCountMismatch {
        /// Zero-based grid row.
        row: usize,
        /// Columns announced by the header.
        expected: usize,
        /// Cells found on the row.
        got: usize,
    },
    /// The grid was read but the manager rejected it.
    Config(ConfigError),
    /// A cell outside the manager's grid was queried.
    Bounds(BoundsError),
}

impl fmt::Display for GridIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MalformedHeader { line } => {
                write!(f, "malformed header '{line}' (expected 'rows,cols')")
            }
            Self::MalformedCell { row, col, value } => {
                write!(f, "malformed cell '{value}' at ({row}, {col})")
            }
            Self::RowCountMismatch { expected, got } => {
                write!(f, "expected {expected} rows, found {got}")
            }
            Self::ColumnCountMismatch { row, expected, got } => {
                write!(f, "row {row}: expected {expected} cells, found {got}")
            }
            Self::Config(e) => write!(f, "rejected grid: {e}"),
            Self::Bounds(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GridIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Bounds(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GridIoError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ConfigError> for GridIoError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<BoundsError> for GridIoError {
    fn from(e: BoundsError) -> Self {
        Self::Bounds(e)
    }
}
