//! Errors returned by fallible document operations.

use thiserror::Error;

/// Error returned when caller-supplied coordinates do not fit the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextDocumentError {
    /// A position or range ends past the document.
    #[error("position {position} out of range (document length {len})")]
    PositionOutOfRange {
        /// Offending position.
        position: usize,
        /// Document length at the time of the call.
        len: usize,
    },
    /// A table needs at least one row and one column.
    #[error("invalid table dimensions {rows}x{columns}")]
    InvalidTableDimensions {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        columns: usize,
    },
    /// A cell coordinate lies outside the table grid.
    #[error("cell ({row}, {column}) out of range")]
    CellOutOfRange {
        /// Row.
        row: usize,
        /// Column.
        column: usize,
    },
    /// The object is not a table.
    #[error("object {0} is not a table")]
    NotATable(usize),
    /// Cells cannot be merged as requested.
    #[error("cannot merge cells: {0}")]
    InvalidMerge(String),
}

/// Result alias for document operations.
pub type Result<T> = std::result::Result<T, TextDocumentError>;
