//! Core error types for lmlang-query-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! data model's invariants.

use thiserror::Error;

/// Core errors produced by the lmlang-query-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A `Table` was constructed from columns of differing lengths.
    #[error("column length mismatch: '{name}' has {found} rows, expected {expected}")]
    ColumnLengthMismatch {
        name: String,
        found: usize,
        expected: usize,
    },

    /// A `Query` bound the same column name twice.
    #[error("duplicate column binding: '{name}'")]
    DuplicateColumnBinding { name: String },

    /// A `Query` did not bind any columns.
    #[error("query must bind at least one column")]
    NoColumnsBound,

    /// An `Operation::ColumnRef` named a column not bound by the query.
    #[error("column reference to unbound column: '{name}'")]
    UnboundColumnRef { name: String },
}
