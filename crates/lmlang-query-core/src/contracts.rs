//! External contracts implemented by the CLI crate.
//!
//! lmlang-query-core owns the data model; it does not know how queries are
//! parsed from text or how tables are sourced or displayed. Those concerns
//! live behind the traits below so the codegen crate can be exercised
//! against fixtures without pulling in a parser or a terminal.

use thiserror::Error;

use crate::types::{Query, Table};

/// A failure to turn query text into a [`Query`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected token at position {position}: '{found}'")]
    UnexpectedToken { position: usize, found: String },

    #[error("unknown column: '{name}'")]
    UnknownColumn { name: String },
}

/// Turns query text into a [`Query`], or `None` when the line is not a
/// query worth reporting as an error (matches the original's silent skip
/// on a non-statement line).
pub trait QueryParser {
    fn parse(&self, text: &str) -> Result<Option<Query>, ParseError>;
}

/// Owns the in-memory tables a session can query.
pub trait Catalog {
    /// Populates and returns the built-in demo table.
    fn load_demo(&mut self) -> Table;

    fn tables(&self) -> Vec<&Table>;
}

/// Renders a table's contents, e.g. to a terminal. Left as a free-standing
/// contract rather than a method on `Table` since formatting is entirely
/// the caller's concern -- core and codegen never print.
pub trait TablePrinter {
    fn print_table(&self, table: &Table);
}
