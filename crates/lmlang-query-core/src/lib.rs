pub mod contracts;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use contracts::{Catalog, ParseError, QueryParser, TablePrinter};
pub use error::CoreError;
pub use types::{BinOpKind, Column, Operation, Query, Table};
