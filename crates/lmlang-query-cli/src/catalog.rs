//! The built-in, in-memory table catalog.
//!
//! Stands in for the external catalog contract declared in
//! `lmlang_query_core::contracts::Catalog`. There is exactly one table,
//! "demo", populated once at startup and never mutated afterward.

use lmlang_query_core::{Catalog, Column, Table};

/// Row count of the built-in demo table, matching the original's "small
/// table (20 entries per column)".
const DEMO_ROWS: usize = 20;

/// Holds every table loaded into the current session.
pub struct InMemoryCatalog {
    tables: Vec<Table>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        InMemoryCatalog { tables: Vec::new() }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for InMemoryCatalog {
    fn load_demo(&mut self) -> Table {
        let a: Vec<f64> = (1..=DEMO_ROWS).map(|i| i as f64).collect();
        let b: Vec<f64> = (1..=DEMO_ROWS).map(|i| (i * 10) as f64).collect();
        let table = Table::new("demo", vec![Column::new("a", a), Column::new("b", b)])
            .expect("two columns of equal length are always a valid table");
        self.tables.push(table.clone());
        table
    }

    fn tables(&self) -> Vec<&Table> {
        self.tables.iter().collect()
    }
}
