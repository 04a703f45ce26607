//! The built-in terminal table printer.
//!
//! Stands in for the external `lmlang_query_core::contracts::TablePrinter`
//! contract. Formatting is this crate's concern alone -- core and codegen
//! never print.

use lmlang_query_core::{Table, TablePrinter};

pub struct TerminalPrinter;

impl TablePrinter for TerminalPrinter {
    fn print_table(&self, table: &Table) {
        if table.columns.is_empty() {
            println!("(table \"{}\" has no columns)", table.name);
            return;
        }

        let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        println!("{}", header.join(" | "));
        println!("{}", "-".repeat(header.join(" | ").len()));

        for row in 0..table.row_count() {
            let cells: Vec<String> = table
                .columns
                .iter()
                .map(|c| format!("{}", c.data[row]))
                .collect();
            println!("{}", cells.join(" | "));
        }

        println!("({} row{})", table.row_count(), if table.row_count() == 1 { "" } else { "s" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmlang_query_core::Column;

    #[test]
    fn print_table_does_not_panic_on_empty_table() {
        let table = Table::new("empty", vec![]).unwrap();
        TerminalPrinter.print_table(&table);
    }

    #[test]
    fn print_table_does_not_panic_on_populated_table() {
        let table = Table::new("t", vec![Column::new("a", vec![1.0, 2.0])]).unwrap();
        TerminalPrinter.print_table(&table);
    }
}
