//! Marshals a `Table`'s columns into the JIT'd function's expected layout,
//! invokes it, and materializes the result back into a `Table`.

use lmlang_query_core::{Column, Query, Table};

use crate::driver::OVERFLOW_CODE;
use crate::jit::LoopFn;

/// The outcome of running a compiled query once.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The select expression produced `+inf` for some row. No partial
    /// results are observable: the whole query is discarded.
    ///
    /// A legitimate row count of exactly `1` is bit-for-bit
    /// indistinguishable from this outcome in the compiled function's
    /// `i64` return value -- this is a known, unresolved ambiguity carried
    /// over unchanged from the database this crate is modeled on, not a
    /// defect introduced here. Fixing it would require changing the
    /// `loop` function's three-parameter signature, which is fixed by
    /// contract.
    Overflow,
    Rows(Table),
}

/// Runs `function` against `table`, binding `query.columns` as `inputs` in
/// order.
///
/// The result table can never have more rows than `table` does: this is a
/// filter-then-project over exactly one table with no expansion operator.
pub fn run_query(function: &LoopFn, query: &Query, table: &Table) -> Outcome {
    let row_count = table.row_count();

    let inputs: Vec<*const f64> = query
        .columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .expect("Query::validate already checked every ColumnRef resolves")
                .data
                .as_ptr()
        })
        .collect();

    let mut result = vec![0.0f64; row_count];

    let returned = unsafe { function(result.as_mut_ptr(), inputs.as_ptr(), row_count as i64) };

    if returned == OVERFLOW_CODE {
        return Outcome::Overflow;
    }

    result.truncate(returned as usize);
    Outcome::Rows(
        Table::new("Result", vec![Column::new("Result", result)])
            .expect("a single column is always self-consistent"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::compile_query;
    use crate::jit::jit_compile;
    use inkwell::context::Context;
    use lmlang_query_core::{BinOpKind, Operation};

    fn compile_and_run(query: &Query, table: &Table) -> Outcome {
        let context = Context::create();
        let module = context.create_module("test");
        compile_query(&context, &module, "loop", query).unwrap();
        let compiled = jit_compile(&module, "loop").unwrap();
        run_query(&compiled, query, table)
    }

    #[test]
    fn select_without_where_returns_every_row() {
        let table = Table::new("t", vec![Column::new("a", vec![1.0, 2.0, 3.0])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::bin_op(BinOpKind::Mul, Operation::column_ref("a"), Operation::Constant(10.0)),
            where_clause: None,
        };
        match compile_and_run(&query, &table) {
            Outcome::Rows(result) => {
                assert_eq!(result.column("Result").unwrap().data, vec![10.0, 20.0, 30.0]);
            }
            Outcome::Overflow => panic!("expected rows, got overflow"),
        }
    }

    #[test]
    fn where_clause_filters_rows() {
        let table = Table::new("t", vec![Column::new("a", vec![1.0, -2.0, 3.0, -4.0])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::column_ref("a"),
            where_clause: Some(Operation::bin_op(BinOpKind::Gt, Operation::column_ref("a"), Operation::Constant(0.0))),
        };
        match compile_and_run(&query, &table) {
            Outcome::Rows(result) => {
                assert_eq!(result.column("Result").unwrap().data, vec![1.0, 3.0]);
            }
            Outcome::Overflow => panic!("expected rows, got overflow"),
        }
    }

    #[test]
    fn where_clause_false_for_every_row_returns_zero_rows() {
        let table = Table::new("t", vec![Column::new("a", vec![1.0, 2.0])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::column_ref("a"),
            where_clause: Some(Operation::bin_op(BinOpKind::Lt, Operation::column_ref("a"), Operation::Constant(0.0))),
        };
        match compile_and_run(&query, &table) {
            Outcome::Rows(result) => assert_eq!(result.row_count(), 0),
            Outcome::Overflow => panic!("expected rows, got overflow"),
        }
    }

    #[test]
    fn where_clause_true_for_every_row_matches_no_where() {
        let table = Table::new("t", vec![Column::new("a", vec![1.0, 2.0, 3.0])]).unwrap();
        let query_filtered = Query {
            columns: vec!["a".to_string()],
            select: Operation::column_ref("a"),
            where_clause: Some(Operation::bin_op(BinOpKind::Ge, Operation::column_ref("a"), Operation::Constant(0.0))),
        };
        let query_unfiltered = Query {
            columns: vec!["a".to_string()],
            select: Operation::column_ref("a"),
            where_clause: None,
        };
        let filtered = compile_and_run(&query_filtered, &table);
        let unfiltered = compile_and_run(&query_unfiltered, &table);
        assert_eq!(filtered, unfiltered);
    }

    #[test]
    fn empty_table_returns_zero_rows() {
        let table = Table::new("t", vec![Column::new("a", vec![])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::column_ref("a"),
            where_clause: None,
        };
        match compile_and_run(&query, &table) {
            Outcome::Rows(result) => assert_eq!(result.row_count(), 0),
            Outcome::Overflow => panic!("expected rows, got overflow"),
        }
    }

    #[test]
    fn positive_infinity_select_result_reports_overflow() {
        let table = Table::new("t", vec![Column::new("a", vec![1.0, f64::MAX])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::bin_op(BinOpKind::Mul, Operation::column_ref("a"), Operation::Constant(f64::MAX)),
            where_clause: None,
        };
        assert_eq!(compile_and_run(&query, &table), Outcome::Overflow);
    }

    #[test]
    fn negative_infinity_is_not_flagged_as_overflow() {
        let table = Table::new("t", vec![Column::new("a", vec![f64::MAX])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::bin_op(BinOpKind::Mul, Operation::column_ref("a"), Operation::Constant(-f64::MAX)),
            where_clause: None,
        };
        match compile_and_run(&query, &table) {
            Outcome::Rows(result) => assert!(result.column("Result").unwrap().data[0].is_infinite()),
            Outcome::Overflow => panic!("-inf must not be flagged, only +inf is checked"),
        }
    }
}
