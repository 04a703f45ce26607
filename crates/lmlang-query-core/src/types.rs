//! The query data model: columns, tables, and operation trees.
//!
//! Every value in this crate is `f64` -- there is no type registry and no
//! nominal typing, unlike a general-purpose compiler's IR. A `Query` is built
//! once (by a parser external to this crate, see [`crate::contracts`]) and
//! handed to the codegen crate unchanged.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single densely packed column of `f64` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, data: Vec<f64>) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An ordered, named set of columns sharing one row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates a table, checking that every column has the same length.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, CoreError> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for col in &columns[1..] {
                if col.len() != expected {
                    return Err(CoreError::ColumnLengthMismatch {
                        name: col.name.clone(),
                        found: col.len(),
                        expected,
                    });
                }
            }
        }
        Ok(Table {
            name: name.into(),
            columns,
        })
    }

    /// The number of rows shared by every column. `0` for a table with no
    /// columns.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Binary operators available in `select`/`where` expressions.
///
/// Comparisons are always ordered float predicates: any operand that is NaN
/// makes the comparison `false`, mirroring IEEE 754 ordered comparison
/// semantics rather than a three-valued or unordered interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOpKind {
    Mul,
    Div,
    Add,
    Sub,
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOpKind {
    /// `true` for the arithmetic operators (`Mul`/`Div`/`Add`/`Sub`), which
    /// lower to float instructions and produce `f64`.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinOpKind::Mul | BinOpKind::Div | BinOpKind::Add | BinOpKind::Sub)
    }

    /// `true` for ordered comparisons, which produce an `i1` boolean.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOpKind::Lt
                | BinOpKind::Le
                | BinOpKind::Eq
                | BinOpKind::Ne
                | BinOpKind::Gt
                | BinOpKind::Ge
        )
    }

    /// `true` for boolean logic operators, which operate on and produce `i1`.
    pub fn is_logic(&self) -> bool {
        matches!(self, BinOpKind::And | BinOpKind::Or)
    }
}

/// An expression tree over column values and constants.
///
/// Columns are referenced by name rather than by value: the same
/// `Operation` tree can be compiled against any table that binds the names
/// it references (see [`Query::columns`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    Constant(f64),
    ColumnRef(String),
    BinOp {
        kind: BinOpKind,
        left: Box<Operation>,
        right: Box<Operation>,
    },
}

impl Operation {
    pub fn column_ref(name: impl Into<String>) -> Self {
        Operation::ColumnRef(name.into())
    }

    pub fn bin_op(kind: BinOpKind, left: Operation, right: Operation) -> Self {
        Operation::BinOp {
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// A single-table query: which columns are bound as compiler inputs, the
/// projection expression, and an optional filter expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Columns bound as `inputs[0..]`, in order. Referenced by name from
    /// `select` and `where_clause` via `Operation::ColumnRef`.
    pub columns: Vec<String>,
    pub select: Operation,
    pub where_clause: Option<Operation>,
}

impl Query {
    /// Validates the binding invariants: at least one column, no duplicate
    /// names, and every `ColumnRef` in `select`/`where_clause` resolves to a
    /// bound column.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.columns.is_empty() {
            return Err(CoreError::NoColumnsBound);
        }
        for (i, name) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(name) {
                return Err(CoreError::DuplicateColumnBinding { name: name.clone() });
            }
        }
        Self::check_refs(&self.select, &self.columns)?;
        if let Some(where_clause) = &self.where_clause {
            Self::check_refs(where_clause, &self.columns)?;
        }
        Ok(())
    }

    fn check_refs(op: &Operation, bound: &[String]) -> Result<(), CoreError> {
        match op {
            Operation::Constant(_) => Ok(()),
            Operation::ColumnRef(name) => {
                if bound.iter().any(|b| b == name) {
                    Ok(())
                } else {
                    Err(CoreError::UnboundColumnRef { name: name.clone() })
                }
            }
            Operation::BinOp { left, right, .. } => {
                Self::check_refs(left, bound)?;
                Self::check_refs(right, bound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_new_accepts_equal_length_columns() {
        let t = Table::new(
            "demo",
            vec![
                Column::new("a", vec![1.0, 2.0, 3.0]),
                Column::new("b", vec![10.0, 20.0, 30.0]),
            ],
        )
        .unwrap();
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn table_new_rejects_mismatched_lengths() {
        let result = Table::new(
            "demo",
            vec![Column::new("a", vec![1.0, 2.0]), Column::new("b", vec![10.0])],
        );
        assert!(matches!(
            result,
            Err(CoreError::ColumnLengthMismatch { .. })
        ));
    }

    #[test]
    fn table_with_no_columns_has_zero_rows() {
        let t = Table::new("empty", vec![]).unwrap();
        assert_eq!(t.row_count(), 0);
    }

    #[test]
    fn bin_op_kind_classification() {
        assert!(BinOpKind::Add.is_arithmetic());
        assert!(!BinOpKind::Add.is_comparison());
        assert!(BinOpKind::Lt.is_comparison());
        assert!(BinOpKind::And.is_logic());
        assert!(!BinOpKind::And.is_arithmetic());
    }

    #[test]
    fn query_validate_rejects_empty_columns() {
        let q = Query {
            columns: vec![],
            select: Operation::Constant(1.0),
            where_clause: None,
        };
        assert!(matches!(q.validate(), Err(CoreError::NoColumnsBound)));
    }

    #[test]
    fn query_validate_rejects_duplicate_columns() {
        let q = Query {
            columns: vec!["a".into(), "a".into()],
            select: Operation::column_ref("a"),
            where_clause: None,
        };
        assert!(matches!(
            q.validate(),
            Err(CoreError::DuplicateColumnBinding { .. })
        ));
    }

    #[test]
    fn query_validate_rejects_unbound_column_ref() {
        let q = Query {
            columns: vec!["a".into()],
            select: Operation::column_ref("b"),
            where_clause: None,
        };
        assert!(matches!(
            q.validate(),
            Err(CoreError::UnboundColumnRef { .. })
        ));
    }

    #[test]
    fn query_validate_accepts_well_formed_query() {
        let q = Query {
            columns: vec!["a".into(), "b".into()],
            select: Operation::bin_op(
                BinOpKind::Add,
                Operation::column_ref("a"),
                Operation::column_ref("b"),
            ),
            where_clause: Some(Operation::bin_op(
                BinOpKind::Gt,
                Operation::column_ref("a"),
                Operation::Constant(0.0),
            )),
        };
        assert!(q.validate().is_ok());
    }

    #[test]
    fn serde_roundtrip_query() {
        let q = Query {
            columns: vec!["a".into()],
            select: Operation::bin_op(
                BinOpKind::Mul,
                Operation::column_ref("a"),
                Operation::Constant(2.0),
            ),
            where_clause: None,
        };
        let json = serde_json::to_string(&q).unwrap();
        let back: Query = serde_json::from_str(&json).unwrap();
        let json2 = serde_json::to_string(&back).unwrap();
        assert_eq!(json, json2);
    }
}
