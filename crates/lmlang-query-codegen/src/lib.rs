//! JIT compilation of single-table queries into native machine code.
//!
//! This crate provides the compilation pipeline that transforms a
//! `lmlang_query_core::Query` into a native `loop` function, runs it once
//! against a `Table`'s column buffers, and materializes the result.
//!
//! # Modules
//!
//! - [`cfg`] -- the fixed basic-block skeleton every compiled query shares
//! - [`lower`] -- recursive lowering of `Operation` trees to LLVM values
//! - [`driver`] -- `compile_query`, threading `cfg` and `lower` together
//! - [`optimize`] -- the fixed 28-pass pipeline run when `-opt` is set
//! - [`jit`] -- in-process execution engine setup and symbol resolution
//! - [`runtime_shim`] -- buffer marshaling, invocation, result materialization
//! - [`error`] -- error types for all compilation and execution failure modes

pub mod cfg;
pub mod driver;
pub mod error;
pub mod jit;
pub mod lower;
pub mod optimize;
pub mod runtime_shim;

use inkwell::context::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use lmlang_query_core::{Query, Table};

pub use error::CodegenError;
pub use runtime_shim::Outcome;

/// Options controlling one query's compilation.
///
/// Trimmed down from the teacher's `lmlang_codegen::CompileOptions` to the
/// knobs this crate's pipeline actually has: `-opt` on/off, whether to emit
/// the built module's textual IR (`-no-llvm` sets this `false`), and the
/// compiled function's name (always `"loop"` per the fixed
/// `extern "C" fn(*mut f64, *const *const f64, i64) -> i64` signature, but
/// kept configurable for testing against alternate entry names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    pub optimize: bool,
    pub dump_ir: bool,
    pub entry_function: &'static str,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            optimize: false,
            dump_ir: true,
            entry_function: "loop",
        }
    }
}

/// Compiles `query`, runs it once against `table`, and returns the outcome.
///
/// Creates a fresh LLVM `Context` for this call only -- no LLVM types
/// escape the function boundary, matching the teacher's function-scoped
/// `Context` pattern in the deleted `compiler.rs`.
pub fn compile_and_run(
    query: &Query,
    table: &Table,
    options: &CompileOptions,
) -> Result<Outcome, CodegenError> {
    let context = Context::create();
    let module = context.create_module("lmlang_query");

    debug!(entry_function = options.entry_function, "building loop function");
    let function = driver::compile_query(&context, &module, options.entry_function, query)?;

    if options.optimize {
        debug!("running optimization pipeline");
        optimize::run_pipeline(&module, function)?;
    }

    if options.dump_ir {
        trace!(ir = %module.print_to_string().to_string(), "module IR before JIT");
    }

    debug!("resolving JIT function pointer");
    let compiled = jit::jit_compile(&module, options.entry_function)?;

    debug!(row_count = table.row_count(), "running compiled query");
    Ok(runtime_shim::run_query(&compiled, query, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmlang_query_core::{BinOpKind, Column, Operation};

    #[test]
    fn default_compile_options_is_unoptimized_loop() {
        let opts = CompileOptions::default();
        assert!(!opts.optimize);
        assert_eq!(opts.entry_function, "loop");
    }

    #[test]
    fn compile_options_serde_roundtrip() {
        let opts = CompileOptions {
            optimize: true,
            dump_ir: false,
            entry_function: "loop",
        };
        let json = serde_json::to_string(&opts).unwrap();
        let back: CompileOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.optimize, opts.optimize);
        assert_eq!(back.entry_function, opts.entry_function);
    }

    #[test]
    fn compile_and_run_end_to_end_without_optimization() {
        let table = Table::new("demo", vec![Column::new("a", vec![1.0, 2.0, 3.0])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::bin_op(BinOpKind::Add, Operation::column_ref("a"), Operation::Constant(1.0)),
            where_clause: None,
        };
        let outcome = compile_and_run(&query, &table, &CompileOptions::default()).unwrap();
        match outcome {
            Outcome::Rows(result) => {
                assert_eq!(result.column("Result").unwrap().data, vec![2.0, 3.0, 4.0]);
            }
            Outcome::Overflow => panic!("expected rows"),
        }
    }

    #[test]
    fn compile_and_run_end_to_end_with_optimization_matches_unoptimized() {
        let table = Table::new("demo", vec![Column::new("a", vec![5.0, -5.0, 10.0])]).unwrap();
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::bin_op(BinOpKind::Mul, Operation::column_ref("a"), Operation::Constant(2.0)),
            where_clause: Some(Operation::bin_op(BinOpKind::Gt, Operation::column_ref("a"), Operation::Constant(0.0))),
        };
        let unoptimized = compile_and_run(
            &query,
            &table,
            &CompileOptions {
                optimize: false,
                dump_ir: false,
                entry_function: "loop",
            },
        )
        .unwrap();
        let optimized = compile_and_run(
            &query,
            &table,
            &CompileOptions {
                optimize: true,
                dump_ir: false,
                entry_function: "loop",
            },
        )
        .unwrap();
        assert_eq!(unoptimized, optimized);
    }
}
