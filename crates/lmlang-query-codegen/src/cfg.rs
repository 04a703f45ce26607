//! Basic-block skeleton for the compiled `loop` function.
//!
//! Builds the fixed block layout every compiled query shares, grounded in
//! the teacher's `emit_if_else`/`emit_loop` basic-block wiring and in the
//! literal `ExecuteQuery` block sequence it was distilled from: `entry ->
//! condition -> (body_condition ->)? body_main -> body_store -> increment
//! -> condition`, with `condition` also exiting to `end` and `body_main`
//! branching to `overflow_error` on overflow. [`crate::driver`] positions
//! the builder at each block in turn and fills it in with
//! [`crate::lower`] calls; this module only owns the block handles and the
//! per-compilation column-pointer side table.

use std::collections::HashMap;

use inkwell::basic_block::BasicBlock;
use inkwell::context::Context;
use inkwell::values::{FunctionValue, PointerValue};

/// Per-compilation codegen state that must not leak into the data model.
///
/// Maps each bound column name to the `PointerValue` of its base address
/// (`inputs[i]`), built fresh in `entry` and read by [`crate::lower`] when
/// resolving `ColumnRef`s. Dropped when `compile_query` returns.
pub struct CodegenEnv<'ctx> {
    pub column_ptrs: HashMap<String, PointerValue<'ctx>>,
}

impl<'ctx> CodegenEnv<'ctx> {
    pub fn new() -> Self {
        CodegenEnv {
            column_ptrs: HashMap::new(),
        }
    }
}

impl<'ctx> Default for CodegenEnv<'ctx> {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed block skeleton for one compiled query.
///
/// `body_condition` is only present when the query has a `where_clause`;
/// when absent, `condition` branches straight to `body_main`.
pub struct LoopBlocks<'ctx> {
    pub entry: BasicBlock<'ctx>,
    pub condition: BasicBlock<'ctx>,
    pub body_condition: Option<BasicBlock<'ctx>>,
    pub body_main: BasicBlock<'ctx>,
    pub body_store: BasicBlock<'ctx>,
    pub overflow_error: BasicBlock<'ctx>,
    pub increment: BasicBlock<'ctx>,
    pub end: BasicBlock<'ctx>,
}

/// Appends every block this query needs to `function`, in source order.
/// Does not wire branches or emit any instructions -- that is
/// [`crate::driver::compile_query`]'s job, since the branch conditions
/// depend on lowered expressions this module knows nothing about.
pub fn build_blocks<'ctx>(
    context: &'ctx Context,
    function: FunctionValue<'ctx>,
    has_where: bool,
) -> LoopBlocks<'ctx> {
    let entry = context.append_basic_block(function, "entry");
    let condition = context.append_basic_block(function, "condition");
    let body_condition = if has_where {
        Some(context.append_basic_block(function, "body_condition"))
    } else {
        None
    };
    let body_main = context.append_basic_block(function, "body_main");
    let body_store = context.append_basic_block(function, "body_store");
    let overflow_error = context.append_basic_block(function, "overflow_error");
    let increment = context.append_basic_block(function, "increment");
    let end = context.append_basic_block(function, "end");

    LoopBlocks {
        entry,
        condition,
        body_condition,
        body_main,
        body_store,
        overflow_error,
        increment,
        end,
    }
}
