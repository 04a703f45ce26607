//! The loop driver: assembles the CFG skeleton and the expression lowerer
//! into one compiled function per query.
//!
//! Grounded on the teacher's `compile_function` in the deleted
//! `codegen.rs` (fresh-`Context`-per-compile pattern, `FunctionValue`
//! creation, parameter typing), generalized from lmlang's generic
//! `ProgramGraph` traversal down to this crate's single fixed
//! three-parameter signature, matching the original's
//! `typedef lng (*fptr)(double*, double**, lng)`.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::FunctionValue;
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use lmlang_query_core::Query;

use crate::cfg::{self, CodegenEnv};
use crate::error::CodegenError;
use crate::lower::lower_operation;

/// Return value signaling that the select expression produced `+inf` for
/// some row. The whole query is discarded when this is returned -- see
/// [`crate::runtime_shim`].
pub const OVERFLOW_CODE: i64 = 1;

/// Builds the `loop` function for `query` inside `module`.
///
/// Signature: `extern "C" fn(result: *mut f64, inputs: *const *const f64,
/// size: i64) -> i64`. `inputs[i]` is the base pointer of the column bound
/// at `query.columns[i]`.
pub fn compile_query<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    entry_function: &str,
    query: &Query,
) -> Result<FunctionValue<'ctx>, CodegenError> {
    let builder = context.create_builder();

    let i64_type = context.i64_type();
    let f64_type = context.f64_type();
    let ptr_type = context.ptr_type(AddressSpace::default());

    let fn_type = i64_type.fn_type(&[ptr_type.into(), ptr_type.into(), i64_type.into()], false);
    let function = module.add_function(entry_function, fn_type, None);
    let result_param = function.get_nth_param(0).unwrap().into_pointer_value();
    let inputs_param = function.get_nth_param(1).unwrap().into_pointer_value();
    let size_param = function.get_nth_param(2).unwrap().into_int_value();

    let has_where = query.where_clause.is_some();
    let blocks = cfg::build_blocks(context, function, has_where);
    let mut env = CodegenEnv::new();

    // entry: bind column pointers, allocate counters.
    builder.position_at_end(blocks.entry);
    let index_ptr = builder
        .build_alloca(i64_type, "index")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    builder
        .build_store(index_ptr, i64_type.const_int(0, false))
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    let result_index_ptr = if has_where {
        let p = builder
            .build_alloca(i64_type, "result_index")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
        builder
            .build_store(p, i64_type.const_int(0, false))
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
        Some(p)
    } else {
        None
    };

    for (i, name) in query.columns.iter().enumerate() {
        let slot = unsafe {
            builder
                .build_gep(
                    ptr_type,
                    inputs_param,
                    &[i64_type.const_int(i as u64, false)],
                    "input_slot",
                )
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?
        };
        let column_ptr = builder
            .build_load(ptr_type, slot, "column_ptr")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?
            .into_pointer_value();
        env.column_ptrs.insert(name.clone(), column_ptr);
    }

    builder
        .build_unconditional_branch(blocks.condition)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    // condition: index < size, else end.
    builder.position_at_end(blocks.condition);
    let index_val = builder
        .build_load(i64_type, index_ptr, "index_val")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?
        .into_int_value();
    let in_bounds = builder
        .build_int_compare(IntPredicate::SLT, index_val, size_param, "in_bounds")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    let after_condition = blocks.body_condition.unwrap_or(blocks.body_main);
    builder
        .build_conditional_branch(in_bounds, after_condition, blocks.end)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    // body_condition: lower the where-clause, branch on it.
    if let Some(body_condition) = blocks.body_condition {
        builder.position_at_end(body_condition);
        let index_val = builder
            .build_load(i64_type, index_ptr, "index_val")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?
            .into_int_value();
        let where_clause = query
            .where_clause
            .as_ref()
            .expect("body_condition only built when where_clause is Some");
        let cond = lower_operation(&builder, context, &env, where_clause, index_val)?
            .into_int_value();
        builder
            .build_conditional_branch(cond, blocks.body_main, blocks.increment)
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    }

    // body_main: lower select, guard against +inf overflow.
    builder.position_at_end(blocks.body_main);
    let index_val = builder
        .build_load(i64_type, index_ptr, "index_val")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?
        .into_int_value();
    let select_val = lower_operation(&builder, context, &env, &query.select, index_val)?
        .into_float_value();
    let positive_infinity = f64_type.const_float(f64::INFINITY);
    let is_overflow = builder
        .build_float_compare(FloatPredicate::OEQ, select_val, positive_infinity, "is_overflow")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    builder
        .build_conditional_branch(is_overflow, blocks.overflow_error, blocks.body_store)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    // body_store: write the select result, advance result_index if filtering.
    builder.position_at_end(blocks.body_store);
    let store_index_ptr = result_index_ptr.unwrap_or(index_ptr);
    let store_index_val = builder
        .build_load(i64_type, store_index_ptr, "store_index")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?
        .into_int_value();
    let result_slot = unsafe {
        builder
            .build_gep(f64_type, result_param, &[store_index_val], "result_slot")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?
    };
    builder
        .build_store(result_slot, select_val)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    if let Some(result_index_ptr) = result_index_ptr {
        let next = builder
            .build_int_add(store_index_val, i64_type.const_int(1, false), "next_result_index")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
        builder
            .build_store(result_index_ptr, next)
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    }
    builder
        .build_unconditional_branch(blocks.increment)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    // overflow_error: bail out immediately.
    builder.position_at_end(blocks.overflow_error);
    builder
        .build_return(Some(&i64_type.const_int(OVERFLOW_CODE as u64, false)))
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    // increment: index += 1, loop back.
    builder.position_at_end(blocks.increment);
    let index_val = builder
        .build_load(i64_type, index_ptr, "index_val")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?
        .into_int_value();
    let next_index = builder
        .build_int_add(index_val, i64_type.const_int(1, false), "next_index")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    builder
        .build_store(index_ptr, next_index)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    builder
        .build_unconditional_branch(blocks.condition)
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    // end: return the row count.
    builder.position_at_end(blocks.end);
    let final_index_ptr = result_index_ptr.unwrap_or(index_ptr);
    let final_count = builder
        .build_load(i64_type, final_index_ptr, "final_count")
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
    builder
        .build_return(Some(&final_count))
        .map_err(|e| CodegenError::LlvmError(e.to_string()))?;

    module
        .verify()
        .map_err(|e| CodegenError::LlvmVerificationFailed(e.to_string()))?;

    Ok(function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmlang_query_core::{BinOpKind, Operation};

    #[test]
    fn compiles_select_only_query_without_where() {
        let context = Context::create();
        let module = context.create_module("test");
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::bin_op(BinOpKind::Mul, Operation::column_ref("a"), Operation::Constant(2.0)),
            where_clause: None,
        };
        let function = compile_query(&context, &module, "loop", &query).unwrap();
        assert_eq!(function.get_name().to_str().unwrap(), "loop");
        assert!(module.verify().is_ok());
    }

    #[test]
    fn compiles_query_with_where_clause() {
        let context = Context::create();
        let module = context.create_module("test");
        let query = Query {
            columns: vec!["a".to_string(), "b".to_string()],
            select: Operation::bin_op(BinOpKind::Add, Operation::column_ref("a"), Operation::column_ref("b")),
            where_clause: Some(Operation::bin_op(BinOpKind::Gt, Operation::column_ref("a"), Operation::Constant(0.0))),
        };
        let function = compile_query(&context, &module, "loop", &query).unwrap();
        assert!(module.verify().is_ok());
        assert_eq!(function.count_basic_blocks(), 8);
    }

    #[test]
    fn compiles_query_without_where_omits_body_condition_block() {
        let context = Context::create();
        let module = context.create_module("test");
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::column_ref("a"),
            where_clause: None,
        };
        let function = compile_query(&context, &module, "loop", &query).unwrap();
        assert_eq!(function.count_basic_blocks(), 7);
    }

    #[test]
    fn rejects_unbound_column_reference() {
        let context = Context::create();
        let module = context.create_module("test");
        let query = Query {
            columns: vec!["a".to_string()],
            select: Operation::column_ref("nope"),
            where_clause: None,
        };
        let result = compile_query(&context, &module, "loop", &query);
        assert!(matches!(result, Err(CodegenError::MissingColumn(_))));
    }
}
