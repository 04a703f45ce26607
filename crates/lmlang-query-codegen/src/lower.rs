//! Expression lowering: turns an `Operation` tree into LLVM values.
//!
//! Directly modeled on `PerformOperation`'s recursive dispatch and on the
//! teacher's `emit_binary_arith`/`emit_compare`/`emit_binary_logic` per-op
//! emitters, narrowed to this crate's single value type (`f64`, with `i1`
//! for comparisons and boolean logic).

use inkwell::builder::Builder;
use inkwell::values::{BasicValueEnum, IntValue};
use inkwell::FloatPredicate;

use lmlang_query_core::{BinOpKind, Operation};

use crate::cfg::CodegenEnv;
use crate::error::CodegenError;

/// Lowers `op` to a value, using `index` (the current loop counter) to
/// address column data. Positions no new blocks; the caller's builder must
/// already be positioned in the block the expression belongs to
/// (`body_condition` or `body_main`).
pub fn lower_operation<'ctx>(
    builder: &Builder<'ctx>,
    context: &'ctx inkwell::context::Context,
    env: &CodegenEnv<'ctx>,
    op: &Operation,
    index: IntValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    match op {
        Operation::Constant(v) => Ok(context.f64_type().const_float(*v).into()),

        Operation::ColumnRef(name) => {
            let base_ptr = *env
                .column_ptrs
                .get(name)
                .ok_or_else(|| CodegenError::MissingColumn(name.clone()))?;
            let f64_type = context.f64_type();
            let elem_ptr = unsafe {
                builder
                    .build_gep(f64_type, base_ptr, &[index], "col_elem")
                    .map_err(|e| CodegenError::LlvmError(e.to_string()))?
            };
            let loaded = builder
                .build_load(f64_type, elem_ptr, "col_val")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
            Ok(loaded)
        }

        Operation::BinOp { kind, left, right } => {
            let lhs = lower_operation(builder, context, env, left, index)?;
            let rhs = lower_operation(builder, context, env, right, index)?;
            lower_bin_op(builder, *kind, lhs, rhs)
        }
    }
}

fn lower_bin_op<'ctx>(
    builder: &Builder<'ctx>,
    kind: BinOpKind,
    lhs: BasicValueEnum<'ctx>,
    rhs: BasicValueEnum<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    if kind.is_logic() {
        let lhs_int = lhs.into_int_value();
        let rhs_int = rhs.into_int_value();
        let val = match kind {
            BinOpKind::And => builder
                .build_and(lhs_int, rhs_int, "and")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?,
            BinOpKind::Or => builder
                .build_or(lhs_int, rhs_int, "or")
                .map_err(|e| CodegenError::LlvmError(e.to_string()))?,
            _ => unreachable!("is_logic() guards this match"),
        };
        return Ok(val.into());
    }

    let lhs_f = lhs.into_float_value();
    let rhs_f = rhs.into_float_value();

    if kind.is_comparison() {
        let predicate = match kind {
            BinOpKind::Lt => FloatPredicate::OLT,
            BinOpKind::Le => FloatPredicate::OLE,
            BinOpKind::Eq => FloatPredicate::OEQ,
            BinOpKind::Ne => FloatPredicate::ONE,
            BinOpKind::Gt => FloatPredicate::OGT,
            BinOpKind::Ge => FloatPredicate::OGE,
            _ => unreachable!("is_comparison() guards this match"),
        };
        let val = builder
            .build_float_compare(predicate, lhs_f, rhs_f, "cmp")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?;
        return Ok(val.into());
    }

    let val = match kind {
        BinOpKind::Mul => builder
            .build_float_mul(lhs_f, rhs_f, "fmul")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?,
        BinOpKind::Div => builder
            .build_float_div(lhs_f, rhs_f, "fdiv")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?,
        BinOpKind::Add => builder
            .build_float_add(lhs_f, rhs_f, "fadd")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?,
        BinOpKind::Sub => builder
            .build_float_sub(lhs_f, rhs_f, "fsub")
            .map_err(|e| CodegenError::LlvmError(e.to_string()))?,
        _ => unreachable!("is_arithmetic() guards this match"),
    };
    Ok(val.into())
}
