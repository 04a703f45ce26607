//! The fixed 28-pass optimization pipeline, run only when requested.
//!
//! The original this crate is grounded on copies this exact sequence from
//! Julia's `jitlayers.cpp`; the order is load-bearing, so it is reproduced
//! here as an explicit list of calls against `inkwell`'s legacy
//! `PassManager<FunctionValue>` rather than collapsed into an opaque
//! `"default<O2>"` New-Pass-Manager string, which would silently change
//! which passes run and in what order.

use inkwell::module::Module;
use inkwell::passes::PassManager;
use inkwell::targets::{InitializationConfig, Target, TargetMachine};
use inkwell::values::FunctionValue;

use crate::error::CodegenError;

/// Runs the full pass sequence over `function`, using `module` to build the
/// per-function pass manager (`PassManager<FunctionValue>::create` takes the
/// enclosing module, analogous to `LLVMCreateFunctionPassManagerForModule`).
///
/// Safe to call multiple times; each call creates and discards its own
/// `PassManager`.
pub fn run_pipeline<'ctx>(
    module: &Module<'ctx>,
    function: FunctionValue<'ctx>,
) -> Result<(), CodegenError> {
    Target::initialize_native(&InitializationConfig::default())
        .map_err(|e| CodegenError::LlvmError(format!("failed to initialize native target: {e}")))?;

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple)
        .map_err(|e| CodegenError::LlvmError(format!("failed to resolve target: {e}")))?;
    let target_machine = target
        .create_target_machine(
            &triple,
            "generic",
            "",
            inkwell::OptimizationLevel::Default,
            inkwell::targets::RelocMode::Default,
            inkwell::targets::CodeModel::Default,
        )
        .ok_or_else(|| CodegenError::LlvmError("failed to create target machine".to_string()))?;

    let fpm: PassManager<FunctionValue<'ctx>> = PassManager::create(module);

    // 1. target machine passes
    target_machine.add_analysis_passes(&fpm);
    // 2. CFG simplification
    fpm.add_cfg_simplification_pass();
    // 3. promote-memory-to-register
    fpm.add_promote_memory_to_register_pass();
    // 4. instruction combining
    fpm.add_instruction_combining_pass();
    // 5. scalar replacement of aggregates
    fpm.add_scalar_repl_aggregates_pass();
    // 6. SROA (SSA-aware variant)
    fpm.add_scalar_repl_aggregates_pass_ssa();
    // 7. instruction combining
    fpm.add_instruction_combining_pass();
    // 8. jump threading
    fpm.add_jump_threading_pass();
    // 9. instruction combining
    fpm.add_instruction_combining_pass();
    // 10. reassociation
    fpm.add_reassociate_pass();
    // 11. early CSE
    fpm.add_early_cse_pass();
    // 12. loop-idiom recognition
    fpm.add_loop_idiom_pass();
    // 13. loop rotation
    fpm.add_loop_rotate_pass();
    // 14. LICM
    fpm.add_licm_pass();
    // 15. loop unswitching
    fpm.add_loop_unswitch_pass();
    // 16. instruction combining
    fpm.add_instruction_combining_pass();
    // 17. induction-variable simplification
    fpm.add_ind_var_simplify_pass();
    // 18. loop deletion
    fpm.add_loop_deletion_pass();
    // 19. loop unrolling
    fpm.add_loop_unroll_pass();
    // 20. loop vectorization
    fpm.add_loop_vectorize_pass();
    // 21. instruction combining
    fpm.add_instruction_combining_pass();
    // 22. global value numbering
    fpm.add_gvn_pass();
    // 23. memcpy optimization
    fpm.add_memcpy_optimize_pass();
    // 24. sparse conditional constant propagation
    fpm.add_sccp_pass();
    // 25. instruction combining
    fpm.add_instruction_combining_pass();
    // 26. SLP vectorization
    fpm.add_slp_vectorize_pass();
    // 27. aggressive dead code elimination
    fpm.add_aggressive_dce_pass();
    // 28. instruction combining
    fpm.add_instruction_combining_pass();

    fpm.initialize();
    fpm.run_on(&function);

    Ok(())
}
