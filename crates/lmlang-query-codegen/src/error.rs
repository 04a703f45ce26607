//! Codegen error types covering all compilation and execution failure modes.

use thiserror::Error;

/// Errors that can occur while building, optimizing, or running a compiled
/// query.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// LLVM API failure (builder errors, module verification).
    #[error("LLVM error: {0}")]
    LlvmError(String),

    /// The built module failed `Module::verify`.
    #[error("module verification failed: {0}")]
    LlvmVerificationFailed(String),

    /// The JIT execution engine could not be created for the module.
    #[error("failed to initialize JIT engine: {0}")]
    JitInitFailed(String),

    /// `get_function` could not resolve the compiled entry point.
    #[error("compiled symbol '{0}' not found in JIT module")]
    SymbolNotFound(String),

    /// A `Query` referenced a column the bound table does not have.
    #[error("column '{0}' is bound by the query but missing from the table")]
    MissingColumn(String),
}
