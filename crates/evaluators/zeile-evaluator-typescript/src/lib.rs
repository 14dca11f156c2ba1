//! TypeScript function evaluator.
//!
//! Story programs embed script functions as string literals. Each one is
//! type-checked and translated to JavaScript by a [`Transpiler`], and the
//! result is kept by the function's mangled name (see [`mangle`]).

pub mod evaluator;
pub mod mangle;
pub mod transpiler;

pub use evaluator::FunctionEvaluator;
pub use transpiler::{ScriptDiagnostic, Transpiled, Transpiler, TscConfig, TscTranspiler};

/// Declarations scripts are compiled against: the global types the
/// compiler needs plus the story API.
pub const STANDARD_LIBRARY: &str = include_str!("../lib/zeile.d.ts");
