//! Session configuration.

use weft_ir::{Name, StringInterner};
use weft_runtime::{DiagnosticSink, RuntimeNames};

/// Names and switches a [`Toplevel`](crate::Toplevel) session is built with.
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Root and `Core` module names.
    pub names: RuntimeNames,
    /// A module with this name declared in the root becomes the standard
    /// library.
    pub stdlib: String,
    /// Sub-module of the standard library that standard imports `importall`.
    pub operators: String,
    /// Global in the standard library called to load a missing module.
    pub loader: String,
    /// Per-module function run once the outermost module finishes.
    pub initializer: String,
    /// Compile bodies with backward branches when evaluating in fast mode.
    pub compile_loops: bool,
    pub diagnostics: DiagnosticSink,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            names: RuntimeNames::default(),
            stdlib: "Base".to_string(),
            operators: "Operators".to_string(),
            loader: "require".to_string(),
            initializer: "__init__".to_string(),
            compile_loops: true,
            diagnostics: DiagnosticSink::default(),
        }
    }
}

/// Configured names, interned once per session.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SessionNames {
    pub stdlib: Name,
    pub operators: Name,
    pub loader: Name,
    pub initializer: Name,
}

impl SessionNames {
    pub(crate) fn intern(config: &EvalConfig, interner: &StringInterner) -> Self {
        SessionNames {
            stdlib: interner.intern(&config.stdlib),
            operators: interner.intern(&config.operators),
            loader: interner.intern(&config.loader),
            initializer: interner.intern(&config.initializer),
        }
    }
}
