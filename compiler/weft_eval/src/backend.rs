//! Contracts for the collaborators the top-level core drives.
//!
//! The core never parses, expands, interprets, or compiles on its own. It
//! decides which collaborator handles a form and keeps the module context
//! consistent around the call. Each collaborator gets the runtime and the
//! module the form is evaluated in; none of them see the evaluation context
//! itself.

use std::sync::Arc;

use weft_ir::{Form, FormSource, Stmt, Thunk};
use weft_runtime::{EvalError, EvalResult, ModuleId, Runtime, Value};

/// Macro and syntax expansion.
pub trait Expander {
    /// Expand one form into something the driver can dispatch: a splice, a
    /// thunk, a body, a toplevel-only form, or a plain expression.
    fn expand(&mut self, rt: &mut Runtime, module: ModuleId, form: Form)
        -> Result<Form, EvalError>;
}

/// The fast path: executes forms that need no intrinsics, no captured
/// variables, and (with loop compilation on) no backward branches.
pub trait Interpreter {
    fn interpret(&mut self, rt: &mut Runtime, module: ModuleId, form: &Form) -> EvalResult;

    fn interpret_body(&mut self, rt: &mut Runtime, module: ModuleId, body: &[Stmt])
        -> EvalResult;

    fn interpret_thunk(&mut self, rt: &mut Runtime, module: ModuleId, thunk: &Thunk)
        -> EvalResult;
}

/// The full path: compiles a unit with inference and applies callables.
pub trait Compiler {
    /// Compile a unit into a callable value.
    fn compile(&mut self, rt: &mut Runtime, module: ModuleId, thunk: Arc<Thunk>) -> EvalResult;

    /// Apply a callable to arguments.
    fn apply(&mut self, rt: &mut Runtime, callable: &Value, args: &[Value]) -> EvalResult;
}

/// Turns source text into a lazy stream of forms.
///
/// Parse failures are reported in-band as `Form::SyntaxError` or
/// `Form::Incomplete`, so the stream itself never fails.
pub trait SourceParser {
    fn parse(&mut self, rt: &Runtime, name: &str, text: &str) -> Box<dyn FormSource>;
}
