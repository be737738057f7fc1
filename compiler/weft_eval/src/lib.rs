//! Weft Eval - the top-level evaluation core.
//!
//! Receives top-level forms one at a time and decides, per form, how to run
//! it and what runtime state it changes:
//!
//! - `Toplevel`: the driver; dispatches each form and keeps the current
//!   module consistent around nested evaluation
//! - module declarations and their initializers
//! - `import`, `using`, `importall`, `export`, including relative paths and
//!   autoloading through the standard library's loader hook
//! - `select`: interpret-or-compile policy for expanded units
//! - `define`: validation of method and supertype definitions
//!
//! Parsing, expansion, interpretation, and compilation are collaborators
//! behind the traits in [`backend`]. The [`reference`] module has a small
//! implementation of all three evaluation collaborators.

pub mod backend;
mod config;
mod context;
mod define;
pub mod errors;
pub mod reference;
mod select;
mod stack;
#[cfg(any(test, feature = "test-helpers"))]
#[doc(hidden)]
pub mod test_helpers;
mod toplevel;

pub use backend::{Compiler, Expander, Interpreter, SourceParser};
pub use config::EvalConfig;
pub use context::EvalContext;
pub use define::{
    check_static_parameter_conflicts, define_method, set_supertype, MethodDef, MethodSlot,
};
pub use select::{has_backward_branch, has_intrinsics, select_body, select_form, Strategy};
pub use stack::ensure_sufficient_stack;
pub use toplevel::{ModuleScope, NativeFn, Toplevel, ToplevelBuilder};
