//! Weft Runtime - the state top-level evaluation operates on.
//!
//! - `ModuleStore`: module arena with binding tables, imports, and `using`
//! - `TypeTable`: data type families and their instantiation caches
//! - `FunctionTable`: generic functions and method tables
//! - `RootSet`: values kept alive across nested evaluation
//! - `DiagnosticSink`: warnings (never errors)
//! - `Runtime`: all of the above plus the root, `Core`, and standard library
//!   module identities
//!
//! Nothing in this crate evaluates code. The evaluator in `weft_eval` drives
//! these structures.

mod diagnostics;
pub mod errors;
mod functions;
mod roots;
mod runtime;
mod store;
mod types;
mod value;

pub use diagnostics::{BufferSink, DiagnosticSink, Warning, WarningKind};
pub use errors::{ErrorCategory, EvalError, EvalErrorKind, EvalResult};
pub use functions::{FunctionId, FunctionTable, GenericFunction, Lambda, Method};
pub use roots::{RootMark, RootSet};
pub use runtime::{Runtime, RuntimeNames, WellKnown};
pub use store::{Binding, BindingFlags, ImportOutcome, Module, ModuleId, ModuleStore, WriteError};
pub use types::{substitute, Builtins, DataType, Instance, TypeId, TypeTable};
pub use value::{Closure, NativeId, Ty, TypeVar, Value};
