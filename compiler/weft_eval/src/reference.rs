//! A small reference backend: expander, interpreter, and compiler in one.
//!
//! The weft CLI runs on it, and the tests use it to drive the top-level
//! core end to end. It implements just enough of a language to exercise
//! every path through the driver:
//!
//! - the expander lowers `while` loops to labels and jumps, and method
//!   bodies to thunks;
//! - the interpreter walks forms directly and refuses intrinsics,
//!   `static_typeof`, and closures;
//! - the compiler does no inference: a compiled unit is a closure that runs
//!   the same walker with all of those enabled.
//!
//! Every collaborator entry point is recorded as a [`Route`], so callers can
//! check which path a form took. Clones share the route log and the print
//! handler.

mod exec;
mod expand;
mod intrinsics;
mod print;

use std::sync::Arc;

use parking_lot::Mutex;
use weft_ir::{Form, Stmt, Thunk};
use weft_runtime::{Closure, EvalError, EvalResult, ModuleId, Runtime, Value};

use crate::backend::{Compiler, Expander, Interpreter};
use exec::Exec;

pub use intrinsics::{install, INTRINSICS};
pub use print::PrintHandler;

/// A collaborator entry point the driver called.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Expand,
    Interpret,
    InterpretBody,
    InterpretThunk,
    Compile,
    Apply,
}

/// The reference backend.
#[derive(Clone, Debug, Default)]
pub struct Machine {
    print: PrintHandler,
    routes: Arc<Mutex<Vec<Route>>>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_print(mut self, print: PrintHandler) -> Self {
        self.print = print;
        self
    }

    #[inline]
    pub fn print_handler(&self) -> &PrintHandler {
        &self.print
    }

    /// Routes taken so far, oldest first.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().clone()
    }

    pub fn clear_routes(&self) {
        self.routes.lock().clear();
    }

    fn record(&self, route: Route) {
        self.routes.lock().push(route);
    }
}

impl Expander for Machine {
    fn expand(&mut self, rt: &mut Runtime, _module: ModuleId, form: Form) -> Result<Form, EvalError> {
        self.record(Route::Expand);
        expand::expand(rt, form)
    }
}

impl Interpreter for Machine {
    fn interpret(&mut self, rt: &mut Runtime, module: ModuleId, form: &Form) -> EvalResult {
        self.record(Route::Interpret);
        Exec::new(rt, module, false, &self.print).eval(form)
    }

    fn interpret_body(&mut self, rt: &mut Runtime, module: ModuleId, body: &[Stmt]) -> EvalResult {
        self.record(Route::InterpretBody);
        Exec::new(rt, module, false, &self.print).run(body)
    }

    fn interpret_thunk(&mut self, rt: &mut Runtime, module: ModuleId, thunk: &Thunk) -> EvalResult {
        self.record(Route::InterpretThunk);
        Exec::new(rt, module, false, &self.print)
            .declare(thunk.locals.iter().copied())
            .run(&thunk.body)
    }
}

impl Compiler for Machine {
    fn compile(&mut self, _rt: &mut Runtime, module: ModuleId, thunk: Arc<Thunk>) -> EvalResult {
        self.record(Route::Compile);
        Ok(Value::Closure(Arc::new(Closure {
            thunk,
            module,
            inferred: true,
        })))
    }

    fn apply(&mut self, rt: &mut Runtime, callable: &Value, args: &[Value]) -> EvalResult {
        self.record(Route::Apply);
        exec::apply(rt, &self.print, callable, args)
    }
}

#[cfg(test)]
mod tests;
