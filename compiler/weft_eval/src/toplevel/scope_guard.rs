//! RAII guard for entering a module.
//!
//! [`ModuleScope`] switches the session into a new module and restores the
//! previous context when dropped, so every exit path out of a module body
//! (success, an error propagated with `?`, or unwinding) leaves the caller
//! in the module it started in.
//!
//! # Design
//!
//! The guard holds `&mut Toplevel` and implements `Deref`/`DerefMut`, so the
//! body is evaluated through the guard like through the session itself.
//!
//! While the guard is alive the new module is registered as a collector
//! root. A guard dropped without [`ModuleScope::complete`] also discards
//! every initializer queued since it was created: modules finished inside a
//! failed body never get initialized.
//!
//! ```text
//! let mut scope = toplevel.enter_module(module);
//! for form in body {
//!     scope.eval_form(form, true)?;
//! }
//! scope.complete();
//! ```

use std::ops::{Deref, DerefMut};

use weft_runtime::{ModuleId, RootMark, Value};

use super::Toplevel;
use crate::context::EvalContext;

/// Guard that restores the module context on drop.
pub struct ModuleScope<'a> {
    toplevel: &'a mut Toplevel,
    saved: EvalContext,
    roots: RootMark,
    pending: usize,
    completed: bool,
}

impl ModuleScope<'_> {
    /// Mark the body as finished; queued initializers are kept.
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for ModuleScope<'_> {
    fn drop(&mut self) {
        self.toplevel.ctx = self.saved;
        self.toplevel.rt.roots.release(self.roots);
        if !self.completed {
            self.toplevel.pending_init.truncate(self.pending);
        }
    }
}

impl Deref for ModuleScope<'_> {
    type Target = Toplevel;

    fn deref(&self) -> &Self::Target {
        self.toplevel
    }
}

impl DerefMut for ModuleScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.toplevel
    }
}

impl Toplevel {
    /// Make `module` the current and task module until the guard drops.
    pub fn enter_module(&mut self, module: ModuleId) -> ModuleScope<'_> {
        let saved = self.ctx;
        let roots = self.rt.roots.mark();
        self.rt.roots.push(Value::Module(module));
        let pending = self.pending_init.len();
        self.ctx = EvalContext::at(module);
        ModuleScope {
            toplevel: self,
            saved,
            roots,
            pending,
            completed: false,
        }
    }
}
