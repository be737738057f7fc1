//! Host functions callable from evaluated code.
//!
//! A native receives the whole session, so it can drive evaluation itself:
//! the loader hook loads a file through the same driver that asked for it.
//! Values only carry a [`NativeId`]; the functions live here.

use std::rc::Rc;

use weft_ir::Name;
use weft_runtime::{EvalResult, ModuleId, NativeId, Value};

use super::Toplevel;
use crate::errors::EvalError;

/// A host function.
pub type NativeFn = Rc<dyn Fn(&mut Toplevel, &[Value]) -> EvalResult>;

#[derive(Default)]
pub(super) struct NativeTable {
    fns: Vec<NativeFn>,
}

impl NativeTable {
    fn register(&mut self, f: NativeFn) -> NativeId {
        let raw = u32::try_from(self.fns.len()).unwrap_or(u32::MAX);
        self.fns.push(f);
        NativeId(raw)
    }

    pub(super) fn get(&self, id: NativeId) -> Result<NativeFn, EvalError> {
        self.fns
            .get(id.0 as usize)
            .cloned()
            .ok_or_else(|| EvalError::new(format!("unknown native function #{}", id.0)))
    }
}

impl Toplevel {
    /// Register a host function and return the value that calls it.
    pub fn register_native(
        &mut self,
        f: impl Fn(&mut Toplevel, &[Value]) -> EvalResult + 'static,
    ) -> Value {
        Value::Native(self.natives.register(Rc::new(f)))
    }

    /// Register a host function and bind it as a constant in `module`.
    pub fn define_native(
        &mut self,
        module: ModuleId,
        name: &str,
        f: impl Fn(&mut Toplevel, &[Value]) -> EvalResult + 'static,
    ) -> Result<Name, EvalError> {
        let value = self.register_native(f);
        let name = self.rt.intern(name);
        self.rt.set_const(module, name, value)?;
        Ok(name)
    }
}
