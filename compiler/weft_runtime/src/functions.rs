//! Generic functions and their method tables.

use std::sync::Arc;

use weft_ir::{Name, Thunk};

use crate::store::ModuleId;
use crate::value::{TypeVar, Value};

/// Handle to a generic function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

/// Callable body of a method, with the metadata diagnostics need.
#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    pub arg_names: Vec<Name>,
    /// Module the method body resolves globals in.
    pub module: ModuleId,
    /// Source file the method was defined in.
    pub file: Name,
    pub line: u32,
    pub body: Arc<Thunk>,
}

impl Lambda {
    /// Name of the argument at `index`, if recorded.
    pub fn arg_name(&self, index: usize) -> Option<Name> {
        self.arg_names.get(index).copied()
    }
}

/// One implementation of a generic function.
#[derive(Clone, Debug)]
pub struct Method {
    /// Argument-type tuple; every entry is a type or a type variable.
    pub signature: Vec<Value>,
    pub static_params: Vec<Arc<TypeVar>>,
    pub lambda: Arc<Lambda>,
}

/// A named dispatch target.
#[derive(Clone, Debug)]
pub struct GenericFunction {
    pub name: Name,
    pub methods: Vec<Method>,
}

/// Arena of generic functions.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: Vec<GenericFunction>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty generic function.
    pub fn create(&mut self, name: Name) -> FunctionId {
        let raw = u32::try_from(self.functions.len()).unwrap_or(u32::MAX);
        self.functions.push(GenericFunction {
            name,
            methods: Vec::new(),
        });
        FunctionId(raw)
    }

    /// # Panics
    /// Panics on a handle from another table.
    #[inline]
    pub fn get(&self, id: FunctionId) -> &GenericFunction {
        &self.functions[id.0 as usize]
    }

    /// Add a method, replacing one with an identical signature.
    ///
    /// Returns `true` when an existing method was replaced.
    pub fn add_method(&mut self, id: FunctionId, method: Method) -> bool {
        let methods = &mut self.functions[id.0 as usize].methods;
        if let Some(existing) = methods
            .iter_mut()
            .find(|m| m.signature == method.signature)
        {
            *existing = method;
            true
        } else {
            methods.push(method);
            false
        }
    }
}
