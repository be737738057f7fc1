//! The runtime state every top-level form reads and mutates.
//!
//! `Runtime` bundles the module arena, the type and function tables, the root
//! set, and the diagnostic sink, plus the handful of process-wide module
//! identities: the root module, `Core`, and the current and previous standard
//! library module.
//!
//! The store-level operations in [`ModuleStore`] report outcomes as plain
//! enums; the wrappers here turn them into `EvalError`s and warnings with
//! readable names.

use weft_ir::{Name, SharedInterner};

use crate::diagnostics::{DiagnosticSink, WarningKind};
use crate::errors::{
    constant_redefinition, imported_assignment, undefined_variable, ErrorCategory, EvalError,
    EvalErrorKind,
};
use crate::functions::{FunctionId, FunctionTable};
use crate::roots::RootSet;
use crate::store::{ImportOutcome, ModuleId, ModuleStore, WriteError};
use crate::types::{TypeId, TypeTable};
use crate::value::Value;

/// Names of the modules created at startup.
#[derive(Clone, Debug)]
pub struct RuntimeNames {
    pub root: String,
    pub core: String,
}

impl Default for RuntimeNames {
    fn default() -> Self {
        RuntimeNames {
            root: "Main".to_string(),
            core: "Core".to_string(),
        }
    }
}

/// Runtime exception types cached by name from the standard library.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WellKnown {
    ErrorException,
    TypeError,
    MethodError,
    LoadError,
    WeakRef,
}

impl WellKnown {
    pub const ALL: [WellKnown; 5] = [
        WellKnown::ErrorException,
        WellKnown::TypeError,
        WellKnown::MethodError,
        WellKnown::LoadError,
        WellKnown::WeakRef,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WellKnown::ErrorException => "ErrorException",
            WellKnown::TypeError => "TypeError",
            WellKnown::MethodError => "MethodError",
            WellKnown::LoadError => "LoadError",
            WellKnown::WeakRef => "WeakRef",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// All mutable runtime state.
pub struct Runtime {
    pub interner: SharedInterner,
    pub modules: ModuleStore,
    pub types: TypeTable,
    pub functions: FunctionTable,
    pub roots: RootSet,
    diagnostics: DiagnosticSink,
    root: ModuleId,
    core: ModuleId,
    stdlib: Option<ModuleId>,
    old_stdlib: Option<ModuleId>,
    well_known: [Option<TypeId>; 5],
    location: (Name, u32),
}

impl Runtime {
    /// Create the root module and `Core`, and bind the builtin types in `Core`.
    ///
    /// The root module uses `Core`, so builtin type names resolve there.
    pub fn new(interner: SharedInterner, names: &RuntimeNames, diagnostics: DiagnosticSink) -> Self {
        let mut modules = ModuleStore::new();
        let root_name = interner.intern(&names.root);
        let core_name = interner.intern(&names.core);
        let root = modules.create(root_name, None);
        let core = modules.create(core_name, Some(root));

        let types = TypeTable::new(&interner, core);
        let mut rt = Runtime {
            interner,
            modules,
            types,
            functions: FunctionTable::new(),
            roots: RootSet::new(),
            diagnostics,
            root,
            core,
            stdlib: None,
            old_stdlib: None,
            well_known: [None; 5],
            location: (Name::EMPTY, 0),
        };

        // Fresh modules cannot refuse these writes.
        let _ = rt.modules.set_const(root, core_name, Value::Module(core));
        let _ = rt.modules.set_global(core, root_name, Value::Module(root));
        let builtins: Vec<(Name, TypeId)> = rt.types.iter().map(|(id, t)| (t.name, id)).collect();
        for (name, id) in builtins {
            let _ = rt.modules.set_const(core, name, Value::data_type(id));
            rt.modules.export(core, name);
        }
        rt.modules.using(root, core);
        rt
    }

    #[inline]
    pub fn root(&self) -> ModuleId {
        self.root
    }

    #[inline]
    pub fn core(&self) -> ModuleId {
        self.core
    }

    /// The current standard library module, once one has been declared.
    #[inline]
    pub fn stdlib(&self) -> Option<ModuleId> {
        self.stdlib
    }

    /// The standard library module that the last swap replaced.
    #[inline]
    pub fn old_stdlib(&self) -> Option<ModuleId> {
        self.old_stdlib
    }

    #[inline]
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    /// Emit a non-fatal warning.
    pub fn warn(&self, kind: WarningKind, message: impl Into<String>) {
        self.diagnostics.warn(kind, message);
    }

    /// String for an interned name.
    #[inline]
    pub fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Name of a module.
    pub fn module_name(&self, m: ModuleId) -> &'static str {
        self.name_str(self.modules.name(m))
    }

    /// Dotted path of a module from the root, e.g. `Main.A.B`.
    pub fn module_path(&self, m: ModuleId) -> String {
        let mut parts = vec![self.module_name(m)];
        let mut current = m;
        for _ in 0..self.modules.len() {
            let parent = self.modules.parent(current);
            if parent == current {
                break;
            }
            parts.push(self.module_name(parent));
            current = parent;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Install `m` as the standard library module.
    ///
    /// Records the previous one as the old standard library and drops every
    /// cached well-known type so it is looked up again in the new module. This
    /// is one step: nothing can observe the new module with stale types.
    pub fn install_stdlib(&mut self, m: ModuleId) -> Option<ModuleId> {
        self.old_stdlib = self.stdlib;
        self.stdlib = Some(m);
        self.well_known = [None; 5];
        self.old_stdlib
    }

    /// Module that top-references from `m` resolve against.
    ///
    /// During bootstrap there may be no standard library yet, and code inside
    /// `Core` or the previous standard library keeps referring to itself.
    pub fn base_relative_to(&self, m: ModuleId) -> ModuleId {
        match self.stdlib {
            Some(stdlib) if m != self.core && Some(m) != self.old_stdlib => stdlib,
            _ => m,
        }
    }

    /// A well-known type from the current standard library, looked up once.
    pub fn well_known_type(&mut self, which: WellKnown) -> Option<TypeId> {
        if let Some(cached) = self.well_known[which.slot()] {
            return Some(cached);
        }
        let stdlib = self.stdlib?;
        let name = self.intern(which.name());
        let found = self.modules.global(stdlib, name)?.as_data_family()?;
        self.well_known[which.slot()] = Some(found);
        Some(found)
    }

    /// The standard library type that names `err`, if the library defines
    /// one. Load errors are named by their own kind, not their cause.
    pub fn exception_type(&mut self, err: &EvalError) -> Option<TypeId> {
        let which = match (&err.kind, err.category()) {
            (_, ErrorCategory::Load) => WellKnown::LoadError,
            (_, ErrorCategory::Type) => WellKnown::TypeError,
            (EvalErrorKind::NotCallable { .. }, _) => WellKnown::MethodError,
            _ => WellKnown::ErrorException,
        };
        self.well_known_type(which)
    }

    /// Whether `which` is currently cached (not yet invalidated).
    pub fn is_well_known_cached(&self, which: WellKnown) -> bool {
        self.well_known[which.slot()].is_some()
    }

    /// Create a module under `parent`. Every module except `Core` itself
    /// starts out using `Core`.
    pub fn create_module(&mut self, name: Name, parent: ModuleId) -> ModuleId {
        let m = self.modules.create(name, Some(parent));
        self.modules.using(m, self.core);
        m
    }

    /// File and line of the form being evaluated.
    #[inline]
    pub fn location(&self) -> (Name, u32) {
        self.location
    }

    pub fn set_location(&mut self, file: Name, line: u32) {
        self.location = (file, line);
    }

    /// `file:line` for diagnostics.
    pub fn describe_location(&self, file: Name, line: u32) -> String {
        let file = if file == Name::EMPTY {
            "none"
        } else {
            self.name_str(file)
        };
        format!("{file}:{line}")
    }

    // Globals

    /// Value of a global as seen from `m`, if defined.
    pub fn global(&mut self, m: ModuleId, name: Name) -> Option<Value> {
        self.modules.global(m, name)
    }

    /// Value of a global, or an undefined-variable error.
    pub fn eval_global(&mut self, m: ModuleId, name: Name) -> Result<Value, EvalError> {
        self.global(m, name)
            .ok_or_else(|| undefined_variable(self.name_str(name)))
    }

    pub fn set_global(&mut self, m: ModuleId, name: Name, value: Value) -> Result<(), EvalError> {
        self.modules
            .set_global(m, name, value)
            .map_err(|e| self.write_error(m, name, e))
    }

    pub fn set_const(&mut self, m: ModuleId, name: Name, value: Value) -> Result<(), EvalError> {
        self.modules
            .set_const(m, name, value)
            .map_err(|e| self.write_error(m, name, e))
    }

    /// Bind a constant, overwriting any previous value, and return the
    /// replaced value.
    pub fn replace_const(
        &mut self,
        m: ModuleId,
        name: Name,
        value: Value,
    ) -> Result<Option<Value>, EvalError> {
        self.modules
            .replace_const(m, name, value)
            .map_err(|e| self.write_error(m, name, e))
    }

    pub fn mark_constant(&mut self, m: ModuleId, name: Name) -> Result<(), EvalError> {
        self.modules
            .mark_constant(m, name)
            .map_err(|e| self.write_error(m, name, e))
    }

    fn write_error(&self, m: ModuleId, name: Name, error: WriteError) -> EvalError {
        let name_str = self.name_str(name);
        match error {
            WriteError::Constant => constant_redefinition(name_str),
            WriteError::Imported { owner } => {
                imported_assignment(name_str, self.module_name(owner), self.module_name(m))
            }
        }
    }

    /// Register a primitive operation under `name` in `m` and export it.
    pub fn define_intrinsic(&mut self, m: ModuleId, name: &str) -> Result<(), EvalError> {
        let name = self.intern(name);
        self.set_const(m, name, Value::Intrinsic(name))?;
        self.modules.export(m, name);
        Ok(())
    }

    // Import tables

    /// `export name` in `m`.
    pub fn export(&mut self, m: ModuleId, name: Name) {
        self.modules.export(m, name);
    }

    /// `using from` in `to`.
    pub fn using(&mut self, to: ModuleId, from: ModuleId) {
        self.modules.using(to, from);
    }

    /// Explicit `import from.name` into `to`.
    pub fn import(&mut self, to: ModuleId, from: ModuleId, name: Name) {
        let outcome = self.modules.import(to, from, name, true);
        self.report_import(to, from, name, outcome);
    }

    /// Single-name `using from.name` into `to`.
    pub fn use_name(&mut self, to: ModuleId, from: ModuleId, name: Name) {
        let outcome = self.modules.import(to, from, name, false);
        self.report_import(to, from, name, outcome);
    }

    /// `importall from` into `to`. Exported names that are still unassigned
    /// are skipped silently.
    pub fn import_all(&mut self, to: ModuleId, from: ModuleId) {
        for (name, outcome) in self.modules.import_all(to, from) {
            if outcome == ImportOutcome::Conflict {
                self.report_import(to, from, name, outcome);
            }
        }
    }

    fn report_import(&self, to: ModuleId, from: ModuleId, name: Name, outcome: ImportOutcome) {
        let (kind, verb) = match outcome {
            ImportOutcome::Imported => return,
            ImportOutcome::Missing => (WarningKind::ImportMissing, "could not import"),
            ImportOutcome::Conflict => (WarningKind::ImportConflict, "ignoring conflicting import of"),
        };
        self.warn(
            kind,
            format!(
                "{verb} {}.{} into {}",
                self.module_name(from),
                self.name_str(name),
                self.module_name(to)
            ),
        );
    }

    // Types and functions

    /// Declare a family in `m`, bind its name as a constant, and give it `Any`
    /// as a provisional supertype.
    pub fn declare_type(
        &mut self,
        m: ModuleId,
        name: Name,
        parameters: Vec<std::sync::Arc<crate::value::TypeVar>>,
        is_abstract: bool,
    ) -> Result<TypeId, EvalError> {
        let id = self.types.define(name, m, parameters, is_abstract);
        let any = Value::data_type(self.types.builtins().any);
        self.types.get_mut(id).supertype = Some(any);
        self.set_const(m, name, Value::data_type(id))?;
        Ok(id)
    }

    /// Give a type its constructor generic function if it has none yet.
    pub fn materialize_constructors(&mut self, t: TypeId) -> FunctionId {
        if let Some(existing) = self.types.get(t).constructor {
            return existing;
        }
        let gf = self.functions.create(self.types.get(t).name);
        self.types.get_mut(t).constructor = Some(gf);
        gf
    }
}
