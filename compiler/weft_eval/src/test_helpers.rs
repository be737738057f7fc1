//! Fixtures for testing the top-level core.
//!
//! A [`TestSession`] is a [`Toplevel`] on the reference backend with its
//! warnings and printed output captured, plus shorthand for building forms
//! by name.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use weft_ir::{Form, Head, Literal, Name};
use weft_runtime::{BufferSink, DiagnosticSink, EvalResult, ModuleId, Value, WarningKind};

use crate::reference::{self, Machine, PrintHandler, Route};
use crate::toplevel::{Toplevel, ToplevelBuilder};

/// A session with captured warnings and output.
pub struct TestSession {
    pub toplevel: Toplevel,
    pub machine: Machine,
    pub warnings: Arc<BufferSink>,
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSession {
    pub fn new() -> Self {
        Self::with(|builder| builder)
    }

    /// Build with extra builder settings.
    ///
    /// # Panics
    /// Panics if the intrinsics cannot be installed, which only happens when
    /// `configure` shares a runtime that already has them.
    pub fn with(configure: impl FnOnce(ToplevelBuilder) -> ToplevelBuilder) -> Self {
        let machine = Machine::new().with_print(PrintHandler::buffer());
        let (sink, warnings) = DiagnosticSink::buffer();
        let builder = ToplevelBuilder::with_backend(machine.clone()).diagnostics(sink);
        let mut toplevel = configure(builder).build();
        if let Err(err) = reference::install(&mut toplevel.rt) {
            panic!("installing intrinsics: {err}");
        }
        TestSession {
            toplevel,
            machine,
            warnings,
        }
    }

    /// Build a form from the session's names and evaluate it.
    pub fn run(&mut self, build: impl FnOnce(&Self) -> Form) -> EvalResult {
        let form = build(self);
        self.toplevel.eval(form)
    }

    // Names and forms

    pub fn name(&self, s: &str) -> Name {
        self.toplevel.rt.intern(s)
    }

    pub fn sym(&self, s: &str) -> Form {
        Form::Symbol(self.name(s))
    }

    pub fn text(s: &str) -> Form {
        Form::Literal(Literal::Str(s.to_string()))
    }

    pub fn call(&self, f: &str, args: impl IntoIterator<Item = Form>) -> Form {
        Form::call(self.sym(f), args)
    }

    pub fn assign(&self, name: &str, value: Form) -> Form {
        Form::Expr {
            head: Head::Assign,
            args: vec![self.sym(name), value],
        }
    }

    pub fn custom(&self, head: &str, args: Vec<Form>) -> Form {
        Form::Expr {
            head: Head::Custom(self.name(head)),
            args,
        }
    }

    /// `(while cond body...)`
    pub fn while_loop(&self, cond: Form, body: Vec<Form>) -> Form {
        let mut args = vec![cond];
        args.extend(body);
        self.custom("while", args)
    }

    /// A module with standard imports.
    pub fn module(&self, name: &str, body: Vec<Form>) -> Form {
        Form::module(true, self.name(name), body)
    }

    /// A module without standard imports.
    pub fn bare_module(&self, name: &str, body: Vec<Form>) -> Form {
        Form::module(false, self.name(name), body)
    }

    /// Import path segments; `"."` is a parent-hop marker.
    pub fn path(&self, segments: &[&str]) -> Vec<Form> {
        segments
            .iter()
            .map(|s| {
                if *s == "." {
                    Form::Symbol(Name::DOT)
                } else {
                    self.sym(s)
                }
            })
            .collect()
    }

    pub fn import(&self, segments: &[&str]) -> Form {
        Form::Import(self.path(segments))
    }

    pub fn using(&self, segments: &[&str]) -> Form {
        Form::Using(self.path(segments))
    }

    pub fn import_all(&self, segments: &[&str]) -> Form {
        Form::ImportAll(self.path(segments))
    }

    pub fn export(&self, names: &[&str]) -> Form {
        Form::Export(names.iter().map(|n| self.sym(n)).collect())
    }

    /// `(method f (params...) () body)` with untyped parameters.
    pub fn method(&self, f: &str, params: &[&str], body: Form) -> Form {
        Form::Expr {
            head: Head::Method,
            args: vec![
                self.sym(f),
                Form::block(params.iter().map(|p| self.sym(p)).collect()),
                Form::block(Vec::new()),
                body,
            ],
        }
    }

    /// An initializer that prints `label` when it runs.
    pub fn initializer(&self, label: &str) -> Form {
        self.method("__init__", &[], self.call("println", [Self::text(label)]))
    }

    // Inspection

    /// Module reached by following `path` from the root.
    pub fn module_id(&mut self, path: &[&str]) -> Option<ModuleId> {
        let mut m = self.toplevel.rt.root();
        for segment in path {
            let name = self.name(segment);
            m = self.toplevel.rt.global(m, name)?.as_module()?;
        }
        Some(m)
    }

    /// Global `name` as seen from the module at `path`.
    pub fn global_in(&mut self, path: &[&str], name: &str) -> Option<Value> {
        let m = self.module_id(path)?;
        let name = self.name(name);
        self.toplevel.rt.global(m, name)
    }

    /// Lines printed so far.
    pub fn printed(&self) -> Vec<String> {
        self.machine
            .print_handler()
            .output()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Messages of captured warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> Vec<String> {
        self.warnings
            .of_kind(kind)
            .into_iter()
            .map(|w| w.message)
            .collect()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.machine.routes()
    }
}

impl Deref for TestSession {
    type Target = Toplevel;

    fn deref(&self) -> &Self::Target {
        &self.toplevel
    }
}

impl DerefMut for TestSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.toplevel
    }
}
