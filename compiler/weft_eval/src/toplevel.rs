//! The top-level driver.
//!
//! A [`Toplevel`] session owns the runtime, the collaborators, and the
//! ambient module context. It pulls forms one at a time and routes each to
//! the component that handles it:
//!
//! | Form | Handled by |
//! |------|------------|
//! | `Literal`, `Symbol`, `TopRef`, `Null` | interpreter |
//! | `SyntaxError`, `Incomplete` | raised as syntax errors |
//! | `Module` | module evaluator |
//! | `Import`, `Using`, `ImportAll`, `Export` | import resolver |
//! | `Toplevel` | each part in turn; the last value is the result |
//! | `Body`, `Thunk` | execution selector, then interpreter or compiler |
//! | `Expr` | expander, then dispatched again |
//!
//! The only context attached to errors is added by [`Toplevel::eval_all`]:
//! the source name and the line active when the failure escaped.

mod builder;
mod import;
mod module_eval;
mod natives;
mod scope_guard;

use std::path::Path;
use std::sync::Arc;

use weft_ir::{Form, FormSource, Stmt, Thunk};
use weft_runtime::{EvalResult, ModuleId, Runtime, Value};

use crate::backend::{Compiler, Expander, Interpreter, SourceParser};
use crate::config::{EvalConfig, SessionNames};
use crate::context::EvalContext;
use crate::errors::{cannot_open_file, syntax_error, EvalError};
use crate::select::{select_body, select_form};
use crate::stack::ensure_sufficient_stack;

pub use builder::ToplevelBuilder;
pub use natives::NativeFn;
pub use scope_guard::ModuleScope;

use natives::NativeTable;

/// One evaluation session.
pub struct Toplevel {
    pub rt: Runtime,
    ctx: EvalContext,
    config: EvalConfig,
    names: SessionNames,
    expander: Box<dyn Expander>,
    interpreter: Box<dyn Interpreter>,
    compiler: Box<dyn Compiler>,
    parser: Option<Box<dyn SourceParser>>,
    natives: NativeTable,
    /// Modules whose bodies finished but whose initializers have not run.
    pending_init: Vec<ModuleId>,
    /// The loader hook, once found in the standard library.
    loader: Option<Value>,
}

impl Toplevel {
    /// The ambient module context.
    #[inline]
    pub fn context(&self) -> EvalContext {
        self.ctx
    }

    /// The module new definitions land in.
    #[inline]
    pub fn current_module(&self) -> ModuleId {
        self.ctx.module
    }

    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Modules still waiting for their initializer.
    pub fn pending_initializers(&self) -> &[ModuleId] {
        &self.pending_init
    }

    /// Evaluate one form in fast mode.
    pub fn eval(&mut self, form: Form) -> EvalResult {
        self.eval_form(form, true)
    }

    /// Evaluate one form. `fast` allows loop compilation (subject to the
    /// session's `compile_loops` switch).
    pub fn eval_form(&mut self, form: Form, fast: bool) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_flex(form, fast, false))
    }

    fn eval_flex(&mut self, form: Form, fast: bool, expanded: bool) -> EvalResult {
        let module = self.ctx.module;
        match form {
            Form::Literal(_) | Form::Symbol(_) | Form::TopRef(_) | Form::Null => {
                self.interpreter.interpret(&mut self.rt, module, &form)
            }
            Form::SyntaxError(message) | Form::Incomplete(message) => Err(syntax_error(message)),
            Form::Module(args) => self.eval_module(args),
            Form::ImportAll(args) => self.eval_import_all(&args),
            Form::Using(args) => self.eval_using(&args),
            Form::Import(args) => self.eval_import(&args),
            Form::Export(args) => self.eval_export(&args),
            Form::Toplevel(forms) => {
                let mut last = Value::Nothing;
                for part in forms {
                    last = self.eval_form(part, fast)?;
                }
                Ok(last)
            }
            Form::Thunk(thunk) => self.eval_thunk(thunk, fast),
            Form::Body(body) => self.eval_body(body, fast),
            Form::Expr { .. } if !expanded => {
                let expanded_form = self.expander.expand(&mut self.rt, module, form)?;
                ensure_sufficient_stack(|| self.eval_flex(expanded_form, fast, true))
            }
            Form::Expr { .. } => {
                if select_form(&self.rt, module, &form).is_compile() {
                    self.compile_and_apply(Arc::new(Thunk::wrap(form)))
                } else {
                    self.interpreter.interpret(&mut self.rt, module, &form)
                }
            }
        }
    }

    fn eval_thunk(&mut self, thunk: Arc<Thunk>, fast: bool) -> EvalResult {
        let module = self.ctx.module;
        let compile = thunk.captures_outer()
            || select_body(&self.rt, module, &thunk.body, self.compile_loops(fast)).is_compile();
        tracing::trace!(compile, captures = thunk.captures.len(), "thunk");
        if compile {
            self.compile_and_apply(thunk)
        } else {
            self.interpreter.interpret_thunk(&mut self.rt, module, &thunk)
        }
    }

    fn eval_body(&mut self, body: Vec<Stmt>, fast: bool) -> EvalResult {
        let module = self.ctx.module;
        if select_body(&self.rt, module, &body, self.compile_loops(fast)).is_compile() {
            self.compile_and_apply(Arc::new(Thunk::new(body)))
        } else {
            self.interpreter.interpret_body(&mut self.rt, module, &body)
        }
    }

    #[inline]
    fn compile_loops(&self, fast: bool) -> bool {
        fast && self.config.compile_loops
    }

    /// Compile a unit and apply the result to no arguments.
    fn compile_and_apply(&mut self, thunk: Arc<Thunk>) -> EvalResult {
        let module = self.ctx.module;
        let mark = self.rt.roots.mark();
        let compiled = self.compiler.compile(&mut self.rt, module, thunk);
        let result = compiled.and_then(|callable| {
            self.rt.roots.push(callable.clone());
            self.compiler.apply(&mut self.rt, &callable, &[])
        });
        self.rt.roots.release(mark);
        result
    }

    /// Call `callable` with `args`. Natives run here; everything else goes to
    /// the compiler.
    pub fn call_value(&mut self, callable: &Value, args: &[Value]) -> EvalResult {
        match callable {
            Value::Native(id) => {
                let native = self.natives.get(*id)?;
                native(self, args)
            }
            _ => self.compiler.apply(&mut self.rt, callable, args),
        }
    }

    /// Evaluate every form of `source` in fast mode and return the last
    /// value.
    ///
    /// A failure is wrapped in a load error naming `name` and the line of
    /// the form that was being evaluated.
    pub fn eval_all(&mut self, name: &str, source: &mut dyn FormSource) -> EvalResult {
        let file = self.rt.intern(name);
        let saved = self.rt.location();
        let mut last = Value::Nothing;
        let result = loop {
            let Some(form) = source.next_form() else {
                break Ok(last);
            };
            let line = source.line();
            self.rt.set_location(file, line);
            match self.eval_form(form, true) {
                Ok(value) => last = value,
                Err(err) => break Err(err.in_file(name, line)),
            }
        };
        self.rt.set_location(saved.0, saved.1);
        result
    }

    /// Parse `text` with the configured parser and evaluate it.
    pub fn eval_source(&mut self, name: &str, text: &str) -> EvalResult {
        let Some(parser) = self.parser.as_mut() else {
            return Err(EvalError::new("no source parser configured"));
        };
        let mut source = parser.parse(&self.rt, name, text);
        self.eval_all(name, source.as_mut())
    }

    /// Load and evaluate a source file.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn load_file(&mut self, path: &Path) -> EvalResult {
        let shown = path.display().to_string();
        if !path.is_file() {
            return Err(cannot_open_file(shown));
        }
        if Some(self.ctx.module) == self.rt.stdlib() {
            tracing::info!(file = shown.as_str(), "loading into the standard library");
        }
        let text = std::fs::read_to_string(path).map_err(|_| cannot_open_file(shown.as_str()))?;
        self.eval_source(&shown, &text)
    }
}

#[cfg(test)]
mod tests;
