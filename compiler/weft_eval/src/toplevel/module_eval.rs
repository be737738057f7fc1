//! Module declarations and module initializers.

use weft_ir::{Form, Head, Literal};
use weft_runtime::{EvalResult, ModuleId, Value, WarningKind};

use super::Toplevel;
use crate::errors::{malformed_module, type_mismatch};

/// Kind of a form, for type errors about module names.
fn form_kind(form: &Form) -> &'static str {
    match form {
        Form::Literal(Literal::Int(_)) => "Int",
        Form::Literal(Literal::Float(_)) => "Float",
        Form::Literal(Literal::Str(_)) => "String",
        Form::Literal(Literal::Bool(_)) => "Bool",
        Form::Symbol(_) => "Symbol",
        Form::TopRef(_) => "TopRef",
        Form::Null => "Nothing",
        Form::Thunk(_) => "Thunk",
        Form::Body(_) => "Body",
        _ => "Expr",
    }
}

impl Toplevel {
    /// Evaluate `(module std_imports name (block ...))` in the current module.
    ///
    /// The new module is bound as a constant in the current module before its
    /// body runs, so the body can refer to it by name. Declaring over an
    /// occupied binding, module or not, replaces it with a warning; the old
    /// value stays alive for whatever still refers to it.
    pub(crate) fn eval_module(&mut self, args: Vec<Form>) -> EvalResult {
        let [std_imports, name, body]: [Form; 3] =
            args.try_into().map_err(|_| malformed_module())?;
        let std_imports = matches!(std_imports, Form::Literal(Literal::Bool(true)));
        let Form::Symbol(name) = name else {
            return Err(type_mismatch("module", "Symbol", form_kind(&name)));
        };
        let Form::Expr {
            head: Head::Block,
            args: body,
        } = body
        else {
            return Err(malformed_module());
        };

        let parent = self.ctx.module;
        let root = self.rt.root();
        let name_str = self.rt.name_str(name);
        let _span = tracing::debug_span!("module", name = name_str, forms = body.len()).entered();

        let m = self.rt.create_module(name, parent);
        if self.rt.replace_const(parent, name, Value::Module(m))?.is_some() {
            self.rt.warn(
                WarningKind::ModuleReplaced,
                format!("replacing module {name_str}"),
            );
        }

        if parent == root && name == self.names.stdlib {
            let previous = self.rt.install_stdlib(m);
            tracing::debug!(replaced = previous.is_some(), "installed standard library");
        }
        if parent == root {
            self.rt.export(root, name);
        }
        if std_imports {
            self.apply_standard_imports(m);
        }

        let mut scope = self.enter_module(m);
        for form in body {
            scope.eval_form(form, true)?;
        }
        scope.complete();

        self.pending_init.push(m);
        if self.ctx.module == root {
            self.run_initializers();
        }
        Ok(Value::Nothing)
    }

    /// `using` the standard library and `importall` its operators module.
    fn apply_standard_imports(&mut self, m: ModuleId) {
        let Some(stdlib) = self.rt.stdlib() else {
            return;
        };
        self.rt.using(m, stdlib);
        if let Some(ops) = self
            .rt
            .global(stdlib, self.names.operators)
            .as_ref()
            .and_then(Value::as_module)
        {
            self.rt.import_all(m, ops);
        }
    }

    /// Run every queued initializer, oldest first.
    ///
    /// Only a module's own initializer runs, never one it imports. A failing
    /// initializer is reported and the rest still run.
    fn run_initializers(&mut self) {
        let pending = std::mem::take(&mut self.pending_init);
        tracing::debug!(count = pending.len(), "running module initializers");
        for m in pending {
            let init = self
                .rt
                .modules
                .get(m)
                .entry(self.names.initializer)
                .filter(|b| b.owner == Some(m))
                .and_then(|b| b.value.clone());
            let Some(init) = init else {
                continue;
            };
            if let Err(err) = self.call_value(&init, &[]) {
                let path = self.rt.module_path(m);
                self.rt.warn(
                    WarningKind::InitializerFailed,
                    format!("error during initialization of module {path}: {err}"),
                );
            }
        }
    }
}
