//! Lowering of structured loops into labels and jumps.
//!
//! `(while cond body...)` becomes
//!
//! ```text
//! Label(top)
//! GotoIfNot(cond, exit)
//! body...
//! Goto(top)
//! Label(exit)
//! ```
//!
//! Top-level blocks are flattened into one statement sequence. A method body
//! is lowered into its own thunk, with every name it assigns recorded as a
//! local. A form that lowers to a single plain expression stays a plain
//! expression.

use std::sync::Arc;

use weft_ir::{Form, Head, LabelId, Name, Stmt, Thunk};
use weft_runtime::{EvalError, Runtime};

use crate::errors::malformed;

pub(super) fn expand(rt: &Runtime, form: Form) -> Result<Form, EvalError> {
    let mut lowering = Lowering::new(rt);
    lowering.lower(form)?;
    let mut stmts = lowering.stmts;
    Ok(match stmts.len() {
        0 => Form::Null,
        1 if matches!(stmts[0], Stmt::Expr(_)) => match stmts.pop() {
            Some(Stmt::Expr(form)) => form,
            _ => Form::Null,
        },
        _ => Form::Body(stmts),
    })
}

struct Lowering<'a> {
    rt: &'a Runtime,
    stmts: Vec<Stmt>,
    next_label: LabelId,
}

impl<'a> Lowering<'a> {
    fn new(rt: &'a Runtime) -> Self {
        Lowering {
            rt,
            stmts: Vec::new(),
            next_label: 0,
        }
    }

    fn label(&mut self) -> LabelId {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    fn is_head(&self, head: Head, name: &str) -> bool {
        matches!(head, Head::Custom(h) if self.rt.name_str(h) == name)
    }

    fn lower(&mut self, form: Form) -> Result<(), EvalError> {
        match form {
            Form::Expr {
                head: Head::Block,
                args,
            } => {
                for arg in args {
                    self.lower(arg)?;
                }
            }
            Form::Expr { head, args } if self.is_head(head, "while") => {
                let mut args = args.into_iter();
                let cond = args.next().ok_or_else(|| malformed("while"))?;
                let top = self.label();
                let exit = self.label();
                self.stmts.push(Stmt::Label(top));
                let cond = self.expr(cond)?;
                self.stmts.push(Stmt::GotoIfNot { cond, target: exit });
                for body in args {
                    self.lower(body)?;
                }
                self.stmts.push(Stmt::Goto(top));
                self.stmts.push(Stmt::Label(exit));
            }
            other => {
                let expr = self.expr(other)?;
                self.stmts.push(Stmt::Expr(expr));
            }
        }
        Ok(())
    }

    /// Rewrite nested method bodies inside an expression.
    fn expr(&mut self, form: Form) -> Result<Form, EvalError> {
        match form {
            Form::Expr {
                head: Head::Method,
                mut args,
            } if args.len() == 4 => {
                if let Some(body) = args.pop() {
                    args.push(Form::Thunk(Arc::new(self.method_body(body)?)));
                }
                Ok(Form::Expr {
                    head: Head::Method,
                    args,
                })
            }
            Form::Expr { head, .. } if self.is_head(head, "while") => {
                Err(EvalError::new("syntax: while loop used as a value"))
            }
            Form::Expr { head, args } => Ok(Form::Expr {
                head,
                args: args
                    .into_iter()
                    .map(|arg| self.expr(arg))
                    .collect::<Result<_, _>>()?,
            }),
            other => Ok(other),
        }
    }

    fn method_body(&mut self, body: Form) -> Result<Thunk, EvalError> {
        if let Form::Thunk(thunk) = body {
            return Ok((*thunk).clone());
        }
        let mut inner = Lowering::new(self.rt);
        inner.lower(body)?;
        let mut thunk = Thunk::new(inner.stmts);
        thunk.locals = assigned_names(&thunk.body);
        Ok(thunk)
    }
}

/// Names assigned anywhere in `body`, outside nested method bodies.
fn assigned_names(body: &[Stmt]) -> Vec<Name> {
    fn visit(form: &Form, names: &mut Vec<Name>) {
        match form {
            Form::Expr {
                head: Head::Assign,
                args,
            } => {
                if let Some(Form::Symbol(name)) = args.first() {
                    if !names.contains(name) {
                        names.push(*name);
                    }
                }
                for arg in args.iter().skip(1) {
                    visit(arg, names);
                }
            }
            Form::Expr {
                head: Head::Method, ..
            } => {}
            Form::Expr { args, .. } => {
                for arg in args {
                    visit(arg, names);
                }
            }
            _ => {}
        }
    }

    let mut names = Vec::new();
    for stmt in body {
        match stmt {
            Stmt::Expr(form) | Stmt::GotoIfNot { cond: form, .. } => visit(form, &mut names),
            Stmt::Label(_) | Stmt::Goto(_) => {}
        }
    }
    names
}
