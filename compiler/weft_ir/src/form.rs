//! Top-level forms and lowered statement sequences.
//!
//! # Form Kinds
//!
//! | Variant | Produced by | Routed to |
//! |---------|-------------|-----------|
//! | `Literal`, `Symbol`, `TopRef`, `Null` | parser | interpreter |
//! | `SyntaxError`, `Incomplete` | parser | raised as syntax errors |
//! | `Module` | parser | module evaluator |
//! | `Import`, `Using`, `ImportAll`, `Export` | parser | import resolver |
//! | `Toplevel` | parser or expander | recursive splice |
//! | `Body`, `Thunk` | expander | execution selector |
//! | `Expr` | parser | expander, then re-dispatched |
//!
//! Argument lists of the toplevel-only variants are kept as raw forms: the
//! evaluator validates their shape and raises syntax errors on malformed input.

use std::sync::Arc;

use crate::Name;

/// Identifier of a label inside one statement sequence.
pub type LabelId = u32;

/// Literal constant.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// Head tag of a catch-all expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Head {
    /// `(f args...)`: the first argument is the callee.
    Call,
    /// `(= name value)`
    Assign,
    /// `(const name value)`
    Const,
    /// A sequence of forms, also used as a module body.
    Block,
    /// `(method name (args...) (sparams...) body)`
    Method,
    /// `(abstract name super)`
    Abstract,
    /// `(struct name super)`: a concrete type.
    Struct,
    /// Type-of query that only the compiler can answer.
    StaticTypeof,
    /// Any other head the expander understands.
    Custom(Name),
}

/// One statement of a lowered body.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// Plain statement; its value becomes the body's value when it is last.
    Expr(Form),
    /// Jump target.
    Label(LabelId),
    /// Unconditional jump.
    Goto(LabelId),
    /// Jump when `cond` evaluates to false.
    GotoIfNot { cond: Form, target: LabelId },
}

/// Deferred unit of code awaiting interpretation or compilation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Thunk {
    /// Lowered statements.
    pub body: Vec<Stmt>,
    /// Variables captured from enclosing scopes.
    pub captures: Vec<Name>,
    /// Local variables declared by the unit.
    pub locals: Vec<Name>,
}

impl Thunk {
    /// Create a thunk with no captures and no locals.
    pub fn new(body: Vec<Stmt>) -> Self {
        Thunk {
            body,
            captures: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Wrap a single expression so it can be handed to the compiler.
    pub fn wrap(form: Form) -> Self {
        Self::new(vec![Stmt::Expr(form)])
    }

    /// Whether the unit closes over variables of an enclosing scope.
    #[inline]
    pub fn captures_outer(&self) -> bool {
        !self.captures.is_empty()
    }
}

/// One parsed or expanded top-level form.
#[derive(Clone, Debug, PartialEq)]
pub enum Form {
    Literal(Literal),
    Symbol(Name),
    /// Name resolved against the base-relative module instead of the
    /// current one.
    TopRef(Name),
    Null,
    /// Parser error form; evaluating it raises a syntax error.
    SyntaxError(String),
    /// Incomplete input reported by the parser.
    Incomplete(String),
    /// `[std_imports, name, body]`
    Module(Vec<Form>),
    /// Path segments; `.` symbols are parent-hop markers.
    Import(Vec<Form>),
    Using(Vec<Form>),
    ImportAll(Vec<Form>),
    /// Names to export from the current module.
    Export(Vec<Form>),
    /// Splice of several top-level forms.
    Toplevel(Vec<Form>),
    /// Lowered statement sequence.
    Body(Vec<Stmt>),
    Thunk(Arc<Thunk>),
    Expr { head: Head, args: Vec<Form> },
}

impl Form {
    /// Build a call expression.
    pub fn call(callee: Form, args: impl IntoIterator<Item = Form>) -> Self {
        let mut all = vec![callee];
        all.extend(args);
        Form::Expr {
            head: Head::Call,
            args: all,
        }
    }

    /// Build a block of forms.
    pub fn block(forms: Vec<Form>) -> Self {
        Form::Expr {
            head: Head::Block,
            args: forms,
        }
    }

    /// Build a module declaration with the usual three parts.
    pub fn module(std_imports: bool, name: Name, body: Vec<Form>) -> Self {
        Form::Module(vec![
            Form::Literal(Literal::Bool(std_imports)),
            Form::Symbol(name),
            Form::block(body),
        ])
    }

    /// Build an integer literal.
    pub fn int(value: i64) -> Self {
        Form::Literal(Literal::Int(value))
    }

    /// The symbol's name, if this form is a plain symbol.
    #[inline]
    pub fn as_symbol(&self) -> Option<Name> {
        match self {
            Form::Symbol(name) => Some(*name),
            _ => None,
        }
    }

    /// Whether the expander has already run on this form.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        matches!(self, Form::Body(_) | Form::Thunk(_))
    }

    /// Forms that are only meaningful at top level.
    pub fn is_toplevel_only(&self) -> bool {
        matches!(
            self,
            Form::Module(_)
                | Form::Import(_)
                | Form::Using(_)
                | Form::ImportAll(_)
                | Form::Export(_)
                | Form::Toplevel(_)
        )
    }

    /// Forms simple enough to skip expansion entirely.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self,
            Form::Literal(_)
                | Form::Symbol(_)
                | Form::TopRef(_)
                | Form::Null
                | Form::SyntaxError(_)
                | Form::Incomplete(_)
        )
    }
}
