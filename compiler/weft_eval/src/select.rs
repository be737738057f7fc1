//! Interpret-or-compile selection.
//!
//! Decides from the shape of a lowered body whether the fast interpreter can
//! run it. Two things send a body to the compiler:
//!
//! - a backward branch (a jump to a label already passed), when loop
//!   compilation is on: loops run too long to interpret profitably;
//! - a call to an intrinsic or a `static_typeof` anywhere in the body,
//!   including nested sub-expressions and jump conditions: the interpreter
//!   cannot execute either.
//!
//! Captured outer variables also force compilation, but that is decided by
//! the driver from the thunk's metadata, not from the body.
//!
//! Selection reads the runtime without touching it, so asking twice gives the
//! same answer.

use smallvec::{smallvec, SmallVec};
use weft_ir::{Form, Head, LabelId, Name, Stmt};
use weft_runtime::{ModuleId, Runtime, Value};

/// How a unit is executed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    Interpret,
    Compile,
}

impl Strategy {
    #[inline]
    pub fn is_compile(self) -> bool {
        self == Strategy::Compile
    }
}

/// Labels seen so far, sized from the largest label in the body.
struct LabelSet {
    words: SmallVec<[u64; 2]>,
}

impl LabelSet {
    fn with_max(max: LabelId) -> Self {
        LabelSet {
            words: smallvec![0; max as usize / 64 + 1],
        }
    }

    fn insert(&mut self, label: LabelId) {
        if let Some(word) = self.words.get_mut(label as usize / 64) {
            *word |= 1 << (label % 64);
        }
    }

    fn contains(&self, label: LabelId) -> bool {
        self.words
            .get(label as usize / 64)
            .is_some_and(|word| word & (1 << (label % 64)) != 0)
    }
}

/// Choose a strategy for a lowered body.
pub fn select_body(
    rt: &Runtime,
    module: ModuleId,
    body: &[Stmt],
    compile_loops: bool,
) -> Strategy {
    if compile_loops && has_backward_branch(body) {
        tracing::trace!("backward branch: compiling");
        return Strategy::Compile;
    }
    if body.iter().any(|stmt| stmt_has_intrinsics(rt, module, stmt)) {
        tracing::trace!("intrinsic call: compiling");
        return Strategy::Compile;
    }
    Strategy::Interpret
}

/// Choose a strategy for a plain expanded expression.
pub fn select_form(rt: &Runtime, module: ModuleId, form: &Form) -> Strategy {
    if has_intrinsics(rt, module, form) {
        Strategy::Compile
    } else {
        Strategy::Interpret
    }
}

/// Whether any jump in `body` targets a label that appears before it.
pub fn has_backward_branch(body: &[Stmt]) -> bool {
    let Some(max) = body
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Label(label) => Some(*label),
            _ => None,
        })
        .max()
    else {
        return false;
    };

    let mut seen = LabelSet::with_max(max);
    for stmt in body {
        match stmt {
            Stmt::Label(label) => seen.insert(*label),
            Stmt::Goto(target) | Stmt::GotoIfNot { target, .. } if seen.contains(*target) => {
                return true;
            }
            _ => {}
        }
    }
    false
}

fn stmt_has_intrinsics(rt: &Runtime, module: ModuleId, stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(form) | Stmt::GotoIfNot { cond: form, .. } => has_intrinsics(rt, module, form),
        Stmt::Label(_) | Stmt::Goto(_) => false,
    }
}

/// Whether `form` calls an intrinsic or asks for a static type anywhere.
///
/// An expression with no arguments never does.
pub fn has_intrinsics(rt: &Runtime, module: ModuleId, form: &Form) -> bool {
    let Form::Expr { head, args } = form else {
        return false;
    };
    let Some(first) = args.first() else {
        return false;
    };
    if *head == Head::StaticTypeof {
        return true;
    }
    if *head == Head::Call && is_intrinsic_callee(rt, module, first) {
        return true;
    }
    args.iter().any(|arg| has_intrinsics(rt, module, arg))
}

fn is_intrinsic_callee(rt: &Runtime, module: ModuleId, callee: &Form) -> bool {
    match callee {
        Form::Symbol(name) => is_constant_intrinsic(rt, module, *name),
        Form::TopRef(name) => is_constant_intrinsic(rt, rt.base_relative_to(module), *name),
        _ => false,
    }
}

fn is_constant_intrinsic(rt: &Runtime, module: ModuleId, name: Name) -> bool {
    rt.modules
        .peek(module, name)
        .is_some_and(|b| b.is_const() && matches!(b.value, Some(Value::Intrinsic(_))))
}
