//! Weft IR - form and name types consumed by the top-level evaluator.
//!
//! This crate contains the data the parser and expander hand to the
//! evaluation core:
//! - `Name`: interned identifiers
//! - `StringInterner`: the table behind every `Name`
//! - `Form`: one top-level form, an exhaustive tagged variant
//! - `Stmt` / `Thunk`: lowered statement sequences with control-flow markers
//! - `FormSource`: the lazy, non-restartable stream a parser yields
//!
//! Forms are immutable once produced. The evaluator only ever replaces an
//! unexpanded form by its expanded form; it never edits one in place.

mod form;
mod interner;
mod name;
mod source;

pub use form::{Form, Head, LabelId, Literal, Stmt, Thunk};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use source::{FormSource, VecSource};
