//! Validation and installation of type and method definitions.
//!
//! A rejected definition leaves bindings, method tables and supertype links
//! as they were. The one write that can precede a rejection is materializing
//! a type's constructor function when a method extends a type binding; the
//! signature is checked after that.

mod method;
mod supertype;

pub use method::{check_static_parameter_conflicts, define_method, MethodDef, MethodSlot};
pub use supertype::set_supertype;
