//! Centralized error constructors for the evaluator.
//!
//! Single import point for every error the top-level core raises. The
//! canonical definitions live in `weft_runtime::errors`.
//!
//! # Usage
//!
//! ```ignore
//! use weft_eval::errors::{malformed, undefined_in_path};
//! ```

pub use weft_runtime::errors::{EvalError, EvalErrorKind, EvalResult, ErrorCategory};

// Syntax Errors

pub use weft_runtime::errors::{malformed, malformed_module, syntax_error};

// Type Errors

pub use weft_runtime::errors::{invalid_argument_type, invalid_subtyping, type_mismatch};

// Name Resolution Errors

pub use weft_runtime::errors::{
    invalid_import_path, not_a_module, not_a_module_binding, undefined_in_path,
    undefined_variable,
};

// Definition Errors

pub use weft_runtime::errors::{
    constant_redefinition, extend_without_import, function_shadows_value, imported_assignment,
    not_generic_function,
};

// Load and Runtime Errors

pub use weft_runtime::errors::{cannot_open_file, not_callable};
