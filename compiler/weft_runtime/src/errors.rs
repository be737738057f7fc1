//! Error types for top-level evaluation.
//!
//! # Structured Error Categories
//!
//! `EvalErrorKind` provides typed error categories. Factory functions
//! (e.g., `malformed()`) are the public API: they populate both `kind` and
//! `message`. Every kind maps onto one [`ErrorCategory`]:
//!
//! | Category | Raised for |
//! |----------|------------|
//! | Syntax | malformed module/import/using/export forms, parser error forms |
//! | Type | invalid supertypes, non-type signature entries, bad static parameters |
//! | Name | unresolved path segments, non-module path segments, undefined globals |
//! | Definition | functions shadowing values, constant and import reassignment |
//! | Load | the file driver's wrapper; carries the original as its cause |
//! | Runtime | failures reported by collaborators |
//!
//! Warnings are not errors: see [`crate::diagnostics`].

use std::fmt;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Coarse error taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    Type,
    Name,
    Definition,
    Load,
    Runtime,
}

/// Typed error category for structured diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Syntax
    Malformed {
        statement: &'static str,
    },
    MalformedModule,
    Syntax {
        message: String,
    },

    // Type
    TypeMismatch {
        context: String,
        expected: String,
        got: String,
    },
    InvalidArgumentType {
        function: String,
        argument: String,
        position: usize,
        location: String,
    },
    InvalidSubtyping {
        type_name: String,
    },

    // Name
    UndefinedInPath {
        name: String,
    },
    NotAModule {
        name: String,
    },
    InvalidImportPath,
    NotAModuleBinding {
        statement: &'static str,
    },
    UndefinedVariable {
        name: String,
    },

    // Definition
    FunctionShadowsValue {
        name: String,
    },
    NotGenericFunction {
        name: String,
    },
    ExtendWithoutImport {
        owner: String,
        name: String,
    },
    ConstantRedefinition {
        name: String,
    },
    ImportedAssignment {
        name: String,
        owner: String,
        module: String,
    },

    // Load
    Load {
        path: String,
        line: u32,
    },
    CannotOpenFile {
        path: String,
    },

    // Runtime
    NotCallable {
        kind: String,
    },
    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    /// Category of this kind.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Malformed { .. } | Self::MalformedModule | Self::Syntax { .. } => {
                ErrorCategory::Syntax
            }
            Self::TypeMismatch { .. }
            | Self::InvalidArgumentType { .. }
            | Self::InvalidSubtyping { .. } => ErrorCategory::Type,
            Self::UndefinedInPath { .. }
            | Self::NotAModule { .. }
            | Self::InvalidImportPath
            | Self::NotAModuleBinding { .. }
            | Self::UndefinedVariable { .. } => ErrorCategory::Name,
            Self::FunctionShadowsValue { .. }
            | Self::NotGenericFunction { .. }
            | Self::ExtendWithoutImport { .. }
            | Self::ConstantRedefinition { .. }
            | Self::ImportedAssignment { .. } => ErrorCategory::Definition,
            Self::Load { .. } | Self::CannotOpenFile { .. } => ErrorCategory::Load,
            Self::NotCallable { .. } | Self::Custom { .. } => ErrorCategory::Runtime,
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Syntax
            Self::Malformed { statement } => {
                write!(f, "syntax: malformed \"{statement}\" statement")
            }
            Self::MalformedModule => write!(f, "syntax: malformed module expression"),
            Self::Syntax { message } => write!(f, "syntax: {message}"),

            // Type
            Self::TypeMismatch {
                context,
                expected,
                got,
            } => write!(f, "type error: {context}: expected {expected}, got {got}"),
            Self::InvalidArgumentType {
                function,
                argument,
                position,
                location,
            } => write!(
                f,
                "invalid type for argument {argument} (position {position}) in method definition for {function} at {location}"
            ),
            Self::InvalidSubtyping { type_name } => {
                write!(f, "invalid subtyping in definition of {type_name}")
            }

            // Name
            Self::UndefinedInPath { name } => write!(f, "in module path: {name} not defined"),
            Self::NotAModule { name } => {
                write!(f, "invalid module path ({name} does not name a module)")
            }
            Self::InvalidImportPath => write!(f, "invalid import statement"),
            Self::NotAModuleBinding { statement } => write!(
                f,
                "invalid {statement} statement: name exists but does not refer to a module"
            ),
            Self::UndefinedVariable { name } => write!(f, "{name} not defined"),

            // Definition
            Self::FunctionShadowsValue { name } => {
                write!(f, "cannot define function {name}; it already has a value")
            }
            Self::NotGenericFunction { name } => write!(
                f,
                "invalid method definition for {name}: not a generic function"
            ),
            Self::ExtendWithoutImport { owner, name } => write!(
                f,
                "error in method definition: function {owner}.{name} must be explicitly imported to be extended"
            ),
            Self::ConstantRedefinition { name } => {
                write!(f, "invalid redefinition of constant {name}")
            }
            Self::ImportedAssignment {
                name,
                owner,
                module,
            } => write!(
                f,
                "cannot assign variable {owner}.{name} from module {module}"
            ),

            // Load
            Self::Load { path, line } => write!(
                f,
                "error loading {path}, in expression starting on line {line}"
            ),
            Self::CannotOpenFile { path } => write!(f, "could not open file {path}"),

            // Runtime
            Self::NotCallable { kind } => write!(f, "{kind} is not callable"),
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable error message; equals `kind.to_string()`.
    pub message: String,
    /// The failure this error wraps, if any. Only load errors carry one.
    pub cause: Option<Box<EvalError>>,
}

impl EvalError {
    /// Create an error with just a message.
    #[cold]
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(EvalErrorKind::Custom {
            message: message.into(),
        })
    }

    /// Create an error from a structured kind.
    #[cold]
    pub fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            cause: None,
        }
    }

    /// Wrap this error with the file and line active when it escaped.
    ///
    /// The file driver is the only caller: no other layer adds positional
    /// context.
    #[cold]
    #[must_use]
    pub fn in_file(self, path: impl Into<String>, line: u32) -> Self {
        let mut wrapped = Self::from_kind(EvalErrorKind::Load {
            path: path.into(),
            line,
        });
        wrapped.cause = Some(Box::new(self));
        wrapped
    }

    /// Category of this error.
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// The innermost error in the cause chain.
    pub fn root_cause(&self) -> &EvalError {
        let mut current = self;
        while let Some(cause) = &current.cause {
            current = cause;
        }
        current
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, "\n{cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

// Factory functions

/// Malformed toplevel-only statement (`"module"`, `"import"`, ...).
#[cold]
pub fn malformed(statement: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Malformed { statement })
}

#[cold]
pub fn malformed_module() -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedModule)
}

/// Parser-reported syntax error.
#[cold]
pub fn syntax_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Syntax {
        message: message.into(),
    })
}

#[cold]
pub fn type_mismatch(
    context: impl Into<String>,
    expected: impl Into<String>,
    got: impl Into<String>,
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        context: context.into(),
        expected: expected.into(),
        got: got.into(),
    })
}

#[cold]
pub fn invalid_argument_type(
    function: impl Into<String>,
    argument: impl Into<String>,
    position: usize,
    location: impl Into<String>,
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidArgumentType {
        function: function.into(),
        argument: argument.into(),
        position,
        location: location.into(),
    })
}

#[cold]
pub fn invalid_subtyping(type_name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidSubtyping {
        type_name: type_name.into(),
    })
}

#[cold]
pub fn undefined_in_path(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedInPath { name: name.into() })
}

#[cold]
pub fn not_a_module(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAModule { name: name.into() })
}

#[cold]
pub fn invalid_import_path() -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidImportPath)
}

#[cold]
pub fn not_a_module_binding(statement: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAModuleBinding { statement })
}

#[cold]
pub fn undefined_variable(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable { name: name.into() })
}

#[cold]
pub fn function_shadows_value(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::FunctionShadowsValue { name: name.into() })
}

#[cold]
pub fn not_generic_function(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotGenericFunction { name: name.into() })
}

#[cold]
pub fn extend_without_import(owner: impl Into<String>, name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ExtendWithoutImport {
        owner: owner.into(),
        name: name.into(),
    })
}

#[cold]
pub fn constant_redefinition(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstantRedefinition { name: name.into() })
}

#[cold]
pub fn imported_assignment(
    name: impl Into<String>,
    owner: impl Into<String>,
    module: impl Into<String>,
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ImportedAssignment {
        name: name.into(),
        owner: owner.into(),
        module: module.into(),
    })
}

#[cold]
pub fn cannot_open_file(path: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CannotOpenFile { path: path.into() })
}

#[cold]
pub fn not_callable(value: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        kind: value.kind_name().to_string(),
    })
}

#[cfg(test)]
mod tests;
