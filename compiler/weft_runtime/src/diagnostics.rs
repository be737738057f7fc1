//! Side-channel for non-fatal warnings.
//!
//! Warnings never change control flow: the definition that triggered one is
//! still installed. Every warning is mirrored to `tracing::warn!` and then
//! handed to the configured sink:
//! - Stderr: printed as `Warning: ...` (default)
//! - Buffer: captured for tests and embedders
//! - Silent: discarded
//!
//! Uses enum dispatch like the print handlers: no vtable on the hot path.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// What a warning is about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A module declaration replaced an existing module binding.
    ModuleReplaced,
    /// A static parameter does not occur in the method signature.
    UnusedStaticParameter,
    /// A local variable has the same name as a static parameter.
    StaticParameterShadowed,
    /// The loader hook ran but the module is still not defined.
    LoaderDidNotDefine,
    /// A module initializer failed.
    InitializerFailed,
    /// An import was skipped because of a conflicting binding.
    ImportConflict,
    /// An import named something the source module does not have.
    ImportMissing,
}

/// One emitted warning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning: {}", self.message)
    }
}

/// Sink that captures warnings to a buffer.
#[derive(Default)]
pub struct BufferSink {
    warnings: Mutex<Vec<Warning>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, warning: Warning) {
        self.warnings.lock().push(warning);
    }

    /// All captured warnings, oldest first.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }

    /// Captured warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> Vec<Warning> {
        self.warnings
            .lock()
            .iter()
            .filter(|w| w.kind == kind)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.warnings.lock().clear();
    }
}

/// Destination for warnings.
#[derive(Clone, Default)]
pub enum DiagnosticSink {
    #[default]
    Stderr,
    Buffer(Arc<BufferSink>),
    Silent,
}

impl DiagnosticSink {
    /// Create a buffer sink, returning the sink and a handle to read it.
    pub fn buffer() -> (Self, Arc<BufferSink>) {
        let buffer = Arc::new(BufferSink::new());
        (DiagnosticSink::Buffer(Arc::clone(&buffer)), buffer)
    }

    /// Emit a warning.
    pub fn warn(&self, kind: WarningKind, message: impl Into<String>) {
        let warning = Warning {
            kind,
            message: message.into(),
        };
        tracing::warn!(?kind, message = %warning.message);
        match self {
            Self::Stderr => eprintln!("{warning}"),
            Self::Buffer(buffer) => buffer.push(warning),
            Self::Silent => {}
        }
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => write!(f, "Stderr"),
            Self::Buffer(_) => write!(f, "Buffer"),
            Self::Silent => write!(f, "Silent"),
        }
    }
}
