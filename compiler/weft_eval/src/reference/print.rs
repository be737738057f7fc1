//! Where the reference machine's `println` intrinsic writes.
//!
//! - Stdout: the default
//! - Buffer: captured for tests and embedders
//! - Silent: discarded
//!
//! Enum dispatch, like the diagnostic sink.

use std::sync::Arc;

use parking_lot::Mutex;

/// Output destination for printed values.
#[derive(Clone, Default)]
pub enum PrintHandler {
    #[default]
    Stdout,
    Buffer(Arc<Mutex<String>>),
    Silent,
}

impl PrintHandler {
    /// A capturing handler.
    pub fn buffer() -> Self {
        PrintHandler::Buffer(Arc::new(Mutex::new(String::new())))
    }

    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(msg);
                buf.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Everything captured so far; empty for handlers that do not capture.
    pub fn output(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(buf) = self {
            buf.lock().clear();
        }
    }
}

impl std::fmt::Debug for PrintHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "Stdout"),
            Self::Buffer(_) => write!(f, "Buffer"),
            Self::Silent => write!(f, "Silent"),
        }
    }
}
