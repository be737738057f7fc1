//! Scoped root registration for the collector.
//!
//! Values that must survive a nested evaluation (a module being populated, a
//! compiled thunk awaiting application) are pushed here and released when the
//! scope that created them ends. Release is by watermark, so nested scopes
//! unwind in LIFO order.

use crate::value::Value;

/// Watermark returned by [`RootSet::mark`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RootMark(usize);

/// Stack of values the collector must treat as live.
#[derive(Debug, Default)]
pub struct RootSet {
    roots: Vec<Value>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current height, to release back to later.
    #[inline]
    pub fn mark(&self) -> RootMark {
        RootMark(self.roots.len())
    }

    /// Register a value; it stays rooted until released past its mark.
    pub fn push(&mut self, value: Value) {
        self.roots.push(value);
    }

    /// Release everything registered since `mark`.
    pub fn release(&mut self, mark: RootMark) {
        self.roots.truncate(mark.0);
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether `value` is currently rooted.
    pub fn contains(&self, value: &Value) -> bool {
        self.roots.iter().any(|r| r == value)
    }
}
