//! String interner for identifier storage.
//!
//! Provides O(1) interning and lookup. The table sits behind a `RwLock` so a
//! loader hook running on another evaluator session can share it.

use super::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Interner shared between the evaluator and its collaborators.
pub type SharedInterner = Arc<StringInterner>;

struct InternTable {
    /// Map from string content to table index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// The table exceeded `u32::MAX` entries.
    Overflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::Overflow { count } => write!(
                f,
                "interner exceeded capacity: {count} strings, max is {}",
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for InternError {}

/// String interner.
///
/// Indices 0 and 1 are always `""` and `"."` so that [`Name::EMPTY`] and
/// [`Name::DOT`] are valid in every interner.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with the reserved names in place.
    pub fn new() -> Self {
        let interner = Self {
            table: RwLock::new(InternTable {
                map: FxHashMap::default(),
                strings: Vec::with_capacity(256),
            }),
        };
        let empty = interner.intern("");
        let dot = interner.intern(".");
        debug_assert_eq!(empty, Name::EMPTY);
        debug_assert_eq!(dot, Name::DOT);
        interner
    }

    /// Try to intern a string, returning its Name or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        // Fast path: already interned
        if let Some(&index) = self.table.read().map.get(s) {
            return Ok(Name::from_raw(index));
        }

        let mut guard = self.table.write();

        // Double-check after acquiring write lock
        if let Some(&index) = guard.map.get(s) {
            return Ok(Name::from_raw(index));
        }

        let index = u32::try_from(guard.strings.len()).map_err(|_| InternError::Overflow {
            count: guard.strings.len(),
        })?;

        // Leak the string to get 'static lifetime
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Ok(Name::from_raw(index))
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if the interner exceeds capacity. Use `try_intern` for fallible
    /// interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Look up the string for a Name.
    ///
    /// Names from another interner yield `"<unknown>"` rather than panicking.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table
            .read()
            .strings
            .get(name.index())
            .copied()
            .unwrap_or("<unknown>")
    }

    /// Number of interned strings, including the reserved ones.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Always false: the reserved names are interned on construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
