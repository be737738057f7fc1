//! Interned string identifier.

use std::fmt;

/// Interned string identifier.
///
/// A plain 32-bit index into the owning [`StringInterner`](crate::StringInterner).
/// Two names are equal exactly when they were interned from equal strings in
/// the same interner.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Pre-interned `.`, the parent-hop marker in import paths.
    pub const DOT: Name = Name(1);

    /// Create from a raw table index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the interner's string table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_constants_are_distinct() {
        assert_ne!(Name::EMPTY, Name::DOT);
        assert_eq!(Name::DOT.index(), 1);
    }

    #[test]
    fn test_name_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Name::from_raw(4));
        set.insert(Name::from_raw(4)); // duplicate
        set.insert(Name::from_raw(5));
        assert_eq!(set.len(), 2);
    }
}
