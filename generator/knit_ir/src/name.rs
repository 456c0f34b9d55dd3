//! Interned string identifier.
//!
//! Provides compact 32-bit interned identifiers for simple names, qualified
//! names, and package names in the declaration model.

use std::fmt;

use rustc_hash::FxHashMap;

/// Interned string identifier.
///
/// A `Name` is an index into the owning [`Interner`]. Equality and hashing
/// are O(1) integer operations; the string content is recovered through
/// [`Interner::resolve`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create from raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
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

/// String interner backing [`Name`].
///
/// Single-map variant: the resolution engine is single-threaded and processes
/// one declaration at a time, so there is no sharding or locking here.
pub struct Interner {
    map: FxHashMap<String, u32>,
    strings: Vec<String>,
}

impl Interner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut interner = Interner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        interner.map.insert(String::new(), 0);
        interner.strings.push(String::new());
        interner
    }

    /// Intern a string, returning its `Name`.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&idx) = self.map.get(s) {
            return Name(idx);
        }
        let idx = u32::try_from(self.strings.len()).unwrap_or_else(|_| {
            // 4 billion distinct identifiers exceeds any realistic model.
            unreachable!("interner overflow")
        });
        self.map.insert(s.to_owned(), idx);
        self.strings.push(s.to_owned());
        Name(idx)
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).map(|&idx| Name(idx))
    }

    /// Resolve a `Name` back to its string content.
    pub fn resolve(&self, name: Name) -> &str {
        self.strings
            .get(name.0 as usize)
            .map_or("", String::as_str)
    }

    /// Number of interned strings (including the empty string).
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the interner holds only the pre-interned empty string.
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_intern_round_trip() {
        let mut interner = Interner::new();
        let a = interner.intern("clock");
        let b = interner.intern("clock");
        let c = interner.intern("zone");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "clock");
        assert_eq!(interner.resolve(c), "zone");
    }

    #[test]
    fn test_empty_pre_interned() {
        let mut interner = Interner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.resolve(Name::EMPTY), "");
    }

    #[test]
    fn test_name_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Name::from_raw(1));
        set.insert(Name::from_raw(1));
        set.insert(Name::from_raw(2));
        assert_eq!(set.len(), 2);
    }
}
