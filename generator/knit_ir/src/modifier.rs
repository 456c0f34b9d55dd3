//! Modifier sets for declarations.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifiers carried by a type, method, or field declaration.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ModifierSet: u16 {
        const ABSTRACT  = 1 << 0;
        const STATIC    = 1 << 1;
        const FINAL     = 1 << 2;
        /// Concrete interface method (`default` in the target language).
        const DEFAULT   = 1 << 3;
        const PRIVATE   = 1 << 4;
        const PROTECTED = 1 << 5;
        const PUBLIC    = 1 << 6;
    }
}

impl ModifierSet {
    /// The visibility modifiers.
    pub const VISIBILITY: ModifierSet = ModifierSet::PRIVATE
        .union(ModifierSet::PROTECTED)
        .union(ModifierSet::PUBLIC);

    pub fn is_abstract(self) -> bool {
        self.contains(ModifierSet::ABSTRACT)
    }

    pub fn is_static(self) -> bool {
        self.contains(ModifierSet::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(ModifierSet::FINAL)
    }

    pub fn is_private(self) -> bool {
        self.contains(ModifierSet::PRIVATE)
    }

    /// Keep only the given modifiers.
    #[must_use]
    pub fn retain(self, keep: ModifierSet) -> ModifierSet {
        self & keep
    }

    /// Render the retained modifiers as source keywords, each followed by a
    /// space, in canonical order. Empty set renders as the empty string.
    pub fn keywords(self) -> String {
        let mut out = String::new();
        for (flag, kw) in [
            (ModifierSet::PUBLIC, "public "),
            (ModifierSet::PROTECTED, "protected "),
            (ModifierSet::PRIVATE, "private "),
            (ModifierSet::ABSTRACT, "abstract "),
            (ModifierSet::STATIC, "static "),
            (ModifierSet::FINAL, "final "),
            (ModifierSet::DEFAULT, "default "),
        ] {
            if self.contains(flag) {
                out.push_str(kw);
            }
        }
        out
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keywords().trim_end())
    }
}
