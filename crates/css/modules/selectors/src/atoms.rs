//! Identifier interning for selector matching.

use lasso::{Rodeo, Spur};

/// An interned identifier (tag name, class, id or attribute name).
pub type Atom = Spur;

/// Interner owned by one document or stylesheet.
///
/// Tag names and attribute names are lowercased before interning; class and id
/// values are case-sensitive and interned verbatim.
#[derive(Debug, Default)]
pub struct AtomTable {
    rodeo: Rodeo,
}

impl AtomTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a case-sensitive identifier.
    #[inline]
    pub fn intern(&mut self, ident: &str) -> Atom {
        self.rodeo.get_or_intern(ident)
    }

    /// Intern an ASCII case-insensitive name (tags, attribute names).
    #[inline]
    pub fn intern_lowercase(&mut self, name: &str) -> Atom {
        if name.bytes().any(|byte| byte.is_ascii_uppercase()) {
            self.rodeo.get_or_intern(name.to_ascii_lowercase())
        } else {
            self.rodeo.get_or_intern(name)
        }
    }

    /// Look up an identifier without interning it.
    #[inline]
    pub fn get(&self, ident: &str) -> Option<Atom> {
        self.rodeo.get(ident)
    }

    /// Resolve an atom back to its text.
    #[inline]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.rodeo.resolve(&atom)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}
