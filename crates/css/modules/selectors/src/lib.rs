//! Selectors Level 3: Element matching, specificity and rule lookup.
//! Spec: <https://www.w3.org/TR/selectors-3/>
//!
//! This crate implements the subset the layout core needs:
//! - Type, class, id and attribute selectors
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - Specificity calculation
//! - A bucketed rule index for candidate lookup
//! - A counting bloom filter over the ancestor chain for fast rejection
//!
//! Identifiers (tags, classes, ids, attribute names) are interned into an
//! [`AtomTable`] owned by the caller, so every comparison is an integer compare.

mod atoms;
mod bloom;
mod index;
mod matcher;
mod parser;
mod specificity;

// Re-export public API
pub use atoms::{Atom, AtomTable};
pub use bloom::{AncestorFilter, FILTER_SIZE, IdentKind};
pub use index::{MediaGuard, Selector, SelectorIndex, StyleRules};
pub use matcher::{matches_complex, matches_compound, matches_selector_list};
pub use parser::{parse_complex_selector, parse_selector_list};
pub use specificity::{Specificity, specificity_of_complex, specificity_of_compound};

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
///
/// Spec references:
/// - Section 3: Selectors overview and element matching
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Parent element if any.
    /// Spec: Section 11: Combinators (for tree relationships)
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element (skip non-elements if your DOM has mixed nodes).
    /// Spec: Section 11: Sibling combinators
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Interned tag name (ASCII lowercase before interning).
    /// Spec: Section 5: Type selectors
    fn tag(&self, element: Self::Handle) -> Option<Atom>;

    /// Returns the interned id if the element has an id attribute.
    /// Spec: Section 7: ID selectors
    fn element_id(&self, element: Self::Handle) -> Option<Atom>;

    /// Interned class tokens of the element, in attribute order.
    /// Spec: Section 6: Class selectors
    fn classes(&self, element: Self::Handle) -> &[Atom];

    /// True if the element has the given class token.
    #[inline]
    fn has_class(&self, element: Self::Handle, class: Atom) -> bool {
        self.classes(element).contains(&class)
    }

    /// Returns the attribute value if present.
    /// Spec: Section 8: Attribute selectors
    fn attr(&self, element: Self::Handle, name: Atom) -> Option<&str>;
}

/// Simple selectors (subset).
/// Spec: Section 5, 6, 7, 8
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    /// Spec: Section 5: Type selectors
    Type(Atom),
    /// Spec: Section 6: Class selectors
    Class(Atom),
    /// Spec: Section 7: ID selectors
    IdSelector(Atom),
    /// Spec: Section 8: Attribute presence `[attr]`
    AttrExists(Atom),
    /// Spec: Section 8: Attribute selectors `[attr=value]`
    AttrEquals { name: Atom, value: String },
    /// Universal selector '*'.
    /// Spec: Section 5: Universal selector
    Universal,
}

/// A compound selector is a sequence of simple selectors (no combinators).
/// Spec: Section 5: Simple selector sequences
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

impl CompoundSelector {
    /// The type selector of this compound, if any.
    #[inline]
    pub fn tag(&self) -> Option<Atom> {
        self.simples.iter().find_map(|simple| match simple {
            SimpleSelector::Type(tag) => Some(*tag),
            _ => None,
        })
    }
}

/// Combinators between compounds.
/// Spec: Section 11: Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

impl Combinator {
    /// True for combinators whose left side is matched by an ancestor.
    #[inline]
    pub const fn is_ancestral(self) -> bool {
        matches!(self, Self::Descendant | Self::Child)
    }
}

/// A complex selector is one or more compounds separated by combinators.
/// Spec: Section 3, 11
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    /// The subject (rightmost) compound.
    #[inline]
    pub fn rightmost(&self) -> &CompoundSelector {
        self.rest.last().map_or(&self.first, |pair| &pair.1)
    }

    /// True when nothing was parsed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.simples.is_empty() && self.rest.is_empty()
    }
}

/// A selector list separated by commas.
/// Spec: Section 4: Groups of selectors
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}
