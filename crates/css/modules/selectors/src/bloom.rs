//! Counting bloom filter over the ancestor chain.
//!
//! The filter holds the identifiers of every element on the current ancestor
//! path. Style resolution pushes an element before visiting its children and
//! pops it afterwards, so a descendant or child combinator whose left side names
//! a tag, id or class absent from the path can be rejected without walking the
//! ancestors.
//!
//! Answers are "definitely absent" or "maybe present": there are no false
//! negatives. Counters saturate at `u8::MAX` and are never decremented once
//! saturated, which keeps that guarantee when more than 255 hashes share a slot.

use crate::{Atom, ComplexSelector, CompoundSelector, ElementAdapter, SimpleSelector};
use core::hash::{Hash as _, Hasher as _};
use lasso::Key as _;
use log::warn;
use smallvec::SmallVec;
use std::collections::hash_map::DefaultHasher;

/// Number of bits used to index the counter array.
const KEY_BITS: u32 = 12;

/// Number of counters in the filter.
pub const FILTER_SIZE: usize = 1 << KEY_BITS;

const KEY_MASK: u32 = (1 << KEY_BITS) - 1;

/// Kind of identifier; each kind hashes with its own salt so that a tag and a
/// class sharing the same text do not collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentKind {
    Tag,
    Id,
    Class,
}

impl IdentKind {
    #[inline]
    const fn salt(self) -> u32 {
        match self {
            Self::Tag => 13,
            Self::Id => 17,
            Self::Class => 19,
        }
    }
}

/// Salted 32-bit hash of one identifier.
#[inline]
fn ident_hash(kind: IdentKind, atom: Atom) -> u32 {
    let mut hasher = DefaultHasher::new();
    kind.salt().hash(&mut hasher);
    atom.into_usize().hash(&mut hasher);
    let full = hasher.finish();
    (full ^ (full >> 32)) as u32
}

#[inline]
const fn first_slot(hash: u32) -> usize {
    (hash & KEY_MASK) as usize
}

#[inline]
const fn second_slot(hash: u32) -> usize {
    ((hash >> KEY_BITS) & KEY_MASK) as usize
}

/// Hashes pushed for one element, kept for exact removal.
type ElementHashes = SmallVec<u32, 8>;

/// Counting bloom filter with a per-element hash stack.
#[derive(Clone)]
pub struct AncestorFilter {
    counters: Box<[u8; FILTER_SIZE]>,
    stack: Vec<ElementHashes>,
}

impl Default for AncestorFilter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for AncestorFilter {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        formatter
            .debug_struct("AncestorFilter")
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl AncestorFilter {
    #[inline]
    pub fn new() -> Self {
        Self {
            counters: Box::new([0; FILTER_SIZE]),
            stack: Vec::new(),
        }
    }

    /// Number of elements currently pushed.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Forget every pushed element.
    #[inline]
    pub fn clear(&mut self) {
        self.counters.fill(0);
        self.stack.clear();
    }

    /// Push an element's identifiers onto the ancestor path.
    pub fn push(&mut self, tag: Option<Atom>, id: Option<Atom>, classes: &[Atom]) {
        let mut hashes = ElementHashes::new();
        if let Some(tag_atom) = tag {
            hashes.push(ident_hash(IdentKind::Tag, tag_atom));
        }
        if let Some(id_atom) = id {
            hashes.push(ident_hash(IdentKind::Id, id_atom));
        }
        for class in classes {
            hashes.push(ident_hash(IdentKind::Class, *class));
        }
        for hash in &hashes {
            self.increment(first_slot(*hash));
            self.increment(second_slot(*hash));
        }
        self.stack.push(hashes);
    }

    /// Push an element through a DOM adapter.
    #[inline]
    pub fn push_element<A: ElementAdapter>(&mut self, adapter: &A, element: A::Handle) {
        self.push(
            adapter.tag(element),
            adapter.element_id(element),
            adapter.classes(element),
        );
    }

    /// Pop the most recently pushed element, removing exactly the hashes it added.
    pub fn pop(&mut self) {
        let Some(hashes) = self.stack.pop() else {
            warn!("AncestorFilter::pop on an empty ancestor path");
            return;
        };
        for hash in &hashes {
            self.decrement(first_slot(*hash));
            self.decrement(second_slot(*hash));
        }
    }

    #[inline]
    fn increment(&mut self, slot: usize) {
        if let Some(counter) = self.counters.get_mut(slot)
            && *counter != u8::MAX
        {
            *counter += 1;
        }
    }

    #[inline]
    fn decrement(&mut self, slot: usize) {
        if let Some(counter) = self.counters.get_mut(slot)
            && *counter != u8::MAX
        {
            *counter = counter.saturating_sub(1);
        }
    }

    #[inline]
    fn slot_set(&self, slot: usize) -> bool {
        self.counters.get(slot).is_some_and(|counter| *counter != 0)
    }

    /// False only when no pushed ancestor carries the identifier.
    /// `None` (unknown, empty or universal) always reports a possible match.
    #[inline]
    pub fn might_have(&self, kind: IdentKind, atom: Option<Atom>) -> bool {
        atom.is_none_or(|ident| {
            let hash = ident_hash(kind, ident);
            self.slot_set(first_slot(hash)) && self.slot_set(second_slot(hash))
        })
    }

    #[inline]
    pub fn might_have_tag(&self, tag: Option<Atom>) -> bool {
        self.might_have(IdentKind::Tag, tag)
    }

    #[inline]
    pub fn might_have_id(&self, id: Option<Atom>) -> bool {
        self.might_have(IdentKind::Id, id)
    }

    #[inline]
    pub fn might_have_class(&self, class: Option<Atom>) -> bool {
        self.might_have(IdentKind::Class, class)
    }

    /// True unless one of the compound's tag, id or class selectors is absent
    /// from every ancestor. Attribute selectors are not tracked.
    pub fn might_match_compound(&self, compound: &CompoundSelector) -> bool {
        compound.simples.iter().all(|simple| match simple {
            SimpleSelector::Type(tag) => self.might_have_tag(Some(*tag)),
            SimpleSelector::IdSelector(id) => self.might_have_id(Some(*id)),
            SimpleSelector::Class(class) => self.might_have_class(Some(*class)),
            SimpleSelector::AttrExists(_)
            | SimpleSelector::AttrEquals { .. }
            | SimpleSelector::Universal => true,
        })
    }

    /// Fast reject for a complex selector whose subject is the element being
    /// styled while its ancestors are pushed.
    ///
    /// A compound must be matched by an ancestor once a child or descendant
    /// combinator separates it from the subject; sibling-only compounds are
    /// skipped.
    pub fn might_match_selector(&self, sel: &ComplexSelector) -> bool {
        let mut ancestral = false;
        for (position, pair) in sel.rest.iter().enumerate().rev() {
            ancestral |= pair.0.is_ancestral();
            if !ancestral {
                continue;
            }
            let left = if position == 0 {
                &sel.first
            } else {
                match sel.rest.get(position - 1) {
                    Some(prev) => &prev.1,
                    None => continue,
                }
            };
            if !self.might_match_compound(left) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AtomTable, parse_complex_selector};

    /// Popping removes exactly what was pushed, even with colliding ancestors.
    ///
    /// # Panics
    /// Panics if a counter is left behind.
    #[test]
    fn push_pop_restores_empty_filter() {
        let mut atoms = AtomTable::new();
        let div = atoms.intern("div");
        let note = atoms.intern("note");
        let mut filter = AncestorFilter::new();
        filter.push(Some(div), None, &[note]);
        filter.push(Some(div), None, &[note, note]);
        assert!(filter.might_have_class(Some(note)));
        filter.pop();
        assert!(filter.might_have_class(Some(note)));
        filter.pop();
        assert!(filter.counters.iter().all(|counter| *counter == 0));
        assert!(!filter.might_have_tag(Some(div)));
    }

    /// Unknown identifiers always might match.
    ///
    /// # Panics
    /// Panics if `None` is rejected.
    #[test]
    fn unknown_identifier_might_match() {
        let filter = AncestorFilter::new();
        assert!(filter.might_have_tag(None));
        assert!(filter.might_have_id(None));
    }

    /// A descendant selector naming an absent ancestor class is rejected,
    /// while a sibling-only selector is never rejected.
    ///
    /// # Panics
    /// Panics if the fast reject misbehaves.
    #[test]
    fn selector_fast_reject() {
        let mut atoms = AtomTable::new();
        let body = atoms.intern("body");
        let mut filter = AncestorFilter::new();
        filter.push(Some(body), None, &[]);
        let absent = parse_complex_selector(".sidebar p", &mut atoms);
        let present = parse_complex_selector("body > p", &mut atoms);
        let sibling = parse_complex_selector(".sidebar + p", &mut atoms);
        assert!(!filter.might_match_selector(&absent));
        assert!(filter.might_match_selector(&present));
        assert!(filter.might_match_selector(&sibling));
    }

    /// Saturated counters stay saturated after pops.
    ///
    /// # Panics
    /// Panics if a saturated slot drops to a false negative.
    #[test]
    fn saturated_counters_never_produce_false_negatives() {
        let mut atoms = AtomTable::new();
        let span = atoms.intern("span");
        let mut filter = AncestorFilter::new();
        for _ in 0..300 {
            filter.push(Some(span), None, &[]);
        }
        for _ in 0..299 {
            filter.pop();
        }
        assert_eq!(filter.depth(), 1);
        assert!(filter.might_have_tag(Some(span)));
    }
}
