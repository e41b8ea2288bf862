//! Rule lookup by element identifiers.
//!
//! Every selector lands in exactly one bucket keyed by its subject compound:
//! the type selector if present, otherwise the first class or id, otherwise the
//! universal bucket. Looking up an element unions the buckets it can hit and
//! restores cascade order, so matching cost scales with the candidates rather
//! than with the stylesheet.

use crate::{
    Atom, ComplexSelector, SelectorList, SimpleSelector, Specificity, specificity_of_complex,
};
use log::{debug, trace};
use std::collections::HashMap;

/// Viewport-width media guard attached to a rule.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MediaGuard {
    pub min_width: Option<f32>,
    pub max_width: Option<f32>,
}

impl MediaGuard {
    /// True when the rule applies at this viewport width.
    #[inline]
    pub fn matches(&self, viewport_width: f32) -> bool {
        self.min_width.is_none_or(|min| viewport_width >= min)
            && self.max_width.is_none_or(|max| viewport_width <= max)
    }
}

/// A parsed selector bound to its declaration block.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub complex: ComplexSelector,
    pub specificity: Specificity,
    /// Insertion order in the stylesheet; later wins on equal specificity.
    pub order: u32,
    /// Opaque handle of the declaration block this selector guards.
    pub declarations: usize,
    pub media: Option<MediaGuard>,
}

impl Selector {
    #[inline]
    pub fn new(complex: ComplexSelector, order: u32, declarations: usize) -> Self {
        Self {
            specificity: specificity_of_complex(&complex),
            complex,
            order,
            declarations,
            media: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_media(mut self, media: MediaGuard) -> Self {
        self.media = Some(media);
        self
    }

    /// Cascade rank: ascending specificity, then ascending source order.
    #[inline]
    pub const fn cascade_key(&self) -> (Specificity, u32) {
        (self.specificity, self.order)
    }

    /// True if the media guard (if any) admits this viewport width.
    #[inline]
    pub fn applies_at(&self, viewport_width: f32) -> bool {
        self.media.is_none_or(|guard| guard.matches(viewport_width))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bucket {
    Tag(Atom),
    Class(Atom),
    Id(Atom),
    Universal,
}

fn bucket_of(sel: &ComplexSelector) -> Bucket {
    let subject = sel.rightmost();
    if let Some(tag) = subject.tag() {
        return Bucket::Tag(tag);
    }
    subject
        .simples
        .iter()
        .find_map(|simple| match simple {
            SimpleSelector::Class(class) => Some(Bucket::Class(*class)),
            SimpleSelector::IdSelector(id) => Some(Bucket::Id(*id)),
            _ => None,
        })
        .unwrap_or(Bucket::Universal)
}

/// Read-only bucket index over selectors sorted in cascade order.
///
/// Buckets store positions into the sorted list, so sorting candidate
/// positions restores cascade order.
#[derive(Clone, Debug, Default)]
pub struct SelectorIndex {
    sorted: Vec<Selector>,
    by_tag: HashMap<Atom, Vec<usize>>,
    by_class: HashMap<Atom, Vec<usize>>,
    by_id: HashMap<Atom, Vec<usize>>,
    universal: Vec<usize>,
}

impl SelectorIndex {
    /// Sort selectors into cascade order and bucket them.
    pub fn build(mut selectors: Vec<Selector>) -> Self {
        selectors.sort_by_key(Selector::cascade_key);
        let mut index = Self::default();
        for (position, sel) in selectors.iter().enumerate() {
            match bucket_of(&sel.complex) {
                Bucket::Tag(tag) => index.by_tag.entry(tag).or_default().push(position),
                Bucket::Class(class) => index.by_class.entry(class).or_default().push(position),
                Bucket::Id(id) => index.by_id.entry(id).or_default().push(position),
                Bucket::Universal => index.universal.push(position),
            }
        }
        debug!(
            "SelectorIndex: {} selectors, {} tag / {} class / {} id buckets, {} universal",
            selectors.len(),
            index.by_tag.len(),
            index.by_class.len(),
            index.by_id.len(),
            index.universal.len()
        );
        index.sorted = selectors;
        index
    }

    /// Selectors that could match an element, in cascade order.
    pub fn get_candidates(
        &self,
        tag: Option<Atom>,
        classes: &[Atom],
        id: Option<Atom>,
    ) -> Vec<&Selector> {
        let mut positions: Vec<usize> = self.universal.clone();
        if let Some(bucket) = tag.and_then(|tag_atom| self.by_tag.get(&tag_atom)) {
            positions.extend_from_slice(bucket);
        }
        for class in classes {
            if let Some(bucket) = self.by_class.get(class) {
                positions.extend_from_slice(bucket);
            }
        }
        if let Some(bucket) = id.and_then(|id_atom| self.by_id.get(&id_atom)) {
            positions.extend_from_slice(bucket);
        }
        // Duplicate class tokens can hit the same bucket twice.
        positions.sort_unstable();
        positions.dedup();
        trace!("SelectorIndex: {} candidates", positions.len());
        positions
            .into_iter()
            .filter_map(|position| self.sorted.get(position))
            .collect()
    }

    /// All selectors in cascade order.
    #[inline]
    pub fn selectors(&self) -> &[Selector] {
        &self.sorted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

/// The rules of one stylesheet plus an optional index over them.
///
/// The index is rebuilt wholesale: adding a rule drops it, and lookups fall
/// back to the full unsorted rule list until [`StyleRules::build_index`] runs.
#[derive(Clone, Debug, Default)]
pub struct StyleRules {
    selectors: Vec<Selector>,
    index: Option<SelectorIndex>,
}

impl StyleRules {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selector, stamping it with the next insertion order.
    pub fn add(&mut self, mut selector: Selector) {
        selector.order = u32::try_from(self.selectors.len()).unwrap_or(u32::MAX);
        self.selectors.push(selector);
        self.index = None;
    }

    /// Add every selector of a list with one declaration block.
    pub fn add_list(&mut self, list: SelectorList, declarations: usize) {
        for complex in list.selectors {
            self.add(Selector::new(complex, 0, declarations));
        }
    }

    /// Build the cascade-ordered index over the current rules.
    pub fn build_index(&mut self) {
        self.index = Some(SelectorIndex::build(self.selectors.clone()));
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Candidates for an element; the full unsorted list when not indexed.
    pub fn get_candidates(
        &self,
        tag: Option<Atom>,
        classes: &[Atom],
        id: Option<Atom>,
    ) -> Vec<&Selector> {
        self.index.as_ref().map_or_else(
            || {
                trace!("StyleRules: no index, scanning {} rules", self.selectors.len());
                self.selectors.iter().collect()
            },
            |index| index.get_candidates(tag, classes, id),
        )
    }
}
