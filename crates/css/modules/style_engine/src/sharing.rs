//! Style sharing cache.
//!
//! Elements with the same tag, the same class set, the same matched
//! declarations and the same parent style compute the same style, so the
//! computed object can be shared. Any other style input (structural
//! pseudo-classes, attribute selectors beyond class/id, inline style) must be
//! folded into the declaration hash by the caller, or sharing is unsound for it.

use crate::ComputedStyle;
use core::hash::{Hash as _, Hasher as _};
use css_selectors::Atom;
use lasso::Key as _;
use log::debug;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::sync::Arc;

/// Default number of entries before eviction kicks in.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Golden-ratio constant mixed between key components.
const MIX: u64 = 0x9e37_79b9;

/// Order-independent hash of a class set.
pub fn hash_classes(classes: &[Atom]) -> u64 {
    let mut sorted: Vec<usize> = classes.iter().map(|class| class.into_usize()).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let mut hasher = DefaultHasher::new();
    sorted.hash(&mut hasher);
    hasher.finish()
}

/// Hash of the matched declaration blocks (in cascade order) plus any extra
/// style inputs the caller needs the key to capture.
pub fn hash_declarations<I: IntoIterator<Item = usize>>(blocks: I, extra: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    for block in blocks {
        block.hash(&mut hasher);
    }
    MIX.hash(&mut hasher);
    extra.hash(&mut hasher);
    hasher.finish()
}

/// Composite sharing key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleKey {
    pub tag: Option<Atom>,
    pub classes_hash: u64,
    pub declarations_hash: u64,
    pub parent_style_hash: u64,
}

impl StyleKey {
    /// Build a key; the root element (no parent) uses a zero parent hash.
    #[inline]
    pub fn new(
        tag: Option<Atom>,
        classes: &[Atom],
        declarations_hash: u64,
        parent: Option<&ComputedStyle>,
    ) -> Self {
        Self {
            tag,
            classes_hash: hash_classes(classes),
            declarations_hash,
            parent_style_hash: parent.map_or(0, ComputedStyle::style_hash),
        }
    }
}

/// Bounded map from [`StyleKey`] to a shared computed style.
///
/// On overflow roughly half the entries are dropped in map iteration order.
/// This is not LRU; the capacity is the tuning knob.
#[derive(Debug)]
pub struct StyleSharingCache {
    entries: HashMap<StyleKey, Arc<ComputedStyle>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for StyleSharingCache {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl StyleSharingCache {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A cache holding at most `capacity` entries (minimum 1).
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a shared style, counting the hit or miss.
    pub fn find(&mut self, key: &StyleKey) -> Option<Arc<ComputedStyle>> {
        if let Some(style) = self.entries.get(key) {
            self.hits += 1;
            Some(Arc::clone(style))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Insert a style, evicting half the entries first when full.
    pub fn store(&mut self, key: StyleKey, style: Arc<ComputedStyle>) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_half();
        }
        self.entries.insert(key, style);
    }

    fn evict_half(&mut self) {
        let drop_count = (self.entries.len() / 2).max(1);
        let doomed: Vec<StyleKey> = self.entries.keys().take(drop_count).copied().collect();
        for key in &doomed {
            self.entries.remove(key);
        }
        debug!(
            "StyleSharingCache: evicted {} entries, {} remain",
            doomed.len(),
            self.entries.len()
        );
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Fraction of lookups that hit, `0.0` before any lookup.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
