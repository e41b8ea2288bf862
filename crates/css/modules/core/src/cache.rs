//! Generation-stamped layout caches.
//!
//! Each render item carries a layout result cache and a width cache. An
//! entry is usable only while its stamp equals the current layout
//! generation; bumping the
//! generation once per pass retires every entry at once, while renders later
//! in the same pass can still reuse what earlier renders stored. Damage checks
//! are layered on top by the caller.

/// Exact lookup key of a layout result: available width, available height
/// (`None` when indefinite) and size-mode bits. Floats compare by bit pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    width_bits: u32,
    height_bits: Option<u32>,
    size_mode: u32,
}

impl LayoutKey {
    #[inline]
    pub fn new(available_width: f32, available_height: Option<f32>, size_mode: u32) -> Self {
        Self {
            width_bits: available_width.to_bits(),
            height_bits: available_height.map(f32::to_bits),
            size_mode,
        }
    }
}

/// Layout output stored for a key: content box size and content min width.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CachedLayout {
    pub width: f32,
    pub height: f32,
    pub min_width: f32,
}

#[derive(Clone, Copy, Debug)]
struct LayoutEntry {
    key: LayoutKey,
    output: CachedLayout,
    generation: u64,
}

/// Last two layout results of one box.
///
/// Grid items are measured with an indefinite height and then rendered at
/// their stretched cell height; keeping both entries lets a container laid
/// out twice in one pass answer both renders of its children from cache.
#[derive(Clone, Copy, Debug, Default)]
pub struct LayoutResultCache {
    entries: [Option<LayoutEntry>; 2],
}

impl LayoutResultCache {
    /// The stored output if a key matches exactly and its stamp is current.
    #[inline]
    pub fn get(&self, key: LayoutKey, generation: u64) -> Option<CachedLayout> {
        self.entries
            .iter()
            .flatten()
            .find(|entry| entry.generation == generation && entry.key == key)
            .map(|entry| entry.output)
    }

    /// Store `output` for `key`, replacing an entry with the same key or
    /// else the older one.
    #[inline]
    pub fn store(&mut self, key: LayoutKey, output: CachedLayout, generation: u64) {
        let entry = LayoutEntry {
            key,
            output,
            generation,
        };
        let [newest, older] = &mut self.entries;
        if !newest.is_some_and(|current| current.key == key) {
            *older = *newest;
        }
        *newest = Some(entry);
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.entries = [None, None];
    }

    #[inline]
    pub fn is_valid(&self, generation: u64) -> bool {
        self.entries
            .iter()
            .flatten()
            .any(|entry| entry.generation == generation)
    }
}

#[derive(Clone, Copy, Debug)]
struct WidthEntry {
    containing_bits: u32,
    min_content: f32,
    max_content: f32,
    generation: u64,
}

/// Intrinsic min/max-content widths of one box, keyed by the containing
/// width they were measured against (percentages make them width dependent).
#[derive(Clone, Copy, Debug, Default)]
pub struct WidthCache {
    entry: Option<WidthEntry>,
}

impl WidthCache {
    #[inline]
    pub fn get(&self, containing_width: f32, generation: u64) -> Option<(f32, f32)> {
        self.entry
            .filter(|entry| {
                entry.generation == generation && entry.containing_bits == containing_width.to_bits()
            })
            .map(|entry| (entry.min_content, entry.max_content))
    }

    #[inline]
    pub fn store(&mut self, containing_width: f32, widths: (f32, f32), generation: u64) {
        self.entry = Some(WidthEntry {
            containing_bits: containing_width.to_bits(),
            min_content: widths.0,
            max_content: widths.1,
            generation,
        });
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Counters of the last layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutStats {
    /// Boxes that reached a progress checkpoint.
    pub boxes: u64,
    pub layout_hits: u64,
    pub layout_misses: u64,
    pub width_hits: u64,
    pub width_misses: u64,
    /// Positioned boxes re-rendered after their used width changed.
    pub second_passes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Entries need an exact key and the current generation.
    ///
    /// # Panics
    /// Panics if a stale or mismatched entry is returned.
    #[test]
    fn layout_entry_matches_exactly() {
        let mut cache = LayoutResultCache::default();
        let key = LayoutKey::new(300.0, None, 1);
        let output = CachedLayout {
            width: 300.0,
            height: 40.0,
            min_width: 80.0,
        };
        cache.store(key, output, 7);
        assert_eq!(cache.get(key, 7), Some(output));
        assert_eq!(cache.get(key, 8), None);
        assert_eq!(cache.get(LayoutKey::new(300.0, Some(0.0), 1), 7), None);
        assert_eq!(cache.get(LayoutKey::new(300.0, None, 0), 7), None);
        cache.invalidate();
        assert_eq!(cache.get(key, 7), None);
    }

    /// A measuring and a final layout of the same box are both kept; a third
    /// key evicts the older one.
    ///
    /// # Panics
    /// Panics if an entry is evicted too early or kept too long.
    #[test]
    fn layout_cache_keeps_two_keys() {
        let mut cache = LayoutResultCache::default();
        let measure = LayoutKey::new(200.0, None, 1);
        let stretched = LayoutKey::new(200.0, Some(80.0), 3);
        let wider = LayoutKey::new(400.0, None, 1);
        let output = CachedLayout::default();
        cache.store(measure, output, 1);
        cache.store(stretched, output, 1);
        cache.store(stretched, output, 1);
        assert!(cache.get(measure, 1).is_some());
        assert!(cache.get(stretched, 1).is_some());
        cache.store(wider, output, 1);
        assert!(cache.get(measure, 1).is_none());
        assert!(cache.get(stretched, 1).is_some());
        assert!(cache.get(wider, 1).is_some());
    }

    /// Width entries depend on the containing width.
    ///
    /// # Panics
    /// Panics if the containing width is ignored.
    #[test]
    fn width_entry_tracks_containing_width() {
        let mut cache = WidthCache::default();
        cache.store(500.0, (20.0, 120.0), 1);
        assert_eq!(cache.get(500.0, 1), Some((20.0, 120.0)));
        assert_eq!(cache.get(400.0, 1), None);
        assert_eq!(cache.get(500.0, 2), None);
    }
}
