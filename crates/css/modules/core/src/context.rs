//! Per-document layout state: configuration, generation counter, viewport,
//! scroll position and pass statistics.

use crate::cache::LayoutStats;
use crate::host::DocumentContainer;
use core::error::Error;
use core::fmt;
use css_box::Rect;
use log::warn;

/// Layout tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Depth ceiling for render, paint and hit-test descent.
    pub max_depth: usize,
    /// Depth ceiling for positioned-descendant collection.
    pub max_positioned_depth: usize,
    /// Consult the layout and width caches.
    pub layout_cache_enabled: bool,
    /// Font size of anonymous boxes whose parent has no style.
    pub default_font_size: f32,
}

impl Default for LayoutConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_depth: 500,
            max_positioned_depth: 1000,
            layout_cache_enabled: true,
            default_font_size: 16.0,
        }
    }
}

/// The host stopped a layout pass through its progress callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutAborted {
    /// Boxes visited before the abort.
    pub boxes: u64,
}

impl fmt::Display for LayoutAborted {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "layout aborted by host after {} boxes", self.boxes)
    }
}

impl Error for LayoutAborted {}

/// State shared by every box of one document during layout.
#[derive(Debug)]
pub struct LayoutContext {
    config: LayoutConfig,
    generation: u64,
    viewport: Rect,
    scroll_x: f32,
    scroll_y: f32,
    stats: LayoutStats,
}

impl LayoutContext {
    #[inline]
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            generation: 0,
            viewport: Rect::default(),
            scroll_x: 0.0,
            scroll_y: 0.0,
            stats: LayoutStats::default(),
        }
    }

    #[inline]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[inline]
    pub const fn config_mut(&mut self) -> &mut LayoutConfig {
        &mut self.config
    }

    /// Current layout generation; starts at zero before the first pass.
    #[inline]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub const fn viewport(&self) -> Rect {
        self.viewport
    }

    #[inline]
    pub const fn scroll(&self) -> (f32, f32) {
        (self.scroll_x, self.scroll_y)
    }

    #[inline]
    pub const fn set_scroll(&mut self, scroll_x: f32, scroll_y: f32) {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
    }

    #[inline]
    pub const fn stats(&self) -> LayoutStats {
        self.stats
    }

    #[inline]
    pub const fn stats_mut(&mut self) -> &mut LayoutStats {
        &mut self.stats
    }

    /// Start a full layout pass: bump the generation exactly once and reset
    /// the pass statistics.
    pub fn begin_pass(&mut self, viewport: Rect) {
        self.generation += 1;
        self.viewport = viewport;
        self.stats = LayoutStats::default();
    }

    /// Box-boundary cancellation point.
    ///
    /// # Errors
    /// Returns [`LayoutAborted`] when the host asks to stop.
    pub fn checkpoint<C: DocumentContainer + ?Sized>(
        &mut self,
        host: &mut C,
    ) -> Result<(), LayoutAborted> {
        self.stats.boxes += 1;
        if host.on_layout_progress() {
            Ok(())
        } else {
            warn!(
                "layout pass {} aborted by host after {} boxes",
                self.generation, self.stats.boxes
            );
            Err(LayoutAborted {
                boxes: self.stats.boxes,
            })
        }
    }
}

impl Default for LayoutContext {
    #[inline]
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
