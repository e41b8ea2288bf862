//! Grid track and item type definitions.
//!
//! Spec: CSS Grid Layout Module Level 2
//! <https://www.w3.org/TR/css-grid-2/>

use crate::layout::GridAlignment;

/// Upper bound on the repetition count of any `repeat()`.
pub const MAX_REPEAT_COUNT: usize = 100;

/// Sizing kind of a single track.
///
/// Spec: §7.2.1 Track Sizing Functions
/// <https://www.w3.org/TR/css-grid-2/#track-sizing>
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackSizing {
    /// Length in pixels
    Fixed(f32),
    /// Percentage of the available space, 0-100
    Percentage(f32),
    /// Flex factor (fr units)
    Fr(f32),
    /// Automatic sizing
    Auto,
    /// Largest min-content contribution
    MinContent,
    /// Largest max-content contribution
    MaxContent,
}

impl TrackSizing {
    /// Check if this sizing depends on item content.
    #[inline]
    pub const fn is_intrinsic(self) -> bool {
        matches!(self, Self::Auto | Self::MinContent | Self::MaxContent)
    }

    /// Check if this sizing is flexible (uses fr units).
    #[inline]
    pub const fn is_flexible(self) -> bool {
        matches!(self, Self::Fr(_))
    }

    /// Get the flex factor, or 0.0 if not flexible.
    #[inline]
    pub const fn flex_factor(self) -> f32 {
        match self {
            Self::Fr(factor) => factor,
            _ => 0.0,
        }
    }
}

/// A track in the grid with its sizing function and resolved geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTrack {
    pub sizing: TrackSizing,
    /// Floor from a fixed `minmax()` minimum.
    pub min_size: f32,
    /// Ceiling from `fit-content()`.
    pub max_size: Option<f32>,
    /// Largest content contribution of a single-span item.
    pub content_size: f32,
    /// Resolved size.
    pub base_size: f32,
    /// Start offset from the grid origin.
    pub position: f32,
    /// Produced by `repeat(auto-fit, ...)`; collapses when empty.
    pub collapsible: bool,
    /// Collapsed to zero size with its gutters.
    pub collapsed: bool,
}

impl GridTrack {
    #[inline]
    pub const fn new(sizing: TrackSizing) -> Self {
        Self {
            sizing,
            min_size: 0.0,
            max_size: None,
            content_size: 0.0,
            base_size: 0.0,
            position: 0.0,
            collapsible: false,
            collapsed: false,
        }
    }

    /// An implicit (or defaulted) `auto` track.
    #[inline]
    pub const fn auto() -> Self {
        Self::new(TrackSizing::Auto)
    }

    #[inline]
    #[must_use]
    pub const fn with_min(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_max(mut self, max_size: f32) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// End offset (position plus size).
    #[inline]
    pub fn end(&self) -> f32 {
        self.position + self.base_size
    }

    /// Record an item's min/max-content contribution for this track.
    #[inline]
    pub fn contribute(&mut self, min_content: f32, max_content: f32) {
        let contribution = match self.sizing {
            TrackSizing::MinContent => min_content,
            _ => max_content,
        };
        self.content_size = self.content_size.max(contribution);
    }

    /// Size from content, floored by the `minmax()` minimum and capped by
    /// the `fit-content()` limit.
    #[inline]
    pub fn content_based_size(&self) -> f32 {
        let capped = self
            .max_size
            .map_or(self.content_size, |limit| self.content_size.min(limit));
        capped.max(self.min_size)
    }
}

/// `auto-fill` or `auto-fit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    AutoFill,
    AutoFit,
}

/// A `repeat(auto-fill | auto-fit, ...)` whose count depends on the
/// available space.
///
/// Spec: §7.2.3.2 Repeat-to-fill
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRepeat {
    pub kind: RepeatKind,
    pub pattern: Vec<GridTrack>,
    /// Index in [`TrackList::tracks`] where the repetitions are inserted.
    pub insert_at: usize,
}

impl AutoRepeat {
    /// Minimum size of one repetition: fixed sizes, else fixed minimums.
    pub fn min_repetition_size(&self, available: f32) -> f32 {
        self.pattern
            .iter()
            .map(|track| match track.sizing {
                TrackSizing::Fixed(size) => size.max(track.min_size),
                TrackSizing::Percentage(pct) => (available * pct / 100.0).max(track.min_size),
                _ => track.min_size,
            })
            .sum()
    }
}

/// A parsed `grid-template-columns` / `grid-template-rows` value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackList {
    /// Tracks outside any auto-repeat, in order.
    pub tracks: Vec<GridTrack>,
    pub auto_repeat: Option<AutoRepeat>,
}

impl TrackList {
    /// True for `none` or an empty template.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.auto_repeat.is_none()
    }
}

/// A grid item with its placement properties.
#[derive(Debug, Clone)]
pub struct GridItem<NodeId = usize> {
    /// Node identifier (generic to support different node ID types)
    pub node_id: NodeId,
    /// Position among the container's items in document order
    pub source_order: usize,
    /// `order` property
    pub order: i32,
    /// Grid lines as specified: 0 is `auto`, positive is a 1-based line,
    /// a negative end is a span.
    pub col_start: i32,
    pub col_end: i32,
    pub row_start: i32,
    pub row_end: i32,
    pub justify_self: GridAlignment,
    pub align_self: GridAlignment,
    /// Definite margin-box width, if the item has one.
    pub width: Option<f32>,
    /// Definite margin-box height, if the item has one.
    pub height: Option<f32>,
}

impl<NodeId> GridItem<NodeId> {
    /// Create an auto-placed item.
    pub const fn new(node_id: NodeId, source_order: usize) -> Self {
        Self {
            node_id,
            source_order,
            order: 0,
            col_start: 0,
            col_end: 0,
            row_start: 0,
            row_end: 0,
            justify_self: GridAlignment::Auto,
            align_self: GridAlignment::Auto,
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub const fn with_columns(mut self, start: i32, end: i32) -> Self {
        self.col_start = start;
        self.col_end = end;
        self
    }

    #[must_use]
    pub const fn with_rows(mut self, start: i32, end: i32) -> Self {
        self.row_start = start;
        self.row_end = end;
        self
    }

    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn with_alignment(mut self, justify: GridAlignment, align: GridAlignment) -> Self {
        self.justify_self = justify;
        self.align_self = align;
        self
    }

    /// Check if this item has explicit column placement.
    #[inline]
    pub const fn has_explicit_col_placement(&self) -> bool {
        self.col_start > 0 || self.col_end > 0
    }

    /// Check if this item has explicit row placement.
    #[inline]
    pub const fn has_explicit_row_placement(&self) -> bool {
        self.row_start > 0 || self.row_end > 0
    }
}
