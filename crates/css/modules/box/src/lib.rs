//! CSS Box Model Module Level 3: Box dimensions, margins, borders, padding.
//! Spec: <https://www.w3.org/TR/css-box-3/>
//!
//! Geometry is kept in CSS pixels as `f32`.

mod geometry;

pub use geometry::{Rect, Size};

/// A specified length before layout: `auto`, pixels, or a percentage of the
/// containing block. Percentages are stored as percent values (`50.0` is 50%).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Length {
    #[default]
    Auto,
    Px(f32),
    Percent(f32),
}

impl Length {
    #[inline]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    #[inline]
    pub const fn is_percent(self) -> bool {
        matches!(self, Self::Percent(_))
    }

    /// Resolve against a percentage base; `None` for `auto`.
    #[inline]
    pub fn resolve(self, percent_base: f32) -> Option<f32> {
        match self {
            Self::Auto => None,
            Self::Px(pixels) => Some(pixels),
            Self::Percent(percent) => Some(percent_base * percent / 100.0),
        }
    }

    /// Resolve against a percentage base, treating `auto` as `fallback`.
    #[inline]
    pub fn px_or(self, percent_base: f32, fallback: f32) -> f32 {
        self.resolve(percent_base).unwrap_or(fallback)
    }

    /// Stable bit pattern for hashing.
    #[inline]
    pub const fn hash_bits(self) -> (u8, u32) {
        match self {
            Self::Auto => (0, 0),
            Self::Px(pixels) => (1, pixels.to_bits()),
            Self::Percent(percent) => (2, percent.to_bits()),
        }
    }
}

/// Four physical edges of a box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Edges<T> {
    /// All four edges set to one value.
    #[inline]
    pub const fn all(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Apply `convert` to every edge.
    #[inline]
    pub fn map<U>(self, mut convert: impl FnMut(T) -> U) -> Edges<U> {
        Edges {
            top: convert(self.top),
            right: convert(self.right),
            bottom: convert(self.bottom),
            left: convert(self.left),
        }
    }
}

impl Edges<f32> {
    #[inline]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    #[inline]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Used margin, padding and border widths of one box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxSides {
    pub margin: Edges<f32>,
    pub padding: Edges<f32>,
    pub border: Edges<f32>,
}

impl BoxSides {
    /// Left offset from the margin edge to the content edge.
    #[inline]
    pub fn content_offset_left(&self) -> f32 {
        self.margin.left + self.border.left + self.padding.left
    }

    #[inline]
    pub fn content_offset_right(&self) -> f32 {
        self.margin.right + self.border.right + self.padding.right
    }

    #[inline]
    pub fn content_offset_top(&self) -> f32 {
        self.margin.top + self.border.top + self.padding.top
    }

    #[inline]
    pub fn content_offset_bottom(&self) -> f32 {
        self.margin.bottom + self.border.bottom + self.padding.bottom
    }

    /// Horizontal margin + border + padding.
    #[inline]
    pub fn content_offset_width(&self) -> f32 {
        self.content_offset_left() + self.content_offset_right()
    }

    /// Vertical margin + border + padding.
    #[inline]
    pub fn content_offset_height(&self) -> f32 {
        self.content_offset_top() + self.content_offset_bottom()
    }

    /// Horizontal border + padding (what `box-sizing: border-box` subtracts).
    #[inline]
    pub fn box_sizing_width(&self) -> f32 {
        self.border.horizontal() + self.padding.horizontal()
    }

    #[inline]
    pub fn box_sizing_height(&self) -> f32 {
        self.border.vertical() + self.padding.vertical()
    }
}

/// Resolve margin/padding/border widths against the containing block width.
///
/// `auto` margins resolve to zero here; auto-margin distribution happens in
/// layout. Padding and border widths are clamped to be non-negative. Margins can
/// be negative. Vertical percentages also resolve against the width.
/// Spec: CSS 2.2 §8.1 (box model), §8.3 and §8.4.
pub fn resolve_box_sides(
    margin: &Edges<Length>,
    padding: &Edges<Length>,
    border: &Edges<f32>,
    percent_base: f32,
) -> BoxSides {
    BoxSides {
        margin: margin.map(|length| length.px_or(percent_base, 0.0)),
        padding: padding.map(|length| length.px_or(percent_base, 0.0).max(0.0)),
        border: border.map(|width| width.max(0.0)),
    }
}
