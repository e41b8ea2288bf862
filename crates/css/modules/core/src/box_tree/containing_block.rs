//! Containing block context handed from a box to its children.
//!
//! Spec: CSS 2.2 §10.1 Definition of "containing block"
//! <https://www.w3.org/TR/CSS22/visudet.html#containing-block-details>

use crate::cache::LayoutKey;
use css_box::{BoxSides, Length};
use style_engine::{BoxSizing, ComputedStyle};

/// How a [`TypedPixel`] was obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelKind {
    /// No constraint (`max-width: none`).
    #[default]
    None,
    /// Depends on content; `value` is the space available, if any.
    Auto,
    Percentage,
    Absolute,
}

/// A dimension together with how definite it is.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TypedPixel {
    pub value: f32,
    pub kind: PixelKind,
}

impl TypedPixel {
    #[inline]
    pub const fn none() -> Self {
        Self {
            value: 0.0,
            kind: PixelKind::None,
        }
    }

    #[inline]
    pub const fn auto(value: f32) -> Self {
        Self {
            value,
            kind: PixelKind::Auto,
        }
    }

    #[inline]
    pub const fn absolute(value: f32) -> Self {
        Self {
            value,
            kind: PixelKind::Absolute,
        }
    }

    #[inline]
    pub const fn is_definite(self) -> bool {
        matches!(self.kind, PixelKind::Absolute | PixelKind::Percentage)
    }

    #[inline]
    pub const fn definite(self) -> Option<f32> {
        if self.is_definite() {
            Some(self.value)
        } else {
            None
        }
    }

    /// Resolve a specified length; `auto` yields `fallback`.
    fn from_length(length: Length, percent_base: f32, fallback: Self) -> Self {
        match length {
            Length::Auto => fallback,
            Length::Px(pixels) => Self::absolute(pixels),
            Length::Percent(percent) => Self {
                value: percent_base * percent / 100.0,
                kind: PixelKind::Percentage,
            },
        }
    }

    #[inline]
    fn shrink(mut self, amount: f32) -> Self {
        if self.kind != PixelKind::None {
            self.value = (self.value - amount).max(0.0);
        }
        self
    }
}

/// Size-mode flags of a containing block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SizeMode(u32);

impl SizeMode {
    pub const NORMAL: Self = Self(0);
    /// The box's margin box must be exactly `render_width` wide.
    pub const EXACT_WIDTH: Self = Self(0x01);
    /// The box's margin box must be exactly `height` tall.
    pub const EXACT_HEIGHT: Self = Self(0x02);
    /// Measuring content only.
    pub const CONTENT: Self = Self(0x04);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0 && other.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// The space a box is laid out in, and the limits it resolves for its own
/// content.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContainingBlock {
    pub width: TypedPixel,
    pub height: TypedPixel,
    /// Content width after `box-sizing`. Under [`SizeMode::EXACT_WIDTH`] it
    /// is the exact margin-box width of the box, while `width` stays the
    /// percentage base.
    pub render_width: TypedPixel,
    pub min_width: TypedPixel,
    pub max_width: TypedPixel,
    pub min_height: TypedPixel,
    pub max_height: TypedPixel,
    pub size_mode: SizeMode,
}

impl ContainingBlock {
    /// A containing block of `width` and, when known, `height`.
    #[inline]
    pub fn new(width: f32, height: Option<f32>) -> Self {
        let width = TypedPixel::absolute(width.max(0.0));
        Self {
            width,
            height: height.map_or(TypedPixel::auto(0.0), |value| TypedPixel::absolute(value.max(0.0))),
            render_width: width,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_size_mode(mut self, size_mode: SizeMode) -> Self {
        self.size_mode = size_mode;
        self
    }

    #[inline]
    pub const fn definite_height(&self) -> Option<f32> {
        self.height.definite()
    }

    /// A containing block of `percent_base` in which the box's margin box is
    /// exactly `margin_box_width` wide.
    #[inline]
    pub fn exact_width(margin_box_width: f32, percent_base: f32, height: Option<f32>) -> Self {
        Self {
            render_width: TypedPixel::absolute(margin_box_width.max(0.0)),
            ..Self::new(percent_base, height)
        }
        .with_size_mode(SizeMode::EXACT_WIDTH)
    }

    /// Cache key of a layout performed in this containing block.
    #[inline]
    pub fn key(&self) -> LayoutKey {
        let width = if self.size_mode.contains(SizeMode::EXACT_WIDTH) {
            self.render_width.value
        } else {
            self.width.value
        };
        LayoutKey::new(width, self.definite_height(), self.size_mode.bits())
    }

    /// The context a box with `style` and `sides`, laid out in `self`, hands
    /// to its own children.
    ///
    /// Widths and heights are content-box sizes. A percentage height against
    /// an indefinite containing-block height computes to `auto`, except for
    /// out-of-flow boxes, whose containing block is always definite.
    pub fn for_box(&self, style: &ComputedStyle, sides: &BoxSides, out_of_flow: bool) -> Self {
        let sizing_width = if style.box_sizing == BoxSizing::BorderBox {
            sides.box_sizing_width()
        } else {
            0.0
        };
        let sizing_height = if style.box_sizing == BoxSizing::BorderBox {
            sides.box_sizing_height()
        } else {
            0.0
        };
        let percent_width = self.width.value;
        let height_base = self.height.definite();

        let width = if self.size_mode.contains(SizeMode::EXACT_WIDTH) {
            TypedPixel::absolute((self.render_width.value - sides.content_offset_width()).max(0.0))
        } else {
            TypedPixel::from_length(
                style.width,
                percent_width,
                TypedPixel::auto((self.width.value - sides.content_offset_width()).max(0.0)),
            )
            .shrink(if style.width.is_auto() { 0.0 } else { sizing_width })
        };

        let resolve_height = |length: Length, fallback: TypedPixel| match (length, height_base) {
            (Length::Percent(_), None) if !out_of_flow => fallback,
            (_, base) => {
                TypedPixel::from_length(length, base.unwrap_or(self.height.value), fallback)
            }
        };
        let height = if self.size_mode.contains(SizeMode::EXACT_HEIGHT) {
            TypedPixel::absolute((self.height.value - sides.content_offset_height()).max(0.0))
        } else {
            let resolved = resolve_height(style.height, TypedPixel::auto(0.0));
            if resolved.is_definite() {
                resolved.shrink(sizing_height)
            } else {
                resolved
            }
        };

        let limit = |length: Length, base: f32, sizing: f32| {
            TypedPixel::from_length(length, base, TypedPixel::none()).shrink(sizing)
        };
        let min_height = match resolve_height(style.min_height, TypedPixel::none()) {
            pixel if pixel.is_definite() => pixel.shrink(sizing_height),
            _ => TypedPixel::none(),
        };
        let max_height = match resolve_height(style.max_height, TypedPixel::none()) {
            pixel if pixel.is_definite() => pixel.shrink(sizing_height),
            _ => TypedPixel::none(),
        };

        Self {
            width,
            height,
            render_width: width,
            min_width: limit(style.min_width, percent_width, sizing_width),
            max_width: limit(style.max_width, percent_width, sizing_width),
            min_height,
            max_height,
            size_mode: SizeMode::NORMAL,
        }
    }

    /// Apply `max-width` then `min-width`; the minimum wins.
    #[inline]
    pub fn clamp_width(&self, width: f32) -> f32 {
        clamp(width, self.min_width, self.max_width)
    }

    /// Apply `max-height` then `min-height`; the minimum wins.
    #[inline]
    pub fn clamp_height(&self, height: f32) -> f32 {
        clamp(height, self.min_height, self.max_height)
    }
}

fn clamp(value: f32, min: TypedPixel, max: TypedPixel) -> f32 {
    let capped = max.definite().map_or(value, |limit| value.min(limit));
    min.definite().map_or(capped, |floor| capped.max(floor)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_box::{Edges, resolve_box_sides};

    fn sides_of(style: &ComputedStyle, base: f32) -> BoxSides {
        resolve_box_sides(&style.margin, &style.padding, &style.border_width, base)
    }

    /// Auto width fills the space left after margins, borders and padding.
    ///
    /// # Panics
    /// Panics if the available width is wrong.
    #[test]
    fn auto_width_is_available_space() {
        let mut style = ComputedStyle::default();
        style.margin = Edges::all(Length::Px(10.0));
        style.padding = Edges::all(Length::Px(5.0));
        let parent = ContainingBlock::new(400.0, None);
        let child = parent.for_box(&style, &sides_of(&style, 400.0), false);
        assert_eq!(child.width.kind, PixelKind::Auto);
        assert!((child.width.value - 370.0).abs() < f32::EPSILON);
    }

    /// Border-box sizing subtracts padding and borders from definite sizes.
    ///
    /// # Panics
    /// Panics if box-sizing is ignored.
    #[test]
    fn border_box_sizing() {
        let mut style = ComputedStyle::default();
        style.width = Length::Percent(50.0);
        style.height = Length::Px(100.0);
        style.padding = Edges::all(Length::Px(10.0));
        style.border_width = Edges::all(2.0);
        style.box_sizing = BoxSizing::BorderBox;
        let parent = ContainingBlock::new(400.0, Some(300.0));
        let child = parent.for_box(&style, &sides_of(&style, 400.0), false);
        assert_eq!(child.width.kind, PixelKind::Percentage);
        assert!((child.width.value - 176.0).abs() < f32::EPSILON);
        assert!((child.height.value - 76.0).abs() < f32::EPSILON);
    }

    /// Percentage heights against an auto height compute to auto, except
    /// for out-of-flow boxes.
    ///
    /// # Panics
    /// Panics if a percentage height resolves against an auto height.
    #[test]
    fn percentage_height_needs_definite_base() {
        let mut style = ComputedStyle::default();
        style.height = Length::Percent(50.0);
        style.max_height = Length::Percent(10.0);
        let auto_parent = ContainingBlock::new(400.0, None);
        let child = auto_parent.for_box(&style, &BoxSides::default(), false);
        assert!(!child.height.is_definite());
        assert_eq!(child.max_height.kind, PixelKind::None);

        let definite_parent = ContainingBlock::new(400.0, Some(200.0));
        let positioned = definite_parent.for_box(&style, &BoxSides::default(), true);
        assert_eq!(positioned.height.definite(), Some(100.0));
        assert!((positioned.clamp_height(150.0) - 20.0).abs() < f32::EPSILON);
    }

    /// Exact sizes override the style.
    ///
    /// # Panics
    /// Panics if an exact size is not honored.
    #[test]
    fn exact_size_overrides_style() {
        let mut style = ComputedStyle::default();
        style.width = Length::Px(50.0);
        style.margin = Edges::all(Length::Px(4.0));
        let parent = ContainingBlock::new(120.0, Some(60.0))
            .with_size_mode(SizeMode::EXACT_WIDTH.union(SizeMode::EXACT_HEIGHT));
        let child = parent.for_box(&style, &sides_of(&style, 120.0), false);
        assert_eq!(child.width.definite(), Some(112.0));
        assert_eq!(child.height.definite(), Some(52.0));
        assert!(parent.size_mode.contains(SizeMode::EXACT_WIDTH));
        assert!(!SizeMode::NORMAL.contains(SizeMode::NORMAL));

        // Percentages keep resolving against the containing block.
        style.padding.left = Length::Percent(10.0);
        let wide = ContainingBlock::exact_width(100.0, 400.0, None);
        let child = wide.for_box(&style, &sides_of(&style, 400.0), false);
        assert_eq!(child.width.definite(), Some(52.0));
        assert_eq!(wide.key(), LayoutKey::new(100.0, None, SizeMode::EXACT_WIDTH.bits()));
    }

    /// The minimum wins over the maximum.
    ///
    /// # Panics
    /// Panics if clamping order is wrong.
    #[test]
    fn min_wins_over_max() {
        let mut style = ComputedStyle::default();
        style.min_width = Length::Px(100.0);
        style.max_width = Length::Px(80.0);
        let child = ContainingBlock::new(400.0, None).for_box(&style, &BoxSides::default(), false);
        assert!((child.clamp_width(300.0) - 100.0).abs() < f32::EPSILON);
        assert!((child.clamp_width(10.0) - 100.0).abs() < f32::EPSILON);
    }
}
