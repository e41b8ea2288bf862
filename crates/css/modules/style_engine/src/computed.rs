//! Computed style model consumed by layout.
//!
//! Values are already resolved to pixels, percentages or `auto`; layout never
//! parses CSS text.

use core::hash::{Hash, Hasher};
use css_box::{Edges, Length};
use std::collections::hash_map::DefaultHasher;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Display {
    None,
    #[default]
    Block,
    Inline,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    Table,
}

impl Display {
    /// Participates in block flow as a block-level box.
    #[inline]
    pub const fn is_block_level(self) -> bool {
        matches!(self, Self::Block | Self::Flex | Self::Grid | Self::Table)
    }

    /// Participates in an inline formatting context.
    #[inline]
    pub const fn is_inline_level(self) -> bool {
        matches!(
            self,
            Self::Inline | Self::InlineBlock | Self::InlineFlex | Self::InlineGrid
        )
    }

    /// Inline-level box laid out as a unit (not split across lines).
    #[inline]
    pub const fn is_atomic_inline(self) -> bool {
        matches!(self, Self::InlineBlock | Self::InlineFlex | Self::InlineGrid)
    }

    #[inline]
    pub const fn is_grid(self) -> bool {
        matches!(self, Self::Grid | Self::InlineGrid)
    }

    #[inline]
    pub const fn is_flex(self) -> bool {
        matches!(self, Self::Flex | Self::InlineFlex)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    /// Absolute and fixed boxes are taken out of flow.
    #[inline]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }

    /// Anything but `static`.
    #[inline]
    pub const fn is_positioned(self) -> bool {
        !matches!(self, Self::Static)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Clear {
    #[default]
    None,
    Left,
    Right,
    Both,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoxSizing {
    #[default]
    ContentBox,
    BorderBox,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

impl Overflow {
    /// Whether the box clips and may scroll its content.
    #[inline]
    pub const fn is_scroll_container(self) -> bool {
        !matches!(self, Self::Visible)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// `justify-*` / `align-*` values for items and self alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelfAlign {
    #[default]
    Auto,
    Normal,
    Stretch,
    Start,
    End,
    Center,
}

/// Font metrics in pixels, as reported by the host font system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    pub font_size: f32,
    pub line_height: f32,
    pub x_height: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl Default for FontMetrics {
    #[inline]
    fn default() -> Self {
        Self {
            font_size: 16.0,
            line_height: 20.0,
            x_height: 8.0,
            ascent: 13.0,
            descent: 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub position: Position,
    pub float: Float,
    pub clear: Clear,
    pub box_sizing: BoxSizing,
    pub overflow: Overflow,
    pub visibility: Visibility,

    pub width: Length,
    pub height: Length,
    pub min_width: Length,
    pub min_height: Length,
    /// `Auto` means `none`.
    pub max_width: Length,
    /// `Auto` means `none`.
    pub max_height: Length,

    pub margin: Edges<Length>,
    pub padding: Edges<Length>,
    pub border_width: Edges<f32>,
    /// `top` / `right` / `bottom` / `left` insets.
    pub inset: Edges<Length>,

    pub z_index: Option<i32>,
    pub opacity: f32,

    /// Raw `grid-template-columns` track list.
    pub grid_template_columns: String,
    /// Raw `grid-template-rows` track list.
    pub grid_template_rows: String,
    pub column_gap: f32,
    pub row_gap: f32,
    /// Grid line placement; 0 is `auto`, negative `end` values are spans.
    pub grid_column_start: i32,
    pub grid_column_end: i32,
    pub grid_row_start: i32,
    pub grid_row_end: i32,
    pub order: i32,
    pub justify_items: SelfAlign,
    pub align_items: SelfAlign,
    pub justify_self: SelfAlign,
    pub align_self: SelfAlign,

    pub font: FontMetrics,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            position: Position::Static,
            float: Float::None,
            clear: Clear::None,
            box_sizing: BoxSizing::ContentBox,
            overflow: Overflow::Visible,
            visibility: Visibility::Visible,
            width: Length::Auto,
            height: Length::Auto,
            min_width: Length::Px(0.0),
            min_height: Length::Px(0.0),
            max_width: Length::Auto,
            max_height: Length::Auto,
            margin: Edges::all(Length::Px(0.0)),
            padding: Edges::all(Length::Px(0.0)),
            border_width: Edges::all(0.0),
            inset: Edges::all(Length::Auto),
            z_index: None,
            opacity: 1.0,
            grid_template_columns: String::new(),
            grid_template_rows: String::new(),
            column_gap: 0.0,
            row_gap: 0.0,
            grid_column_start: 0,
            grid_column_end: 0,
            grid_row_start: 0,
            grid_row_end: 0,
            order: 0,
            justify_items: SelfAlign::Normal,
            align_items: SelfAlign::Normal,
            justify_self: SelfAlign::Auto,
            align_self: SelfAlign::Auto,
            font: FontMetrics::default(),
        }
    }
}

fn hash_length<H: Hasher>(length: Length, state: &mut H) {
    length.hash_bits().hash(state);
}

fn hash_length_edges<H: Hasher>(edges: &Edges<Length>, state: &mut H) {
    for length in [edges.top, edges.right, edges.bottom, edges.left] {
        hash_length(length, state);
    }
}

impl ComputedStyle {
    /// Stable content hash; floats hash by bit pattern.
    pub fn style_hash(&self) -> u64 {
        let mut state = DefaultHasher::new();
        self.display.hash(&mut state);
        self.position.hash(&mut state);
        self.float.hash(&mut state);
        self.clear.hash(&mut state);
        self.box_sizing.hash(&mut state);
        self.overflow.hash(&mut state);
        self.visibility.hash(&mut state);
        for length in [
            self.width,
            self.height,
            self.min_width,
            self.min_height,
            self.max_width,
            self.max_height,
        ] {
            hash_length(length, &mut state);
        }
        hash_length_edges(&self.margin, &mut state);
        hash_length_edges(&self.padding, &mut state);
        hash_length_edges(&self.inset, &mut state);
        for width in [
            self.border_width.top,
            self.border_width.right,
            self.border_width.bottom,
            self.border_width.left,
        ] {
            width.to_bits().hash(&mut state);
        }
        self.z_index.hash(&mut state);
        self.opacity.to_bits().hash(&mut state);
        self.grid_template_columns.hash(&mut state);
        self.grid_template_rows.hash(&mut state);
        self.column_gap.to_bits().hash(&mut state);
        self.row_gap.to_bits().hash(&mut state);
        (
            self.grid_column_start,
            self.grid_column_end,
            self.grid_row_start,
            self.grid_row_end,
            self.order,
        )
            .hash(&mut state);
        (
            self.justify_items,
            self.align_items,
            self.justify_self,
            self.align_self,
        )
            .hash(&mut state);
        for metric in [
            self.font.font_size,
            self.font.line_height,
            self.font.x_height,
            self.font.ascent,
            self.font.descent,
        ] {
            metric.to_bits().hash(&mut state);
        }
        state.finish()
    }

    /// Whether the box establishes a stacking context on its own.
    #[inline]
    pub fn creates_stacking_context(&self) -> bool {
        self.position.is_positioned()
            || self.opacity < 1.0
            || self.display.is_grid()
            || self.display.is_flex()
    }

    /// The z-index used for paint ordering; `auto` sorts with zero.
    #[inline]
    pub fn z_order(&self) -> i32 {
        self.z_index.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Equal styles hash equally, and a changed field changes the hash.
    ///
    /// # Panics
    /// Panics if the hash ignores a field.
    #[test]
    fn style_hash_tracks_content() {
        let base = ComputedStyle::default();
        let same = ComputedStyle::default();
        assert_eq!(base.style_hash(), same.style_hash());

        let mut wider = ComputedStyle::default();
        wider.width = Length::Px(10.0);
        assert_ne!(base.style_hash(), wider.style_hash());

        let mut gridded = ComputedStyle::default();
        gridded.grid_template_columns = "1fr 1fr".to_owned();
        assert_ne!(base.style_hash(), gridded.style_hash());
    }

    /// Stacking context triggers.
    ///
    /// # Panics
    /// Panics if a trigger is missed.
    #[test]
    fn stacking_context_triggers() {
        let mut style = ComputedStyle::default();
        assert!(!style.creates_stacking_context());
        style.opacity = 0.5;
        assert!(style.creates_stacking_context());
        style.opacity = 1.0;
        style.display = Display::Grid;
        assert!(style.creates_stacking_context());
    }
}
