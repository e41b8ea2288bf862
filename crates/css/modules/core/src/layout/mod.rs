//! Layout passes over the render tree.
//!
//! Spec: CSS 2.2 §10 Visual formatting model details
//!   - <https://www.w3.org/TR/CSS22/visudet.html>
//!
//! [`LayoutPass`] borrows the render tree, the layout context, the element
//! arena and the host for the duration of one pass. `render` places a box's
//! margin box at `(x, y)` in its parent's content coordinates and returns the
//! margin-box height.

mod block;
mod grid;
mod inline;
mod intrinsic;
mod positioned;
mod replaced;

use crate::box_tree::{
    BoxKind, ContainingBlock, ExclusionSpace, RenderId, RenderItem, RenderTree, SizeMode,
};
use crate::cache::CachedLayout;
use crate::context::{LayoutAborted, LayoutContext};
use crate::element::Element;
use crate::host::DocumentContainer;
use css_box::{BoxSides, Length, Rect, resolve_box_sides};
use indextree::Arena;
use log::{trace, warn};
use std::sync::Arc;
use style_engine::{Clear, ComputedStyle, Float, Position};

/// Float bookkeeping of one block formatting context.
///
/// Exclusions are stored relative to the content box of the box that
/// established the context; `origin` is the content origin of the box
/// currently being laid out, in the same coordinates.
#[derive(Clone, Debug, Default)]
pub struct FormattingContext {
    exclusions: ExclusionSpace,
    origin_x: f32,
    origin_y: f32,
}

impl FormattingContext {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub const fn exclusions(&self) -> &ExclusionSpace {
        &self.exclusions
    }

    /// Content origin of the box being laid out.
    #[inline]
    pub const fn origin(&self) -> (f32, f32) {
        (self.origin_x, self.origin_y)
    }

    #[inline]
    pub(crate) fn enter(&mut self, dx: f32, dy: f32) {
        self.origin_x += dx;
        self.origin_y += dy;
    }

    #[inline]
    pub(crate) fn leave(&mut self, dx: f32, dy: f32) {
        self.origin_x -= dx;
        self.origin_y -= dy;
    }

    /// Free horizontal span `(left, right)` at `y` inside the current box of
    /// content width `width`, in the box's own coordinates.
    pub fn line_span(&self, y: f32, width: f32) -> (f32, f32) {
        if self.exclusions.is_empty() {
            return (0.0, width);
        }
        let (start, available) = self
            .exclusions
            .available_inline_size_at_offset(y + self.origin_y, self.origin_x + width);
        let left = (start - self.origin_x).max(0.0);
        let right = (start + available - self.origin_x).min(width);
        (left, right.max(left))
    }

    /// Place a float margin box of `width` x `height` no higher than `y` in
    /// a box of content width `container_width`. Returns local coordinates.
    pub(crate) fn place_float(
        &mut self,
        render_id: RenderId,
        float_type: Float,
        width: f32,
        height: f32,
        y: f32,
        container_width: f32,
    ) -> (f32, f32) {
        let (float_x, float_y) = self.exclusions.place_float(
            render_id,
            float_type,
            width,
            height,
            y + self.origin_y,
            self.origin_x + container_width,
        );
        let x = (float_x - self.origin_x).clamp(0.0, (container_width - width).max(0.0));
        (x, float_y - self.origin_y)
    }

    /// Lowest position a box with `clear` may start at, locally.
    #[inline]
    pub fn clearance(&self, clear: Clear) -> f32 {
        self.exclusions.clearance_offset(clear) - self.origin_y
    }

    /// Bottom of the deepest float, locally.
    #[inline]
    pub fn float_bottom(&self) -> f32 {
        self.exclusions.last_float_bottom() - self.origin_y
    }
}

/// One layout pass.
pub(crate) struct LayoutPass<'doc, C: DocumentContainer + ?Sized> {
    pub(crate) tree: &'doc mut RenderTree,
    pub(crate) context: &'doc mut LayoutContext,
    pub(crate) arena: &'doc Arena<Element>,
    pub(crate) host: &'doc mut C,
}

impl<C: DocumentContainer + ?Sized> LayoutPass<'_, C> {
    /// Lay out the whole tree from `root` at `width` and resolve every
    /// positioned box. Returns the root's margin-box height.
    pub(crate) fn run(&mut self, root: RenderId, width: f32) -> Result<f32, LayoutAborted> {
        let viewport = self.context.viewport();
        let containing_block = ContainingBlock::new(width, Some(viewport.height));
        let mut context = FormattingContext::new();
        let height = self.render(root, 0.0, 0.0, &containing_block, &mut context, false, 0)?;
        let out_of_flow = self.fetch_positioned(root);
        self.render_positioned(&out_of_flow, width)?;
        Ok(height)
    }

    fn item(&self, id: RenderId) -> Option<&RenderItem> {
        self.tree.get(id)
    }

    /// Lay out box `id` with its margin box at `(x, y)`.
    ///
    /// Repeated calls with the same inputs and no damage in between produce
    /// the same metrics; boxes that establish their own formatting context
    /// answer from their layout cache.
    #[allow(
        clippy::too_many_arguments,
        reason = "Mirrors the render entry point: position, context and pass flag"
    )]
    pub(crate) fn render(
        &mut self,
        id: RenderId,
        x: f32,
        y: f32,
        containing_block: &ContainingBlock,
        context: &mut FormattingContext,
        second_pass: bool,
        depth: usize,
    ) -> Result<f32, LayoutAborted> {
        self.context.checkpoint(&mut *self.host)?;
        let Some(item) = self.item(id) else {
            return Ok(0.0);
        };
        if depth > self.context.config().max_depth {
            warn!("render: depth ceiling reached at {id:?}, not descending");
            if let Some(target) = self.tree.get_mut(id) {
                target.pos = Rect::new(x, y, 0.0, 0.0);
                target.sides = BoxSides::default();
            }
            return Ok(0.0);
        }

        let style = Arc::clone(&item.style);
        let kind = item.kind.clone();
        let grid_item = self.is_grid_item(id);
        let own_context = item.establishes_bfc() || grid_item;
        let cacheable = self.context.config().layout_cache_enabled
            && (own_context || item.children.is_empty());
        let shrink = item.is_float() || item.is_atomic_inline() || item.is_out_of_flow();
        let auto_margins = !shrink && !item.is_inline_level() && !grid_item;
        let mut sides = if matches!(kind, BoxKind::Text(_) | BoxKind::Inline) {
            BoxSides::default()
        } else {
            resolve_box_sides(
                &style.margin,
                &style.padding,
                &style.border_width,
                containing_block.width.value,
            )
        };
        let own = containing_block.for_box(&style, &sides, item.is_out_of_flow());
        let key = containing_block.key();
        let generation = self.context.generation();
        let cached = if cacheable && !item.damage.needs_layout() {
            item.layout_cache.get(key, generation)
        } else {
            None
        };

        let (width, height) = if let Some(hit) = cached {
            self.context.stats_mut().layout_hits += 1;
            trace!("render: cache hit for {id:?} (second pass: {second_pass})");
            if auto_margins {
                apply_auto_margins(&style, &mut sides, hit.width, containing_block);
            }
            (hit.width, hit.height)
        } else {
            if cacheable {
                self.context.stats_mut().layout_misses += 1;
            }
            let (width, height) = match &kind {
                BoxKind::Replaced => self.replaced_size(id, &own),
                BoxKind::Text(text) => {
                    let width = self.text_widths(text, &style).1;
                    (own.clamp_width(width), style.font.line_height)
                }
                BoxKind::Grid | BoxKind::Container | BoxKind::Inline => {
                    let offsets = sides.content_offset_width();
                    let width = self.used_width(id, &own, containing_block, shrink, offsets, depth)?;
                    if auto_margins {
                        apply_auto_margins(&style, &mut sides, width, containing_block);
                    }
                    let content_height = if matches!(kind, BoxKind::Grid) {
                        self.layout_grid_container(id, width, &own, depth)?
                    } else if own_context {
                        let mut local = FormattingContext::new();
                        let height = self.layout_children(id, width, &own, &mut local, depth)?;
                        height.max(local.float_bottom())
                    } else {
                        let dx = x + sides.content_offset_left();
                        let dy = y + sides.content_offset_top();
                        context.enter(dx, dy);
                        let height = self.layout_children(id, width, &own, context, depth);
                        context.leave(dx, dy);
                        height?
                    };
                    let height = own.height.definite().unwrap_or(content_height);
                    (width, own.clamp_height(height))
                }
            };
            if auto_margins && matches!(kind, BoxKind::Replaced) {
                apply_auto_margins(&style, &mut sides, width, containing_block);
            }
            if cacheable {
                let output = CachedLayout {
                    width,
                    height,
                    min_width: 0.0,
                };
                if let Some(target) = self.tree.get_mut(id) {
                    target.store_layout(key, output, generation);
                }
            }
            (width, height)
        };

        let (shift_x, shift_y) = relative_shift(&style, containing_block);
        if let Some(target) = self.tree.get_mut(id) {
            target.pos = Rect::new(
                x + sides.content_offset_left() + shift_x,
                y + sides.content_offset_top() + shift_y,
                width,
                height,
            );
            target.sides = sides;
            if style.position == Position::Relative {
                target.insets.left = shift_x;
                target.insets.top = shift_y;
                target.insets.right = -shift_x;
                target.insets.bottom = -shift_y;
            }
        }
        Ok(height + sides.content_offset_height())
    }

    fn is_grid_item(&self, id: RenderId) -> bool {
        self.item(id)
            .and_then(|item| item.parent)
            .and_then(|parent| self.item(parent))
            .is_some_and(|parent| parent.kind == BoxKind::Grid)
    }

    /// Content width of a non-replaced box: definite, shrink-to-fit or the
    /// available width, then clamped. `offsets` is the horizontal margin,
    /// border and padding the intrinsic widths include.
    ///
    /// Spec: CSS 2.2 §10.3.5 Floating, non-replaced elements
    fn used_width(
        &mut self,
        id: RenderId,
        own: &ContainingBlock,
        containing_block: &ContainingBlock,
        shrink: bool,
        offsets: f32,
        depth: usize,
    ) -> Result<f32, LayoutAborted> {
        if let Some(width) = own.width.definite() {
            return Ok(own.clamp_width(width));
        }
        let available = own.width.value;
        if !shrink || own.size_mode.contains(SizeMode::EXACT_WIDTH) {
            return Ok(own.clamp_width(available));
        }
        let (min_content, max_content) =
            self.intrinsic_widths(id, containing_block.width.value, depth);
        let preferred = available
            .max(min_content - offsets)
            .min(max_content - offsets)
            .max(0.0);
        Ok(own.clamp_width(preferred))
    }

    /// Move a laid-out box by `(dx, dy)`.
    pub(crate) fn offset_box(&mut self, id: RenderId, dx: f32, dy: f32) {
        if let Some(item) = self.tree.get_mut(id) {
            item.pos = item.pos.translate(dx, dy);
        }
    }
}

/// Distribute the free space of a block with `auto` horizontal margins.
///
/// Spec: CSS 2.2 §10.3.3 Block-level, non-replaced elements in normal flow
fn apply_auto_margins(
    style: &ComputedStyle,
    sides: &mut BoxSides,
    width: f32,
    containing_block: &ContainingBlock,
) {
    let left_auto = style.margin.left.is_auto();
    let right_auto = style.margin.right.is_auto();
    if !left_auto && !right_auto {
        return;
    }
    let free = containing_block.width.value
        - width
        - sides.box_sizing_width()
        - sides.margin.horizontal();
    match (left_auto, right_auto) {
        (true, true) => {
            let half = (free / 2.0).max(0.0);
            sides.margin.left = half;
            sides.margin.right = half;
        }
        (true, false) => sides.margin.left = free.max(0.0),
        _ => sides.margin.right = free.max(0.0),
    }
}

/// Offset of a relatively positioned box; `left` wins over `right` and `top`
/// over `bottom`.
///
/// Spec: CSS 2.2 §9.4.3 Relative positioning
fn relative_shift(style: &ComputedStyle, containing_block: &ContainingBlock) -> (f32, f32) {
    if style.position != Position::Relative {
        return (0.0, 0.0);
    }
    let width = containing_block.width.value;
    let height = containing_block.definite_height();
    let horizontal = match (style.inset.left, style.inset.right) {
        (Length::Auto, Length::Auto) => 0.0,
        (Length::Auto, right) => -right.px_or(width, 0.0),
        (left, _) => left.px_or(width, 0.0),
    };
    let vertical_inset = |length: Length| match (length, height) {
        (Length::Percent(_), None) => 0.0,
        (length, base) => length.px_or(base.unwrap_or(0.0), 0.0),
    };
    let vertical = match (style.inset.top, style.inset.bottom) {
        (Length::Auto, Length::Auto) => 0.0,
        (Length::Auto, bottom) => -vertical_inset(bottom),
        (top, _) => vertical_inset(top),
    };
    (horizontal, vertical)
}
