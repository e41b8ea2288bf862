//! Positioned boxes: stacking-context registration and the absolute /
//! fixed positioning pass that runs once the normal flow is sized.
//!
//! Spec: CSS 2.2 §10.3.7 / §10.6.4 Absolutely positioned, non-replaced
//! elements
//! <https://www.w3.org/TR/CSS22/visudet.html#abs-non-replaced-width>

use super::{FormattingContext, LayoutPass};
use crate::box_tree::{ContainingBlock, RenderId, SizeMode, TypedPixel};
use crate::context::LayoutAborted;
use crate::host::DocumentContainer;
use core::mem;
use css_box::{Edges, Length, Rect, resolve_box_sides};
use log::{debug, warn};
use std::sync::Arc;

/// One axis of an absolutely positioned box. Offsets are measured from the
/// containing block's padding edge; `size` is the content size.
#[derive(Clone, Copy, Debug)]
struct Axis {
    start: Option<f32>,
    end: Option<f32>,
    size: Option<f32>,
    margin_start: Option<f32>,
    margin_end: Option<f32>,
    /// Border and padding on both sides.
    sides: f32,
    container: f32,
    static_start: f32,
}

/// Used values of one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Solved {
    start: f32,
    size: f32,
    margin_start: f32,
    margin_end: f32,
}

impl Solved {
    fn end(&self, axis: &Axis) -> f32 {
        axis.container - self.start - self.margin_start - self.margin_end - axis.sides - self.size
    }
}

impl Axis {
    /// Solve the constraint `start + margins + sides + size + end =
    /// container`. `fit` sizes an auto box from the space available to it;
    /// `clamp` applies min/max.
    fn solve(&self, fit: impl Fn(f32) -> f32, clamp: impl Fn(f32) -> f32) -> Solved {
        let margin_start = self.margin_start.unwrap_or(0.0);
        let margin_end = self.margin_end.unwrap_or(0.0);
        let margins = margin_start + margin_end;
        let room = |used: f32| self.container - used - margins - self.sides;
        let mut solved = Solved {
            start: 0.0,
            size: 0.0,
            margin_start,
            margin_end,
        };
        match (self.start, self.size, self.end) {
            (None, None, None) => {
                solved.start = self.static_start;
                solved.size = clamp(fit(room(self.static_start)));
            }
            (None, None, Some(end)) => {
                solved.size = clamp(fit(room(end)));
                solved.start = room(end) - solved.size;
            }
            (Some(start), None, None) => {
                solved.start = start;
                solved.size = clamp(fit(room(start)));
            }
            (Some(start), None, Some(end)) => {
                solved.start = start;
                solved.size = clamp(room(start + end).max(0.0));
            }
            (None, Some(size), None) => {
                solved.start = self.static_start;
                solved.size = clamp(size);
            }
            (None, Some(size), Some(end)) => {
                solved.size = clamp(size);
                solved.start = room(end) - solved.size;
            }
            (Some(start), Some(size), None) => {
                solved.start = start;
                solved.size = clamp(size);
            }
            (Some(start), Some(size), Some(end)) => {
                solved.start = start;
                solved.size = clamp(size);
                let free = room(start + end) - solved.size;
                match (self.margin_start, self.margin_end) {
                    (None, None) if free >= 0.0 => {
                        solved.margin_start = free / 2.0;
                        solved.margin_end = free / 2.0;
                    }
                    (None, None) => {
                        solved.margin_start = 0.0;
                        solved.margin_end = free;
                    }
                    (None, Some(_)) => solved.margin_start = free,
                    (Some(_), None) => solved.margin_end = free,
                    // Over-constrained: `end` is ignored.
                    (Some(_), Some(_)) => {}
                }
            }
        }
        solved
    }
}

fn inset(length: Length, base: f32) -> Option<f32> {
    length.resolve(base)
}

fn margin(length: Length, base: f32) -> Option<f32> {
    if length.is_auto() {
        None
    } else {
        Some(length.px_or(base, 0.0))
    }
}

impl<C: DocumentContainer + ?Sized> LayoutPass<'_, C> {
    /// Register every positioned box with its nearest stacking-context
    /// ancestor, sorted by z-index, and return the out-of-flow boxes in
    /// tree order.
    pub(crate) fn fetch_positioned(&mut self, root: RenderId) -> Vec<RenderId> {
        let ceiling = self.context.config().max_positioned_depth;
        for id in self.tree.ids() {
            if let Some(item) = self.tree.get_mut(id) {
                item.positioned.clear();
            }
        }

        let mut out_of_flow = Vec::new();
        let mut contexts = Vec::new();
        let mut stack = vec![(root, root, 0_usize)];
        let mut truncated = false;
        while let Some((id, context, depth)) = stack.pop() {
            let Some(item) = self.tree.get(id) else {
                continue;
            };
            let positioned =
                id != root && item.element.is_some() && item.style.position.is_positioned();
            if item.is_out_of_flow() && id != root {
                out_of_flow.push(id);
            }
            let children_context = if item.creates_stacking_context() {
                contexts.push(id);
                id
            } else {
                context
            };
            if depth >= ceiling {
                truncated = true;
            } else {
                stack.extend(
                    item.children
                        .iter()
                        .rev()
                        .map(|child| (*child, children_context, depth + 1)),
                );
            }
            if positioned && let Some(owner) = self.tree.get_mut(context) {
                owner.positioned.push(id);
            }
        }
        if truncated {
            warn!("fetch_positioned: depth ceiling {ceiling} reached, deeper boxes ignored");
        }

        for context in contexts {
            let Some(mut list) = self
                .tree
                .get_mut(context)
                .map(|item| mem::take(&mut item.positioned))
            else {
                continue;
            };
            list.sort_by_key(|id| self.tree.get(*id).map_or(0, |item| item.style.z_order()));
            if let Some(item) = self.tree.get_mut(context) {
                item.positioned = list;
            }
        }
        out_of_flow
    }

    /// Resolve offsets and sizes of absolutely and fixed positioned boxes.
    /// Ancestors come before descendants in `ids`.
    pub(crate) fn render_positioned(
        &mut self,
        ids: &[RenderId],
        initial_width: f32,
    ) -> Result<(), LayoutAborted> {
        for id in ids {
            self.position_box(*id, initial_width)?;
        }
        Ok(())
    }

    /// Padding box of the containing block of the out-of-flow box `id`,
    /// in the coordinates of `id`'s parent content box.
    fn positioned_containing_block(&self, id: RenderId, initial_width: f32) -> Rect {
        let viewport = self.context.viewport();
        let Some(item) = self.tree.get(id) else {
            return Rect::default();
        };
        if item.is_fixed() {
            return Rect::new(0.0, 0.0, viewport.width, viewport.height);
        }
        let (parent_x, parent_y, _) = self.tree.origin_of(id);
        let mut cursor = item.parent;
        while let Some(ancestor_id) = cursor {
            let Some(ancestor) = self.tree.get(ancestor_id) else {
                break;
            };
            if ancestor.element.is_some() && ancestor.style.position.is_positioned() {
                let (origin_x, origin_y) = if ancestor.is_fixed() {
                    (0.0, 0.0)
                } else {
                    let (x, y, _) = self.tree.origin_of(ancestor_id);
                    (x, y)
                };
                return ancestor
                    .padding_box()
                    .translate(origin_x - parent_x, origin_y - parent_y);
            }
            cursor = ancestor.parent;
        }
        Rect::new(-parent_x, -parent_y, initial_width, viewport.height)
    }

    fn position_box(&mut self, id: RenderId, initial_width: f32) -> Result<(), LayoutAborted> {
        let block = self.positioned_containing_block(id, initial_width);
        let Some(item) = self.tree.get(id) else {
            return Ok(());
        };
        let style = Arc::clone(&item.style);
        let fixed = item.is_fixed();
        let depth = self.tree.depth_of(id);

        // Static position: where the normal flow put the margin box.
        let flow_box = item.margin_box();
        let (static_x, static_y) = if fixed {
            let (parent_x, parent_y, in_fixed) = self.tree.origin_of(id);
            let (scroll_x, scroll_y) = if in_fixed {
                (0.0, 0.0)
            } else {
                self.context.scroll()
            };
            (
                flow_box.x + parent_x - scroll_x,
                flow_box.y + parent_y - scroll_y,
            )
        } else {
            (flow_box.x, flow_box.y)
        };

        let sides = resolve_box_sides(&style.margin, &style.padding, &style.border_width, block.width);
        let own = ContainingBlock::new(block.width, Some(block.height)).for_box(&style, &sides, true);
        let horizontal = Axis {
            start: inset(style.inset.left, block.width),
            end: inset(style.inset.right, block.width),
            size: own.width.definite(),
            margin_start: margin(style.margin.left, block.width),
            margin_end: margin(style.margin.right, block.width),
            sides: sides.box_sizing_width(),
            container: block.width,
            static_start: static_x - block.x,
        };
        let (min_content, max_content) = if horizontal.size.is_none() {
            let outer = sides.content_offset_width();
            let (min_content, max_content) = self.intrinsic_widths(id, block.width, depth);
            (min_content - outer, max_content - outer)
        } else {
            (0.0, 0.0)
        };
        let across = horizontal.solve(
            |available| available.max(min_content).min(max_content).max(0.0),
            |width| own.clamp_width(width),
        );

        let exact = ContainingBlock {
            width: TypedPixel::absolute(block.width),
            height: TypedPixel::absolute(block.height),
            render_width: TypedPixel::absolute(
                across.size + horizontal.sides + sides.margin.horizontal(),
            ),
            ..ContainingBlock::default()
        }
        .with_size_mode(SizeMode::EXACT_WIDTH);
        // The flow render used the parent's content box; redo it when the
        // used width or anything resolved against the containing block moved.
        let rendered = self.tree.get(id).map(|current| (current.pos, current.sides));
        let stale = rendered.is_none_or(|(pos, rendered_sides)| {
            (pos.width - across.size).abs() > f32::EPSILON
                || rendered_sides != sides
                || own
                    .height
                    .definite()
                    .is_some_and(|height| (pos.height - height).abs() > f32::EPSILON)
        });
        if stale {
            let mut context = FormattingContext::new();
            self.render(id, 0.0, 0.0, &exact, &mut context, true, depth)?;
            self.context.stats_mut().second_passes += 1;
        }
        let content_height = self.tree.get(id).map_or(0.0, |current| current.pos.height);

        let vertical = Axis {
            start: inset(style.inset.top, block.height),
            end: inset(style.inset.bottom, block.height),
            size: own.height.definite(),
            margin_start: margin(style.margin.top, block.width),
            margin_end: margin(style.margin.bottom, block.width),
            sides: sides.box_sizing_height(),
            container: block.height,
            static_start: static_y - block.y,
        };
        let down = vertical.solve(|_| content_height, |height| own.clamp_height(height));

        let Some(target) = self.tree.get_mut(id) else {
            return Ok(());
        };
        target.sides.margin.left = across.margin_start;
        target.sides.margin.right = across.margin_end;
        target.sides.margin.top = down.margin_start;
        target.sides.margin.bottom = down.margin_end;
        let border = target.sides.border;
        let padding = target.sides.padding;
        target.pos = Rect::new(
            block.x + across.start + across.margin_start + border.left + padding.left,
            block.y + down.start + down.margin_start + border.top + padding.top,
            across.size,
            down.size,
        );
        target.insets = Edges {
            top: down.start,
            right: across.end(&horizontal),
            bottom: down.end(&vertical),
            left: across.start,
        };
        debug!("position_box: {id:?} at {:?} in {block:?}", target.pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(start: Option<f32>, size: Option<f32>, end: Option<f32>) -> Axis {
        Axis {
            start,
            end,
            size,
            margin_start: Some(0.0),
            margin_end: Some(0.0),
            sides: 10.0,
            container: 400.0,
            static_start: 50.0,
        }
    }

    /// All-auto offsets keep the static position and shrink to fit.
    ///
    /// # Panics
    /// Panics if the static position is lost.
    #[test]
    fn all_auto_uses_static_position() {
        let solved = axis(None, None, None).solve(|available| available.min(120.0), |size| size);
        assert!((solved.start - 50.0).abs() < f32::EPSILON);
        assert!((solved.size - 120.0).abs() < f32::EPSILON);
    }

    /// Both offsets set with an auto size stretches the box.
    ///
    /// # Panics
    /// Panics if the box is not stretched between its offsets.
    #[test]
    fn offsets_stretch_auto_size() {
        let solved = axis(Some(20.0), None, Some(30.0)).solve(|_| 0.0, |size| size);
        assert!((solved.size - 340.0).abs() < f32::EPSILON);
        assert!((solved.end(&axis(Some(20.0), None, Some(30.0))) - 30.0).abs() < f32::EPSILON);
    }

    /// Only `end` set: the box is placed from the far edge.
    ///
    /// # Panics
    /// Panics if the start offset is not derived from `end`.
    #[test]
    fn end_anchored_box() {
        let solved = axis(None, Some(100.0), Some(40.0)).solve(|_| 0.0, |size| size);
        assert!((solved.start - 250.0).abs() < f32::EPSILON);
    }

    /// Auto margins split the free space when everything else is set, and
    /// a negative remainder goes to the end margin.
    ///
    /// # Panics
    /// Panics if the margins are not distributed.
    #[test]
    fn auto_margins_center() {
        let mut centered = axis(Some(0.0), Some(190.0), Some(0.0));
        centered.margin_start = None;
        centered.margin_end = None;
        let solved = centered.solve(|_| 0.0, |size| size);
        assert!((solved.margin_start - 100.0).abs() < f32::EPSILON);
        assert!((solved.margin_end - 100.0).abs() < f32::EPSILON);

        centered.size = Some(500.0);
        let solved = centered.solve(|_| 0.0, |size| size);
        assert!((solved.margin_start - 0.0).abs() < f32::EPSILON);
        assert!((solved.margin_end + 110.0).abs() < f32::EPSILON);
    }
}
