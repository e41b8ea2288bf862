//! Block flow: vertical stacking, sibling margin collapsing, clearance and
//! floats.
//!
//! Spec: CSS 2.2 §9.4.1 Block formatting contexts
//! <https://www.w3.org/TR/CSS22/visuren.html#block-formatting>

use super::{FormattingContext, LayoutPass};
use crate::box_tree::{ContainingBlock, MarginStrut, RenderId, RenderItem, TypedPixel};
use crate::context::LayoutAborted;
use crate::host::DocumentContainer;
use style_engine::Clear;

impl<C: DocumentContainer + ?Sized> LayoutPass<'_, C> {
    /// Lay out the children of `id` inside a content box `width` wide.
    /// Returns the content height they need.
    pub(super) fn layout_children(
        &mut self,
        id: RenderId,
        width: f32,
        own: &ContainingBlock,
        context: &mut FormattingContext,
        depth: usize,
    ) -> Result<f32, LayoutAborted> {
        let Some(container) = self.tree.get(id) else {
            return Ok(0.0);
        };
        let children = container.children.clone();
        let strut = container.style.font.line_height;
        let inline = children
            .iter()
            .any(|child| self.tree.get(*child).is_some_and(RenderItem::is_inline_level));
        if inline {
            return self.layout_inline(&children, width, strut, context, depth);
        }

        let child_block = ContainingBlock {
            width: TypedPixel::absolute(width),
            height: own
                .height
                .definite()
                .map_or(TypedPixel::auto(0.0), TypedPixel::absolute),
            render_width: TypedPixel::absolute(width),
            ..ContainingBlock::default()
        };
        let mut cursor = 0.0_f32;
        let mut pending = MarginStrut::default();
        for child in children {
            let Some(item) = self.tree.get(child) else {
                continue;
            };
            if item.is_out_of_flow() {
                // Static position; resolved once the pass has sized everything.
                let static_y = cursor + pending.collapse();
                self.render(child, 0.0, static_y, &child_block, context, false, depth + 1)?;
                continue;
            }
            if item.is_float() {
                let float_type = item.style.float;
                let top = cursor + pending.collapse();
                self.render(child, 0.0, 0.0, &child_block, context, false, depth + 1)?;
                let Some(margin_box) = self.tree.get(child).map(RenderItem::margin_box) else {
                    continue;
                };
                let (float_x, float_y) = context.place_float(
                    child,
                    float_type,
                    margin_box.width,
                    margin_box.height,
                    top,
                    width,
                );
                self.offset_box(child, float_x, float_y);
                continue;
            }

            let margin_top = item.style.margin.top.px_or(width, 0.0);
            let margin_bottom = item.style.margin.bottom.px_or(width, 0.0);
            let clear = item.style.clear;
            let beside_floats = item.establishes_bfc() && !context.exclusions().is_empty();

            let mut collapsed = pending;
            collapsed.append(margin_top);
            let mut y = cursor + collapsed.collapse() - margin_top;
            if clear != Clear::None {
                let clearance = context.clearance(clear);
                if y + margin_top < clearance {
                    y = clearance - margin_top;
                }
            }
            let height = if beside_floats {
                let (left, right) = context.line_span(y + margin_top, width);
                let narrowed = ContainingBlock::new(right - left, own.height.definite());
                self.render(child, left, y, &narrowed, context, false, depth + 1)?
            } else {
                self.render(child, 0.0, y, &child_block, context, false, depth + 1)?
            };
            cursor = y + height - margin_bottom;
            pending = MarginStrut::with_margin(margin_bottom);
        }
        Ok((cursor + pending.collapse()).max(0.0))
    }
}
