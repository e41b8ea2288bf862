//! Intrinsic (min-content / max-content) widths.
//!
//! Spec: CSS Sizing 3 §5 Intrinsic Size Determination
//! <https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes>

use super::LayoutPass;
use crate::box_tree::{BoxKind, ContainingBlock, RenderId, RenderItem};
use crate::host::DocumentContainer;
use css_box::{BoxSides, resolve_box_sides};
use log::trace;
use std::sync::Arc;

impl<C: DocumentContainer + ?Sized> LayoutPass<'_, C> {
    /// Min-content and max-content margin-box widths of `id` measured
    /// against a containing block `containing_width` wide.
    pub(crate) fn intrinsic_widths(
        &mut self,
        id: RenderId,
        containing_width: f32,
        depth: usize,
    ) -> (f32, f32) {
        let Some(item) = self.tree.get(id) else {
            return (0.0, 0.0);
        };
        if depth > self.context.config().max_depth {
            return (0.0, 0.0);
        }
        let generation = self.context.generation();
        // Damage drops this cache when recorded, so a current entry was
        // measured after it.
        if self.context.config().layout_cache_enabled
            && let Some(widths) = item.width_cache.get(containing_width, generation)
        {
            self.context.stats_mut().width_hits += 1;
            return widths;
        }

        let style = Arc::clone(&item.style);
        let kind = item.kind.clone();
        let children = item.children.clone();
        let inline = children
            .iter()
            .any(|child| self.tree.get(*child).is_some_and(RenderItem::is_inline_level));
        let out_of_flow = item.is_out_of_flow();
        self.context.stats_mut().width_misses += 1;

        let sides = if matches!(kind, BoxKind::Text(_) | BoxKind::Inline) {
            BoxSides::default()
        } else {
            resolve_box_sides(&style.margin, &style.padding, &style.border_width, containing_width)
        };
        let own = ContainingBlock::new(containing_width, None).for_box(&style, &sides, out_of_flow);
        let (min_content, max_content) = if let Some(width) = own.width.definite() {
            (width, width)
        } else {
            match &kind {
                BoxKind::Text(text) => self.text_widths(text, &style),
                BoxKind::Replaced => {
                    let (width, _) = self.replaced_size(id, &own);
                    (width, width)
                }
                BoxKind::Container | BoxKind::Inline | BoxKind::Grid => {
                    let mut min_content = 0.0_f32;
                    let mut max_content = 0.0_f32;
                    let mut line = 0.0_f32;
                    let side_by_side = inline || matches!(kind, BoxKind::Grid);
                    for child in children {
                        let Some(child_item) = self.tree.get(child) else {
                            continue;
                        };
                        if child_item.is_out_of_flow() {
                            continue;
                        }
                        let float = child_item.is_float();
                        let (child_min, child_max) =
                            self.intrinsic_widths(child, own.width.value, depth + 1);
                        min_content = min_content.max(child_min);
                        if side_by_side || float {
                            line += child_max;
                        } else {
                            max_content = max_content.max(child_max);
                        }
                    }
                    (min_content, max_content.max(line))
                }
            }
        };
        let min_content = own.clamp_width(min_content);
        let max_content = own.clamp_width(max_content).max(min_content);
        let offsets = sides.content_offset_width();
        let widths = (min_content + offsets, max_content + offsets);
        trace!("intrinsic_widths: {id:?} in {containing_width} -> {widths:?}");
        if let Some(target) = self.tree.get_mut(id) {
            target.width_cache.store(containing_width, widths, generation);
        }
        widths
    }
}
