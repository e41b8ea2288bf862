//! Grid containers: builds grid items from child styles, measures them
//! through [`GridMeasure`] and renders them into their cells.

use super::{FormattingContext, LayoutPass};
use crate::box_tree::{ContainingBlock, RenderId, SizeMode};
use crate::context::LayoutAborted;
use crate::host::DocumentContainer;
use css_box::{Length, resolve_box_sides};
use css_grid::{
    GridAlignment, GridContainerInputs, GridItem, GridMeasure, layout_grid, parse_track_list,
};
use log::debug;
use std::sync::Arc;
use style_engine::{BoxSizing, ComputedStyle, SelfAlign};

const fn grid_alignment(align: SelfAlign) -> GridAlignment {
    match align {
        SelfAlign::Auto | SelfAlign::Normal => GridAlignment::Auto,
        SelfAlign::Stretch => GridAlignment::Stretch,
        SelfAlign::Start => GridAlignment::Start,
        SelfAlign::End => GridAlignment::End,
        SelfAlign::Center => GridAlignment::Center,
    }
}

/// Item measurement during grid sizing. Every measurement renders the item
/// at the width the grid will use, so the final render answers from cache.
struct ItemMeasure<'pass, 'doc, C: DocumentContainer + ?Sized> {
    pass: &'pass mut LayoutPass<'doc, C>,
    containing_width: f32,
    depth: usize,
    aborted: Option<LayoutAborted>,
}

impl<C: DocumentContainer + ?Sized> GridMeasure<RenderId> for ItemMeasure<'_, '_, C> {
    fn content_widths(&mut self, node: &RenderId) -> (f32, f32) {
        self.pass.intrinsic_widths(*node, self.containing_width, self.depth)
    }

    fn height_for_width(&mut self, node: &RenderId, width: f32, _exact: bool) -> f32 {
        if self.aborted.is_some() {
            return 0.0;
        }
        let cell = ContainingBlock::exact_width(width, width, None);
        let mut context = FormattingContext::new();
        match self
            .pass
            .render(*node, 0.0, 0.0, &cell, &mut context, false, self.depth)
        {
            Ok(height) => height,
            Err(aborted) => {
                self.aborted = Some(aborted);
                0.0
            }
        }
    }
}

/// Definite border-box size in px plus margins, as the grid expects it.
fn definite_size(length: Length, margins: f32, sizing: f32, style: &ComputedStyle) -> Option<f32> {
    match length {
        Length::Px(pixels) if style.box_sizing == BoxSizing::BorderBox => {
            Some(pixels + margins)
        }
        Length::Px(pixels) => Some(pixels + sizing + margins),
        Length::Auto | Length::Percent(_) => None,
    }
}

impl<C: DocumentContainer + ?Sized> LayoutPass<'_, C> {
    /// Lay out the grid container `id` with a content box `width` wide.
    /// Returns its content height.
    ///
    /// Spec: CSS Grid 2 §12 Grid Sizing
    pub(super) fn layout_grid_container(
        &mut self,
        id: RenderId,
        width: f32,
        own: &ContainingBlock,
        depth: usize,
    ) -> Result<f32, LayoutAborted> {
        let Some(container) = self.tree.get(id) else {
            return Ok(0.0);
        };
        let style = Arc::clone(&container.style);
        let children = container.children.clone();
        let font_size = style.font.font_size;

        let mut items = Vec::with_capacity(children.len());
        let mut out_of_flow = Vec::new();
        for child in children {
            let Some(item) = self.tree.get(child) else {
                continue;
            };
            if item.is_out_of_flow() {
                out_of_flow.push(child);
                continue;
            }
            let child_style = &item.style;
            let sides = resolve_box_sides(
                &child_style.margin,
                &child_style.padding,
                &child_style.border_width,
                width,
            );
            let mut grid_item = GridItem::new(child, items.len())
                .with_columns(child_style.grid_column_start, child_style.grid_column_end)
                .with_rows(child_style.grid_row_start, child_style.grid_row_end)
                .with_order(child_style.order)
                .with_alignment(
                    grid_alignment(child_style.justify_self),
                    grid_alignment(child_style.align_self),
                );
            grid_item.width = definite_size(
                child_style.width,
                sides.margin.horizontal(),
                sides.box_sizing_width(),
                child_style,
            );
            grid_item.height = definite_size(
                child_style.height,
                sides.margin.vertical(),
                sides.box_sizing_height(),
                child_style,
            );
            items.push(grid_item);
        }

        let mut inputs = GridContainerInputs::new(
            parse_track_list(&style.grid_template_columns, font_size),
            parse_track_list(&style.grid_template_rows, font_size),
            width,
        )
        .with_gaps(style.column_gap, style.row_gap);
        inputs.available_height = own.height.definite();
        inputs.justify_items = grid_alignment(style.justify_items);
        inputs.align_items = grid_alignment(style.align_items);

        let mut measure = ItemMeasure {
            pass: self,
            containing_width: width,
            depth: depth + 1,
            aborted: None,
        };
        let result = layout_grid(&items, &inputs, &mut measure);
        if let Some(aborted) = measure.aborted {
            return Err(aborted);
        }

        for placed in &result.items {
            // A stretched item is rendered at exactly its cell height, which
            // its descendants see as a definite height.
            let cell = if placed.exact_height {
                ContainingBlock::exact_width(placed.width, placed.width, Some(placed.height))
                    .with_size_mode(SizeMode::EXACT_WIDTH.union(SizeMode::EXACT_HEIGHT))
            } else {
                ContainingBlock::exact_width(placed.width, placed.width, None)
            };
            let mut context = FormattingContext::new();
            self.render(placed.node_id, placed.x, placed.y, &cell, &mut context, false, depth + 1)?;
        }
        for child in out_of_flow {
            let mut context = FormattingContext::new();
            let static_block = ContainingBlock::new(width, own.height.definite());
            self.render(child, 0.0, 0.0, &static_block, &mut context, false, depth + 1)?;
        }
        debug!(
            "layout_grid_container: {id:?} {} items, {}x{}",
            result.items.len(),
            result.total_width,
            result.total_height
        );
        Ok(own.height.definite().unwrap_or(result.total_height))
    }
}
