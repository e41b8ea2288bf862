//! Grid layout algorithm.
//!
//! Spec: §12 Grid Sizing
//! <https://www.w3.org/TR/css-grid-2/#layout-algorithm>

use crate::placement::{GridArea, place_grid_items};
use crate::track_sizing::{
    collapse_empty_tracks, expand_track_list, position_tracks, size_tracks, span_size,
};
use crate::types::{GridItem, GridTrack, TrackList};

/// Self-alignment of an item within its cell, per axis.
///
/// Spec: §11 Alignment and Spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridAlignment {
    /// Defer to the container's `justify-items` / `align-items`
    #[default]
    Auto,
    /// Start alignment
    Start,
    /// End alignment
    End,
    /// Center alignment
    Center,
    /// Stretch to fill
    Stretch,
}

impl GridAlignment {
    /// Resolve `auto` against the container default; an `auto` default stretches.
    #[inline]
    pub const fn resolve(self, container: Self) -> Self {
        match (self, container) {
            (Self::Auto, Self::Auto) => Self::Stretch,
            (Self::Auto, default) => default,
            (own, _) => own,
        }
    }

    /// Offset of an item of `item` size inside a cell of `cell` size.
    #[inline]
    pub fn offset(self, cell: f32, item: f32) -> f32 {
        match self {
            Self::Center => (cell - item) / 2.0,
            Self::End => cell - item,
            Self::Auto | Self::Start | Self::Stretch => 0.0,
        }
    }
}

/// Measurements the layout engine provides for grid items.
///
/// Both calls may lay the item out; the engine must keep them free of side
/// effects beyond the item's own box metrics.
pub trait GridMeasure<NodeId> {
    /// Min-content and max-content margin-box widths.
    fn content_widths(&mut self, node: &NodeId) -> (f32, f32);

    /// Margin-box height when laid out at margin-box `width`. `exact` is set
    /// when the width is forced by stretch alignment.
    fn height_for_width(&mut self, node: &NodeId, width: f32, exact: bool) -> f32;
}

/// Input parameters for grid layout.
#[derive(Debug, Clone)]
pub struct GridContainerInputs {
    /// Column tracks definition
    pub columns: TrackList,
    /// Row tracks definition
    pub rows: TrackList,
    pub column_gap: f32,
    pub row_gap: f32,
    /// Inner width of the container
    pub available_width: f32,
    /// Inner height of the container, `None` when it depends on content
    pub available_height: Option<f32>,
    /// Justify items in their grid area (inline axis)
    pub justify_items: GridAlignment,
    /// Align items in their grid area (block axis)
    pub align_items: GridAlignment,
}

impl GridContainerInputs {
    /// Create a new grid container inputs with default values.
    pub fn new(columns: TrackList, rows: TrackList, available_width: f32) -> Self {
        Self {
            columns,
            rows,
            column_gap: 0.0,
            row_gap: 0.0,
            available_width,
            available_height: None,
            justify_items: GridAlignment::Auto,
            align_items: GridAlignment::Auto,
        }
    }

    #[must_use]
    pub const fn with_gaps(mut self, column_gap: f32, row_gap: f32) -> Self {
        self.column_gap = column_gap;
        self.row_gap = row_gap;
        self
    }
}

/// A grid item with its final position and size.
#[derive(Debug, Clone)]
pub struct GridPlacedItem<NodeId = usize> {
    /// Node identifier (generic to support different node ID types)
    pub node_id: NodeId,
    /// Grid area occupied
    pub area: GridArea,
    /// Margin-box position relative to the grid origin
    pub x: f32,
    pub y: f32,
    /// Margin-box size
    pub width: f32,
    pub height: f32,
    /// The item must be rendered at exactly `width` / `height`.
    pub exact_width: bool,
    pub exact_height: bool,
}

/// Result of grid layout computation.
#[derive(Debug, Clone)]
pub struct GridLayoutResult<NodeId = usize> {
    /// Placed items in placement order (`order`, then source order)
    pub items: Vec<GridPlacedItem<NodeId>>,
    /// Resolved columns
    pub columns: Vec<GridTrack>,
    /// Resolved rows
    pub rows: Vec<GridTrack>,
    /// Total width consumed by the grid
    pub total_width: f32,
    /// Total height consumed by the grid
    pub total_height: f32,
}

impl<NodeId> GridLayoutResult<NodeId> {
    /// Resolved column sizes in order.
    pub fn column_sizes(&self) -> Vec<f32> {
        self.columns.iter().map(|track| track.base_size).collect()
    }

    /// Resolved row sizes in order.
    pub fn row_sizes(&self) -> Vec<f32> {
        self.rows.iter().map(|track| track.base_size).collect()
    }
}

/// Per-item measurements carried between the sizing steps.
struct Measured {
    justify: GridAlignment,
    align: GridAlignment,
    min_width: f32,
    max_width: f32,
    width: f32,
    exact_width: bool,
    height: f32,
}

fn grow_tracks(tracks: &mut Vec<GridTrack>, count: usize) {
    while tracks.len() < count {
        tracks.push(GridTrack::auto());
    }
}

/// Run the grid layout algorithm.
///
/// Spec: §12.1 Grid Sizing Algorithm
/// <https://www.w3.org/TR/css-grid-2/#algo-grid-sizing>
///
/// 1. Expands auto-repeats against the available width/height
/// 2. Places items (explicit first, then auto-placement)
/// 3. Sizes columns from min/max-content contributions and free space
/// 4. Measures item heights at their column widths, then sizes rows
/// 5. Aligns each item inside its cell
pub fn layout_grid<NodeId: Clone, M: GridMeasure<NodeId>>(
    items: &[GridItem<NodeId>],
    inputs: &GridContainerInputs,
    measure: &mut M,
) -> GridLayoutResult<NodeId> {
    let mut columns = expand_track_list(&inputs.columns, inputs.available_width, inputs.column_gap);
    if columns.is_empty() {
        columns.push(GridTrack::auto());
    }
    let mut rows = expand_track_list(
        &inputs.rows,
        inputs.available_height.unwrap_or(0.0),
        inputs.row_gap,
    );

    let placement = place_grid_items(items, columns.len(), rows.len());
    grow_tracks(&mut columns, placement.col_count);
    grow_tracks(&mut rows, placement.row_count);
    collapse_empty_tracks(&mut columns, |index| {
        placement
            .areas
            .iter()
            .any(|area| area.col_start <= index && index < area.col_end)
    });
    collapse_empty_tracks(&mut rows, |index| {
        placement
            .areas
            .iter()
            .any(|area| area.row_start <= index && index < area.row_end)
    });

    // Columns: intrinsic width contributions of single-span items.
    let mut measured: Vec<Measured> = Vec::with_capacity(items.len());
    for (item, area) in items.iter().zip(&placement.areas) {
        let (min_width, max_width) = item.width.map_or_else(
            || measure.content_widths(&item.node_id),
            |width| (width, width),
        );
        if area.col_span() == 1
            && let Some(track) = columns.get_mut(area.col_start)
        {
            track.contribute(min_width, max_width);
        }
        measured.push(Measured {
            justify: item.justify_self.resolve(inputs.justify_items),
            align: item.align_self.resolve(inputs.align_items),
            min_width,
            max_width,
            width: 0.0,
            exact_width: false,
            height: 0.0,
        });
    }
    size_tracks(&mut columns, Some(inputs.available_width), inputs.column_gap);
    position_tracks(&mut columns, inputs.column_gap);

    // Rows: heights measured at the final item widths.
    for ((item, area), entry) in items.iter().zip(&placement.areas).zip(&mut measured) {
        let cell_width = span_size(&columns, area.col_start, area.col_end);
        (entry.width, entry.exact_width) = match item.width {
            Some(width) => (width, false),
            None if entry.justify == GridAlignment::Stretch => (cell_width, true),
            None => (entry.max_width.min(cell_width).max(entry.min_width), false),
        };
        let measured_height =
            measure.height_for_width(&item.node_id, entry.width, entry.exact_width);
        entry.height = item.height.unwrap_or(measured_height);
        if area.row_span() == 1
            && let Some(track) = rows.get_mut(area.row_start)
        {
            track.contribute(entry.height, entry.height);
        }
    }
    size_tracks(&mut rows, inputs.available_height, inputs.row_gap);
    position_tracks(&mut rows, inputs.row_gap);

    let mut placed = Vec::with_capacity(items.len());
    for &index in &placement.order {
        let (Some(item), Some(area), Some(entry)) = (
            items.get(index),
            placement.areas.get(index),
            measured.get(index),
        ) else {
            continue;
        };
        let cell_x = columns.get(area.col_start).map_or(0.0, |track| track.position);
        let cell_y = rows.get(area.row_start).map_or(0.0, |track| track.position);
        let cell_width = span_size(&columns, area.col_start, area.col_end);
        let cell_height = span_size(&rows, area.row_start, area.row_end);
        let exact_height = item.height.is_none() && entry.align == GridAlignment::Stretch;
        let height = if exact_height {
            cell_height
        } else {
            entry.height
        };
        tracing::trace!(
            "layout_grid: item {} area {:?} cell {}x{} at ({}, {})",
            index,
            area,
            cell_width,
            cell_height,
            cell_x,
            cell_y
        );
        placed.push(GridPlacedItem {
            node_id: item.node_id.clone(),
            area: *area,
            x: cell_x + entry.justify.offset(cell_width, entry.width),
            y: cell_y + entry.align.offset(cell_height, height),
            width: entry.width,
            height,
            exact_width: entry.exact_width,
            exact_height,
        });
    }

    let total_width = columns.iter().map(GridTrack::end).fold(0.0, f32::max);
    let total_height = rows.iter().map(GridTrack::end).fold(0.0, f32::max);
    tracing::debug!(
        "layout_grid: {} items, {} columns, {} rows, {}x{}",
        placed.len(),
        columns.len(),
        rows.len(),
        total_width,
        total_height
    );

    GridLayoutResult {
        items: placed,
        columns,
        rows,
        total_width,
        total_height,
    }
}
