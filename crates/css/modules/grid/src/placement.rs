//! Grid item placement algorithm.
//!
//! Spec: §8 Placing Grid Items
//! <https://www.w3.org/TR/css-grid-2/#placement>

use crate::types::GridItem;

/// Auto-placement gives up scanning past this many rows.
pub const MAX_AUTO_ROWS: usize = 1000;

/// Explicit lines and spans are clamped so that no axis has more tracks
/// than this.
pub const MAX_GRID_LINES: usize = 1000;

/// Area occupied by a grid item, as 0-based track indices (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridArea {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl GridArea {
    /// Create a new grid area.
    #[inline]
    pub const fn new(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> Self {
        Self {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    /// Get the row span (number of rows occupied).
    #[inline]
    pub const fn row_span(&self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    /// Get the column span (number of columns occupied).
    #[inline]
    pub const fn col_span(&self) -> usize {
        self.col_end.saturating_sub(self.col_start)
    }

    /// Check if this area overlaps with another area.
    #[inline]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.row_start < other.row_end
            && self.row_end > other.row_start
            && self.col_start < other.col_end
            && self.col_end > other.col_start
    }
}

/// Outcome of placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridPlacement {
    /// Area of each item, indexed like the input items.
    pub areas: Vec<GridArea>,
    /// Item indices in placement order: by `order`, then source order.
    pub order: Vec<usize>,
    /// Column count, grown past the template by explicit lines.
    pub col_count: usize,
    /// Row count, grown past the template by placed items.
    pub row_count: usize,
}

/// Resolved placement along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisPlacement {
    Definite(usize, usize),
    Auto(usize),
}

/// Resolve specified lines: positive lines are 1-based, a negative end is a
/// span added to the start. Every track index stays below
/// [`MAX_GRID_LINES`].
fn resolve_axis(start: i32, end: i32) -> AxisPlacement {
    let span = |value: i32| {
        usize::try_from(value.unsigned_abs())
            .unwrap_or(1)
            .clamp(1, MAX_GRID_LINES)
    };
    if start > 0 {
        let first = (span(start) - 1).min(MAX_GRID_LINES - 1);
        let last = match end {
            e if e > 0 => span(e) - 1,
            e if e < 0 => first.saturating_add(span(e)),
            _ => first + 1,
        };
        return AxisPlacement::Definite(first, last.max(first + 1).min(MAX_GRID_LINES));
    }
    if end > 0 {
        // Auto start against a definite end line occupies the track before it.
        let last = span(end) - 1;
        if last > 0 {
            return AxisPlacement::Definite(last - 1, last);
        }
        return AxisPlacement::Auto(1);
    }
    AxisPlacement::Auto(if end < 0 { span(end) } else { 1 })
}

/// Row-major occupancy grid that grows by rows.
struct Occupancy {
    cols: usize,
    cells: Vec<bool>,
}

impl Occupancy {
    fn new(cols: usize, rows: usize) -> Self {
        let mut occupancy = Self {
            cols,
            cells: Vec::new(),
        };
        occupancy.ensure_rows(rows);
        occupancy
    }

    fn rows(&self) -> usize {
        self.cells.len() / self.cols.max(1)
    }

    fn ensure_rows(&mut self, rows: usize) {
        if rows <= self.rows() {
            return;
        }
        match rows.checked_mul(self.cols) {
            Some(len) => self.cells.resize(len, false),
            None => tracing::warn!("Occupancy: {rows} rows of {} columns overflow", self.cols),
        }
    }

    fn is_free(&self, area: &GridArea) -> bool {
        if area.col_end > self.cols {
            return false;
        }
        (area.row_start..area.row_end).all(|row| {
            (area.col_start..area.col_end).all(|col| {
                !self
                    .cells
                    .get(row * self.cols + col)
                    .copied()
                    .unwrap_or(false)
            })
        })
    }

    fn mark(&mut self, area: &GridArea) {
        self.ensure_rows(area.row_end);
        for row in area.row_start..area.row_end {
            for col in area.col_start..area.col_end.min(self.cols) {
                if let Some(cell) = self.cells.get_mut(row * self.cols + col) {
                    *cell = true;
                }
            }
        }
    }
}

/// Place grid items according to the grid placement algorithm.
///
/// Spec: §8.5 Grid Item Placement Algorithm
/// <https://www.w3.org/TR/css-grid-2/#auto-placement-algo>
///
/// Items are stably sorted by (`order`, source order). Items with a definite
/// row and column are placed first, then items locked to one axis, then the
/// rest are auto-placed row-major from a moving cursor. Rows grow as needed;
/// columns grow only for explicit lines past the template, and auto-placed
/// spans are clamped to the column count.
pub fn place_grid_items<NodeId>(
    items: &[GridItem<NodeId>],
    template_cols: usize,
    template_rows: usize,
) -> GridPlacement {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&index| {
        items
            .get(index)
            .map_or((0, index), |item| (item.order, item.source_order))
    });

    let resolved: Vec<(AxisPlacement, AxisPlacement)> = items
        .iter()
        .map(|item| {
            (
                resolve_axis(item.row_start, item.row_end),
                resolve_axis(item.col_start, item.col_end),
            )
        })
        .collect();

    let col_count = resolved
        .iter()
        .filter_map(|(_, col)| match *col {
            AxisPlacement::Definite(_, end) => Some(end),
            AxisPlacement::Auto(_) => None,
        })
        .fold(template_cols.clamp(1, MAX_GRID_LINES), usize::max);
    let template_rows = template_rows.min(MAX_GRID_LINES);

    let mut occupancy = Occupancy::new(col_count, template_rows);
    let mut areas = vec![GridArea::new(0, 1, 0, 1); items.len()];
    let mut pending = Vec::new();

    // Fully definite items.
    for &index in &order {
        let Some(&(row, col)) = resolved.get(index) else {
            continue;
        };
        if let (AxisPlacement::Definite(row_start, row_end), AxisPlacement::Definite(col_start, col_end)) =
            (row, col)
        {
            let area = GridArea::new(row_start, row_end, col_start, col_end);
            occupancy.mark(&area);
            if let Some(slot) = areas.get_mut(index) {
                *slot = area;
            }
        } else {
            pending.push(index);
        }
    }

    // Items locked to a row or column search along the other axis.
    let mut auto_items = Vec::new();
    for index in pending {
        let Some(&(row, col)) = resolved.get(index) else {
            continue;
        };
        let area = match (row, col) {
            (AxisPlacement::Definite(row_start, row_end), AxisPlacement::Auto(span)) => {
                let span = span.min(col_count);
                (0..=col_count - span)
                    .map(|col_start| GridArea::new(row_start, row_end, col_start, col_start + span))
                    .find(|candidate| occupancy.is_free(candidate))
                    .unwrap_or(GridArea::new(row_start, row_end, 0, span))
            }
            (AxisPlacement::Auto(span), AxisPlacement::Definite(col_start, col_end)) => {
                let mut row_start = 0;
                loop {
                    let candidate = GridArea::new(row_start, row_start + span, col_start, col_end);
                    occupancy.ensure_rows(candidate.row_end);
                    if occupancy.is_free(&candidate) || row_start >= MAX_AUTO_ROWS {
                        break candidate;
                    }
                    row_start += 1;
                }
            }
            _ => {
                auto_items.push(index);
                continue;
            }
        };
        occupancy.mark(&area);
        if let Some(slot) = areas.get_mut(index) {
            *slot = area;
        }
    }

    // Fully automatic items, row-major from a moving cursor.
    let mut cursor_row = 0;
    let mut cursor_col = 0;
    for index in auto_items {
        let Some(&(AxisPlacement::Auto(row_span), AxisPlacement::Auto(col_span))) =
            resolved.get(index)
        else {
            continue;
        };
        let col_span = col_span.min(col_count);
        let area = loop {
            if cursor_row > MAX_AUTO_ROWS {
                tracing::warn!("place_grid_items: no free cell within {MAX_AUTO_ROWS} rows");
                let row_start = occupancy.rows();
                break GridArea::new(row_start, row_start + row_span, 0, col_span);
            }
            let candidate = GridArea::new(
                cursor_row,
                cursor_row + row_span,
                cursor_col,
                cursor_col + col_span,
            );
            occupancy.ensure_rows(candidate.row_end);
            if candidate.col_end <= col_count && occupancy.is_free(&candidate) {
                cursor_col += col_span;
                break candidate;
            }
            cursor_col += 1;
            if cursor_col >= col_count {
                cursor_col = 0;
                cursor_row += 1;
            }
        };
        occupancy.mark(&area);
        if let Some(slot) = areas.get_mut(index) {
            *slot = area;
        }
    }

    let row_count = areas
        .iter()
        .map(|area| area.row_end)
        .fold(template_rows, usize::max);
    tracing::debug!(
        "place_grid_items: {} items in {} columns x {} rows",
        items.len(),
        col_count,
        row_count
    );

    GridPlacement {
        areas,
        order,
        col_count,
        row_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test grid area span calculation.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn test_grid_area_span() {
        let area = GridArea::new(1, 3, 2, 5);
        assert_eq!(area.row_span(), 2);
        assert_eq!(area.col_span(), 3);
    }

    /// Line resolution: 1-based lines, negative end spans, auto.
    ///
    /// # Panics
    /// Panics if a line is resolved incorrectly.
    #[test]
    fn resolves_lines() {
        assert_eq!(resolve_axis(2, 4), AxisPlacement::Definite(1, 3));
        assert_eq!(resolve_axis(2, -3), AxisPlacement::Definite(1, 4));
        assert_eq!(resolve_axis(3, 0), AxisPlacement::Definite(2, 3));
        assert_eq!(resolve_axis(3, 2), AxisPlacement::Definite(2, 3));
        assert_eq!(resolve_axis(0, -2), AxisPlacement::Auto(2));
        assert_eq!(resolve_axis(0, 0), AxisPlacement::Auto(1));
        assert_eq!(resolve_axis(0, 3), AxisPlacement::Definite(1, 2));
    }

    /// Auto-placed items flow row-major around an explicit item.
    ///
    /// # Panics
    /// Panics if placement differs.
    #[test]
    fn auto_placement_skips_occupied_cells() {
        let items = vec![
            GridItem::new(0, 0),
            GridItem::new(1, 1).with_columns(1, 2).with_rows(1, 2),
            GridItem::new(2, 2),
            GridItem::new(3, 3).with_columns(0, -2),
        ];
        let placement = place_grid_items(&items, 2, 0);
        assert_eq!(placement.areas[1], GridArea::new(0, 1, 0, 1));
        assert_eq!(placement.areas[0], GridArea::new(0, 1, 1, 2));
        assert_eq!(placement.areas[2], GridArea::new(1, 2, 0, 1));
        assert_eq!(placement.areas[3], GridArea::new(2, 3, 0, 2));
        assert_eq!(placement.row_count, 3);
    }

    /// `order` sorts placement, ties keep source order.
    ///
    /// # Panics
    /// Panics if the order is not stable.
    #[test]
    fn order_property_is_stable() {
        let items = vec![
            GridItem::new('a', 0).with_order(1),
            GridItem::new('b', 1),
            GridItem::new('c', 2).with_order(1),
            GridItem::new('d', 3).with_order(-1),
        ];
        let placement = place_grid_items(&items, 4, 1);
        assert_eq!(placement.order, vec![3, 1, 0, 2]);
        assert_eq!(placement.areas[3].col_start, 0);
        assert_eq!(placement.areas[1].col_start, 1);
        assert_eq!(placement.areas[0].col_start, 2);
        assert_eq!(placement.areas[2].col_start, 3);
    }

    /// Explicit lines past the template add columns.
    ///
    /// # Panics
    /// Panics if the column count does not grow.
    #[test]
    fn explicit_lines_grow_columns() {
        let items = vec![GridItem::new(0, 0).with_columns(4, 5).with_rows(1, 2)];
        let placement = place_grid_items(&items, 2, 1);
        assert_eq!(placement.col_count, 4);
        assert_eq!(placement.areas[0], GridArea::new(0, 1, 3, 4));
    }

    /// Huge line numbers are clamped to the last allowed track.
    ///
    /// # Panics
    /// Panics if a line escapes the bound.
    #[test]
    fn huge_lines_are_clamped() {
        assert_eq!(
            resolve_axis(i32::MAX, 0),
            AxisPlacement::Definite(MAX_GRID_LINES - 1, MAX_GRID_LINES)
        );
        assert_eq!(
            resolve_axis(2, i32::MIN),
            AxisPlacement::Definite(1, MAX_GRID_LINES)
        );
        assert_eq!(resolve_axis(0, -i32::MAX), AxisPlacement::Auto(MAX_GRID_LINES));

        let items = vec![
            GridItem::new(0, 0)
                .with_columns(i32::MAX, 0)
                .with_rows(i32::MAX, i32::MAX),
            GridItem::new(1, 1),
        ];
        let placement = place_grid_items(&items, 1, 1);
        assert_eq!(placement.col_count, MAX_GRID_LINES);
        assert_eq!(placement.row_count, MAX_GRID_LINES);
        assert_eq!(
            placement.areas[0],
            GridArea::new(MAX_GRID_LINES - 1, MAX_GRID_LINES, MAX_GRID_LINES - 1, MAX_GRID_LINES)
        );
        assert_eq!(placement.areas[1], GridArea::new(0, 1, 0, 1));
    }
}
