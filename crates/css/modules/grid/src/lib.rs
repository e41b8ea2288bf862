//! CSS Grid Layout Module Level 2
//! Spec: <https://www.w3.org/TR/css-grid-2/>
//!
//! Track-list parsing, item placement, track sizing and per-item alignment
//! for grid containers. The layout engine supplies item measurements through
//! [`GridMeasure`] and renders items into the returned cells.

// Track and item type definitions
mod types;
pub use types::{
    AutoRepeat, GridItem, GridTrack, MAX_REPEAT_COUNT, RepeatKind, TrackList, TrackSizing,
};

// grid-template-* parsing
mod template;
pub use template::parse_track_list;

// Grid placement algorithm
mod placement;
pub use placement::{GridArea, GridPlacement, MAX_AUTO_ROWS, MAX_GRID_LINES, place_grid_items};

// Track sizing algorithm
mod track_sizing;
pub use track_sizing::{
    collapse_empty_tracks, expand_track_list, position_tracks, repetition_count, size_tracks,
    span_size,
};

// Grid layout algorithm
mod layout;
pub use layout::{
    GridAlignment, GridContainerInputs, GridLayoutResult, GridMeasure, GridPlacedItem, layout_grid,
};
