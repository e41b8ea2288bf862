#![cfg(test)]
#![allow(
    clippy::missing_panics_doc,
    reason = "Assertions in tests are expected"
)]

use css_grid::{
    GridContainerInputs, GridItem, GridMeasure, GridTrack, TrackList, TrackSizing,
    expand_track_list, layout_grid, parse_track_list, place_grid_items, size_tracks,
};

/// Deterministic pseudorandom number generator for tests (xorshift64* variant).
#[derive(Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let init = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state: init }
    }

    fn next_u64(&mut self) -> u64 {
        let mut bits = self.state;
        bits ^= bits >> 12;
        bits ^= bits << 25;
        bits ^= bits >> 27;
        self.state = bits;
        bits.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound.max(1)
    }
}

/// Every item measures 50px wide and 20px tall.
struct UniformMeasure;

impl GridMeasure<usize> for UniformMeasure {
    fn content_widths(&mut self, _node: &usize) -> (f32, f32) {
        (50.0, 50.0)
    }

    fn height_for_width(&mut self, _node: &usize, _width: f32, _exact: bool) -> f32 {
        20.0
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `repeat(auto-fill, minmax(100px, 1fr))` in a 950px container with 10px
/// gaps resolves to 8 tracks that fill the container.
///
/// # Panics
/// Panics if the track count or sizes are wrong.
#[test]
fn auto_fill_minmax_in_950px() {
    init_logging();
    let inputs = GridContainerInputs::new(
        parse_track_list("repeat(auto-fill, minmax(100px, 1fr))", 16.0),
        TrackList::default(),
        950.0,
    )
    .with_gaps(10.0, 10.0);
    let items: Vec<GridItem> = (0..3).map(|node| GridItem::new(node, node)).collect();
    let result = layout_grid(&items, &inputs, &mut UniformMeasure);
    assert_eq!(result.columns.len(), 8);
    for size in result.column_sizes() {
        assert!((size - 110.0).abs() < 1e-3);
    }
    assert!((result.total_width - 950.0).abs() < 1e-3);
}

/// `grid-template-columns: 100px 1fr 2fr` with 700px available yields
/// column widths [100, 200, 400].
///
/// # Panics
/// Panics if the widths differ.
#[test]
fn fixed_and_fr_columns_in_700px() {
    init_logging();
    let inputs = GridContainerInputs::new(
        parse_track_list("100px 1fr 2fr", 16.0),
        TrackList::default(),
        700.0,
    );
    let items: Vec<GridItem> = (0..3).map(|node| GridItem::new(node, node)).collect();
    let result = layout_grid(&items, &inputs, &mut UniformMeasure);
    let sizes = result.column_sizes();
    assert_eq!(sizes.len(), 3);
    for (got, want) in sizes.iter().zip([100.0, 200.0, 400.0]) {
        assert!((got - want).abs() < 1e-3, "{sizes:?}");
    }
}

/// With positive free space and no minimums, fr tracks share exactly the
/// free space, in proportion to their factors.
///
/// # Panics
/// Panics if the shares do not sum to the free space.
#[test]
fn fr_sizes_sum_to_free_space() {
    init_logging();
    let mut rng = DeterministicRng::new(0xF4_0001);
    for _ in 0..200 {
        let mut tracks = Vec::new();
        let mut fixed = 0.0;
        for _ in 0..=rng.below(6) {
            if rng.below(2) == 0 {
                let size = (rng.below(80) + 1) as f32;
                fixed += size;
                tracks.push(GridTrack::new(TrackSizing::Fixed(size)));
            } else {
                let factor = (rng.below(4) + 1) as f32 * 0.5;
                tracks.push(GridTrack::new(TrackSizing::Fr(factor)));
            }
        }
        tracks.push(GridTrack::new(TrackSizing::Fr(1.0)));
        let gap = rng.below(3) as f32 * 5.0;
        let available = 1000.0 + rng.below(400) as f32;
        let total_gap = gap * (tracks.len() - 1) as f32;
        let free = available - total_gap - fixed;

        size_tracks(&mut tracks, Some(available), gap);

        let total_fr: f32 = tracks.iter().map(|track| track.sizing.flex_factor()).sum();
        let fr_sum: f32 = tracks
            .iter()
            .filter(|track| track.sizing.is_flexible())
            .map(|track| track.base_size)
            .sum();
        assert!((fr_sum - free).abs() < 1e-2, "fr sum {fr_sum} vs free {free}");
        for track in tracks.iter().filter(|track| track.sizing.is_flexible()) {
            let expected = free * track.sizing.flex_factor() / total_fr;
            assert!((track.base_size - expected).abs() < 1e-2);
        }
    }
}

/// Placement depends only on the template and the order-tie-broken item
/// list: repeated runs agree, and areas never overlap.
///
/// # Panics
/// Panics if placement is nondeterministic or overlapping.
#[test]
fn placement_is_deterministic() {
    init_logging();
    let mut rng = DeterministicRng::new(0x0A11_CE55);
    for _ in 0..100 {
        let cols = usize::try_from(rng.below(5) + 1).unwrap_or(1);
        let count = rng.below(12) + 1;
        let items: Vec<GridItem> = (0..count)
            .map(|index| {
                let node = usize::try_from(index).unwrap_or_default();
                let mut item = GridItem::new(node, node)
                    .with_order(i32::try_from(rng.below(3)).unwrap_or_default() - 1);
                match rng.below(4) {
                    0 => {
                        let col = i32::try_from(rng.below(4) + 1).unwrap_or(1);
                        let row = i32::try_from(rng.below(4) + 1).unwrap_or(1);
                        item = item.with_columns(col, col + 1).with_rows(row, row + 1);
                    }
                    1 => {
                        let span = i32::try_from(rng.below(3) + 1).unwrap_or(1);
                        item = item.with_columns(0, -span);
                    }
                    _ => {}
                }
                item
            })
            .collect();

        let first = place_grid_items(&items, cols, 0);
        let second = place_grid_items(&items, cols, 0);
        assert_eq!(first, second);

        let auto_areas: Vec<_> = first
            .areas
            .iter()
            .zip(&items)
            .filter(|(_, item)| !item.has_explicit_col_placement())
            .map(|(area, _)| *area)
            .collect();
        for (index, area) in auto_areas.iter().enumerate() {
            assert!(area.col_end <= first.col_count);
            for other in auto_areas.iter().skip(index + 1) {
                assert!(!area.overlaps(other), "{area:?} overlaps {other:?}");
            }
        }
    }
}

/// Expanding the same auto-repeat twice gives the same tracks.
///
/// # Panics
/// Panics if expansion is not repeatable.
#[test]
fn expansion_is_repeatable() {
    let list = parse_track_list("40px repeat(auto-fit, minmax(60px, 1fr)) 2em", 10.0);
    let first = expand_track_list(&list, 500.0, 8.0);
    let second = expand_track_list(&list, 500.0, 8.0);
    assert_eq!(first, second);
    assert_eq!(first.first().map(|track| track.sizing), Some(TrackSizing::Fixed(40.0)));
    assert_eq!(first.last().map(|track| track.sizing), Some(TrackSizing::Fixed(20.0)));
}
