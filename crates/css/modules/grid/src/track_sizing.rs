//! Grid track sizing algorithm.
//!
//! Spec: §12 Grid Sizing
//! <https://www.w3.org/TR/css-grid-2/#algo-track-sizing>
//!
//! Fixed, percentage and content-based tracks are sized first; the free space
//! left over is shared among `fr` tracks in proportion to their factors.
//! Content-based sizes come from single-span items only.

use crate::types::{AutoRepeat, GridTrack, MAX_REPEAT_COUNT, TrackList, TrackSizing};

/// Number of repetitions of an auto-repeat that fit in `available`.
///
/// Spec: §7.2.3.2 Repeat-to-fill: auto-fill and auto-fit repetitions
///
/// Space used by the other tracks (and one gap each) is set aside first; the
/// remainder gives `max(1, floor((remaining + gap) / (repetition + gap)))`.
/// A pattern without any definite minimum repeats once.
pub fn repetition_count(
    repeat: &AutoRepeat,
    other_tracks: &[GridTrack],
    available: f32,
    gap: f32,
) -> usize {
    let repetition = repeat.min_repetition_size(available);
    if repetition <= 0.0 {
        return 1;
    }
    let reserved: f32 = other_tracks
        .iter()
        .map(|track| {
            let size = match track.sizing {
                TrackSizing::Fixed(size) => size.max(track.min_size),
                TrackSizing::Percentage(pct) => available * pct / 100.0,
                _ => track.min_size,
            };
            size + gap
        })
        .sum();
    let remaining = available - reserved;
    let fitting = ((remaining + gap) / (repetition + gap)).floor();
    if fitting < 1.0 {
        return 1;
    }
    // Saturating float-to-int cast; bounded by MAX_REPEAT_COUNT right after.
    let count = fitting as usize;
    count.min(MAX_REPEAT_COUNT)
}

/// Explicit tracks with any auto-repeat expanded for `available` space.
pub fn expand_track_list(list: &TrackList, available: f32, gap: f32) -> Vec<GridTrack> {
    let Some(repeat) = &list.auto_repeat else {
        return list.tracks.clone();
    };
    let count = repetition_count(repeat, &list.tracks, available, gap);
    tracing::debug!(
        "expand_track_list: {:?} x{} ({} tracks each) in {}px",
        repeat.kind,
        count,
        repeat.pattern.len(),
        available
    );
    let insert_at = repeat.insert_at.min(list.tracks.len());
    let mut tracks = Vec::with_capacity(list.tracks.len() + count * repeat.pattern.len());
    tracks.extend(list.tracks.iter().take(insert_at).cloned());
    for _ in 0..count {
        tracks.extend(repeat.pattern.iter().cloned());
    }
    tracks.extend(list.tracks.iter().skip(insert_at).cloned());
    tracks
}

/// Collapse `auto-fit` tracks that no item occupies.
///
/// Spec: §7.2.3.2 - The auto-fit keyword collapses empty repeated tracks.
pub fn collapse_empty_tracks<F: Fn(usize) -> bool>(tracks: &mut [GridTrack], is_occupied: F) {
    let mut collapsed = 0;
    for (index, track) in tracks.iter_mut().enumerate() {
        if track.collapsible && !is_occupied(index) {
            track.collapsed = true;
            track.base_size = 0.0;
            collapsed += 1;
        }
    }
    if collapsed > 0 {
        tracing::debug!("collapse_empty_tracks: collapsed {collapsed} auto-fit tracks");
    }
}

/// Resolve base sizes.
///
/// `available` is the container's inner size along the axis, or `None` when
/// it is indefinite; gaps between uncollapsed tracks are subtracted here.
/// With an indefinite size, percentage and `fr` tracks fall back to their
/// content-based size.
pub fn size_tracks(tracks: &mut [GridTrack], available: Option<f32>, gap: f32) {
    let visible = tracks.iter().filter(|track| !track.collapsed).count();
    let total_gap = gap * visible.saturating_sub(1) as f32;
    let for_tracks = available.map(|size| (size - total_gap).max(0.0));

    let mut used = 0.0;
    let mut total_fr = 0.0;
    for track in tracks.iter_mut().filter(|track| !track.collapsed) {
        track.base_size = match (track.sizing, for_tracks) {
            (TrackSizing::Fixed(size), _) => size.max(track.min_size),
            (TrackSizing::Percentage(pct), Some(space)) => (space * pct / 100.0).max(track.min_size),
            (TrackSizing::Fr(factor), Some(_)) => {
                total_fr += factor;
                0.0
            }
            _ => track.content_based_size(),
        };
        used += track.base_size;
    }

    if let Some(space) = for_tracks
        && total_fr > 0.0
    {
        distribute_fr_space(tracks, (space - used).max(0.0), total_fr);
    }
}

/// Share free space among `fr` tracks proportionally, floored by their
/// `minmax()` minimum.
fn distribute_fr_space(tracks: &mut [GridTrack], free_space: f32, total_fr: f32) {
    tracing::debug!(
        "distribute_fr_space: free_space={}, total_fr={}",
        free_space,
        total_fr
    );
    for track in tracks.iter_mut().filter(|track| !track.collapsed) {
        if let TrackSizing::Fr(factor) = track.sizing {
            let share = free_space * factor / total_fr;
            track.base_size = share.max(track.min_size);
            tracing::trace!(
                "  fr track: factor={}, share={}, min={}, final={}",
                factor,
                share,
                track.min_size,
                track.base_size
            );
        }
    }
}

/// Assign start positions from the grid origin. Collapsed tracks take no
/// space and no gutter.
pub fn position_tracks(tracks: &mut [GridTrack], gap: f32) {
    let mut cursor = 0.0;
    let mut seen_visible = false;
    for track in tracks.iter_mut() {
        if track.collapsed {
            track.position = cursor;
            continue;
        }
        if seen_visible {
            cursor += gap;
        }
        track.position = cursor;
        cursor += track.base_size;
        seen_visible = true;
    }
}

/// Size of the span `start..end` including inner gutters.
pub fn span_size(tracks: &[GridTrack], start: usize, end: usize) -> f32 {
    match (tracks.get(start), end.checked_sub(1).and_then(|last| tracks.get(last))) {
        (Some(first), Some(last)) if end > start => (last.end() - first.position).max(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_track_list;
    use crate::types::RepeatKind;

    const EPSILON: f32 = 1e-3;

    fn sizes(tracks: &[GridTrack]) -> Vec<f32> {
        tracks.iter().map(|track| track.base_size).collect()
    }

    /// Test resolution of fixed-size tracks.
    ///
    /// # Panics
    /// Panics if track resolution fails or assertions fail.
    #[test]
    fn test_resolve_fixed_tracks() {
        let mut tracks = vec![
            GridTrack::new(TrackSizing::Fixed(100.0)),
            GridTrack::new(TrackSizing::Fixed(200.0)),
        ];
        size_tracks(&mut tracks, Some(400.0), 10.0);
        position_tracks(&mut tracks, 10.0);
        assert!((tracks[0].base_size - 100.0).abs() < EPSILON);
        assert!((tracks[1].base_size - 200.0).abs() < EPSILON);
        assert!((tracks[1].position - 110.0).abs() < EPSILON);
        assert!((span_size(&tracks, 0, 2) - 310.0).abs() < EPSILON);
    }

    /// `100px 1fr 2fr` in 700px gives [100, 200, 400].
    ///
    /// # Panics
    /// Panics if the fr shares are wrong.
    #[test]
    fn fr_tracks_share_free_space() {
        let list = parse_track_list("100px 1fr 2fr", 16.0);
        let mut tracks = expand_track_list(&list, 700.0, 0.0);
        size_tracks(&mut tracks, Some(700.0), 0.0);
        let resolved = sizes(&tracks);
        for (got, want) in resolved.iter().zip([100.0, 200.0, 400.0]) {
            assert!((got - want).abs() < EPSILON, "{resolved:?}");
        }
    }

    /// `repeat(auto-fill, minmax(100px, 1fr))` in 950px with 10px gaps
    /// resolves to 8 tracks.
    ///
    /// # Panics
    /// Panics if the repetition count is wrong.
    #[test]
    fn auto_fill_count() {
        let list = parse_track_list("repeat(auto-fill, minmax(100px, 1fr))", 16.0);
        let tracks = expand_track_list(&list, 950.0, 10.0);
        assert_eq!(tracks.len(), 8);
    }

    /// Other fixed tracks reserve their space before repetitions are counted.
    ///
    /// # Panics
    /// Panics if the reserved space is ignored.
    #[test]
    fn auto_repeat_reserves_other_tracks() {
        let list = parse_track_list("200px repeat(auto-fill, 100px) 50px", 16.0);
        // 600 - (200 + 10) - (50 + 10) = 330; (330 + 10) / 110 = 3.09
        let tracks = expand_track_list(&list, 600.0, 10.0);
        assert_eq!(tracks.len(), 5);
        assert_eq!(tracks[0].sizing, TrackSizing::Fixed(200.0));
        assert_eq!(tracks[4].sizing, TrackSizing::Fixed(50.0));
    }

    /// Too little space still yields one repetition, and a pattern without a
    /// definite size repeats once.
    ///
    /// # Panics
    /// Panics if the count drops below one.
    #[test]
    fn auto_repeat_minimum_is_one() {
        let narrow = parse_track_list("repeat(auto-fit, 300px)", 16.0);
        assert_eq!(expand_track_list(&narrow, 100.0, 0.0).len(), 1);
        let indefinite = parse_track_list("repeat(auto-fill, 1fr 1fr)", 16.0);
        assert_eq!(expand_track_list(&indefinite, 1000.0, 0.0).len(), 2);
        assert_eq!(
            indefinite.auto_repeat.map(|repeat| repeat.kind),
            Some(RepeatKind::AutoFill)
        );
    }

    /// Collapsed auto-fit tracks give their space and gutters to the rest.
    ///
    /// # Panics
    /// Panics if collapsed tracks keep space.
    #[test]
    fn auto_fit_collapses_empty_tracks() {
        let list = parse_track_list("repeat(auto-fit, minmax(100px, 1fr))", 16.0);
        let mut tracks = expand_track_list(&list, 430.0, 10.0);
        assert_eq!(tracks.len(), 4);
        collapse_empty_tracks(&mut tracks, |index| index < 2);
        size_tracks(&mut tracks, Some(430.0), 10.0);
        position_tracks(&mut tracks, 10.0);
        assert!((tracks[0].base_size - 210.0).abs() < EPSILON);
        assert!((tracks[1].base_size - 210.0).abs() < EPSILON);
        assert!(tracks[2].base_size.abs() < EPSILON);
        assert!((tracks[3].position - 430.0).abs() < EPSILON);
    }

    /// Content tracks take the largest contribution, capped by fit-content
    /// and floored by minmax.
    ///
    /// # Panics
    /// Panics if contributions are ignored.
    #[test]
    fn content_tracks_use_contributions() {
        let list = parse_track_list("auto min-content fit-content(50px) minmax(80px, auto)", 16.0);
        let mut tracks = expand_track_list(&list, 1000.0, 0.0);
        for track in &mut tracks {
            track.contribute(30.0, 120.0);
        }
        size_tracks(&mut tracks, Some(1000.0), 0.0);
        let resolved = sizes(&tracks);
        for (got, want) in resolved.iter().zip([120.0, 30.0, 50.0, 120.0]) {
            assert!((got - want).abs() < EPSILON, "{resolved:?}");
        }
    }

    /// With an indefinite size, fr tracks size to content.
    ///
    /// # Panics
    /// Panics if fr tracks are not content sized.
    #[test]
    fn indefinite_fr_uses_content() {
        let mut tracks = vec![GridTrack::new(TrackSizing::Fr(1.0))];
        tracks[0].contribute(10.0, 42.0);
        size_tracks(&mut tracks, None, 0.0);
        assert!((tracks[0].base_size - 42.0).abs() < EPSILON);
    }
}
