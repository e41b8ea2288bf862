//! Grid template parsing using cssparser.
//!
//! Spec: §7.2 Explicit Track Sizing
//! <https://www.w3.org/TR/css-grid-2/#track-sizing>

use crate::types::{AutoRepeat, GridTrack, MAX_REPEAT_COUNT, RepeatKind, TrackList, TrackSizing};
use cssparser::{ParseError, Parser, ParserInput, Token, match_ignore_ascii_case};
use std::iter::repeat_n;

/// Root font size used for `rem` track sizes.
const ROOT_FONT_SIZE: f32 = 16.0;

/// Parse `grid-template-columns` or `grid-template-rows`.
///
/// `none` and the empty string produce no explicit tracks. Tokens that do not
/// parse as a track size become `auto` tracks; line names are skipped.
pub fn parse_track_list(template: &str, font_size: f32) -> TrackList {
    let mut list = TrackList::default();
    let trimmed = template.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return list;
    }

    let mut input = ParserInput::new(trimmed);
    let mut parser = Parser::new(&mut input);

    while !parser.is_exhausted() {
        let Ok(token) = parser.next().cloned() else {
            break;
        };

        match token {
            // Line names are not tracks; the block is skipped by the next `next()`.
            Token::SquareBracketBlock => {}
            Token::Function(ref name) if name.eq_ignore_ascii_case("repeat") => {
                let parsed = parser.parse_nested_block(|nested| {
                    Ok::<Option<Repeat>, ParseError<'_, ()>>(parse_repeat(nested, font_size))
                });
                match parsed {
                    Ok(Some(Repeat::Count(count, pattern))) => {
                        list.tracks.extend(repeat_n(pattern, count).flatten());
                    }
                    Ok(Some(Repeat::Auto(kind, pattern))) if list.auto_repeat.is_none() => {
                        list.auto_repeat = Some(AutoRepeat {
                            kind,
                            pattern,
                            insert_at: list.tracks.len(),
                        });
                    }
                    Ok(Some(Repeat::Auto(..))) => {
                        tracing::warn!("parse_track_list: second auto-repeat in {template:?}, using auto");
                        list.tracks.push(GridTrack::auto());
                    }
                    Ok(None) | Err(_) => {
                        tracing::warn!("parse_track_list: invalid repeat() in {template:?}, using auto");
                        list.tracks.push(GridTrack::auto());
                    }
                }
            }
            other => {
                let track = track_from_token(&other, &mut parser, font_size).unwrap_or_else(|| {
                    tracing::warn!(
                        "parse_track_list: unparseable track {other:?} in {template:?}, using auto"
                    );
                    GridTrack::auto()
                });
                list.tracks.push(track);
            }
        }
    }

    tracing::trace!(
        "parse_track_list: {template:?} -> {} tracks, auto-repeat: {}",
        list.tracks.len(),
        list.auto_repeat.is_some()
    );
    list
}

/// Result of parsing `repeat()` content.
enum Repeat {
    Count(usize, Vec<GridTrack>),
    Auto(RepeatKind, Vec<GridTrack>),
}

enum RepeatCount {
    Fixed(usize),
    Auto(RepeatKind),
}

/// Parse `repeat()` function content.
fn parse_repeat(parser: &mut Parser<'_, '_>, font_size: f32) -> Option<Repeat> {
    let first = parser.next().ok()?.clone();
    let count = match first {
        Token::Number {
            int_value: Some(count),
            ..
        } if count > 0 => {
            let requested = usize::try_from(count).ok()?;
            if requested > MAX_REPEAT_COUNT {
                tracing::debug!("parse_repeat: clamping repeat({requested}) to {MAX_REPEAT_COUNT}");
            }
            RepeatCount::Fixed(requested.min(MAX_REPEAT_COUNT))
        }
        Token::Ident(ref name) if name.eq_ignore_ascii_case("auto-fill") => {
            RepeatCount::Auto(RepeatKind::AutoFill)
        }
        Token::Ident(ref name) if name.eq_ignore_ascii_case("auto-fit") => {
            RepeatCount::Auto(RepeatKind::AutoFit)
        }
        _ => return None,
    };
    parser.expect_comma().ok()?;

    let mut pattern = Vec::new();
    while !parser.is_exhausted() {
        let token = parser.next().ok()?.clone();
        if matches!(token, Token::SquareBracketBlock) {
            continue;
        }
        pattern.push(track_from_token(&token, parser, font_size)?);
    }
    if pattern.is_empty() {
        return None;
    }

    Some(match count {
        RepeatCount::Fixed(times) => Repeat::Count(times, pattern),
        RepeatCount::Auto(kind) => {
            let fit = kind == RepeatKind::AutoFit;
            for track in &mut pattern {
                track.collapsible = fit;
            }
            Repeat::Auto(kind, pattern)
        }
    })
}

/// A track from an already consumed token: a breadth, `minmax()` or `fit-content()`.
fn track_from_token(
    token: &Token<'_>,
    parser: &mut Parser<'_, '_>,
    font_size: f32,
) -> Option<GridTrack> {
    match *token {
        Token::Function(ref name) if name.eq_ignore_ascii_case("minmax") => parser
            .parse_nested_block(|nested| parse_minmax(nested, font_size))
            .ok(),
        Token::Function(ref name) if name.eq_ignore_ascii_case("fit-content") => parser
            .parse_nested_block(|nested| parse_fit_content(nested, font_size))
            .ok(),
        _ => breadth_from_token(token, font_size).map(GridTrack::new),
    }
}

/// Parse `minmax()`: the track takes the max side's kind, and a fixed min
/// side becomes its floor. Other minimums are not honored.
///
/// # Errors
/// Returns an error if the `minmax()` syntax is invalid.
fn parse_minmax<'input>(
    parser: &mut Parser<'input, '_>,
    font_size: f32,
) -> Result<GridTrack, ParseError<'input, ()>> {
    let min = parse_breadth(parser, font_size).ok_or_else(|| parser.new_custom_error(()))?;
    parser.expect_comma()?;
    let max = parse_breadth(parser, font_size).ok_or_else(|| parser.new_custom_error(()))?;
    let track = GridTrack::new(max);
    Ok(match min {
        TrackSizing::Fixed(floor) => track.with_min(floor),
        _ => track,
    })
}

/// Parse `fit-content()`: an `auto` track capped at a fixed limit.
///
/// # Errors
/// Returns an error if the argument is not a track breadth.
fn parse_fit_content<'input>(
    parser: &mut Parser<'input, '_>,
    font_size: f32,
) -> Result<GridTrack, ParseError<'input, ()>> {
    let limit = parse_breadth(parser, font_size).ok_or_else(|| parser.new_custom_error(()))?;
    Ok(match limit {
        TrackSizing::Fixed(size) => GridTrack::auto().with_max(size),
        _ => GridTrack::auto(),
    })
}

/// Parse a track breadth value.
fn parse_breadth(parser: &mut Parser<'_, '_>, font_size: f32) -> Option<TrackSizing> {
    let token = parser.next().ok()?;
    breadth_from_token(token, font_size)
}

fn breadth_from_token(token: &Token<'_>, font_size: f32) -> Option<TrackSizing> {
    match *token {
        Token::Dimension {
            value, ref unit, ..
        } => match_ignore_ascii_case! { &**unit,
            "px" => Some(TrackSizing::Fixed(value)),
            "em" => Some(TrackSizing::Fixed(value * font_size)),
            "rem" => Some(TrackSizing::Fixed(value * ROOT_FONT_SIZE)),
            "fr" => (value >= 0.0).then_some(TrackSizing::Fr(value)),
            _ => None,
        },
        Token::Percentage { unit_value, .. } => Some(TrackSizing::Percentage(unit_value * 100.0)),
        Token::Number { value: 0.0, .. } => Some(TrackSizing::Fixed(0.0)),
        Token::Ident(ref name) => match_ignore_ascii_case! { &**name,
            "auto" => Some(TrackSizing::Auto),
            "min-content" => Some(TrackSizing::MinContent),
            "max-content" => Some(TrackSizing::MaxContent),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizings(list: &TrackList) -> Vec<TrackSizing> {
        list.tracks.iter().map(|track| track.sizing).collect()
    }

    /// Plain breadths of every kind.
    ///
    /// # Panics
    /// Panics if a breadth is misparsed.
    #[test]
    fn parses_breadths() {
        let list = parse_track_list("100px 2em 50% 1fr auto min-content max-content", 10.0);
        assert_eq!(
            sizings(&list),
            vec![
                TrackSizing::Fixed(100.0),
                TrackSizing::Fixed(20.0),
                TrackSizing::Percentage(50.0),
                TrackSizing::Fr(1.0),
                TrackSizing::Auto,
                TrackSizing::MinContent,
                TrackSizing::MaxContent,
            ]
        );
    }

    /// `none` and empty templates have no tracks.
    ///
    /// # Panics
    /// Panics if tracks are produced.
    #[test]
    fn none_is_empty() {
        assert!(parse_track_list("none", 16.0).is_empty());
        assert!(parse_track_list("   ", 16.0).is_empty());
    }

    /// An unparseable token degrades to `auto` and parsing continues.
    ///
    /// # Panics
    /// Panics if the bad token is dropped or parsing stops.
    #[test]
    fn bad_token_becomes_auto() {
        let list = parse_track_list("100px 12parsecs 1fr", 16.0);
        assert_eq!(
            sizings(&list),
            vec![TrackSizing::Fixed(100.0), TrackSizing::Auto, TrackSizing::Fr(1.0)]
        );
    }

    /// `minmax()` keeps the max kind with a fixed floor; `fit-content()` is a
    /// capped `auto`.
    ///
    /// # Panics
    /// Panics if the functions are misparsed.
    #[test]
    fn minmax_and_fit_content() {
        let list = parse_track_list("minmax(100px, 1fr) minmax(10%, 2fr) fit-content(150px)", 16.0);
        assert_eq!(list.tracks.len(), 3);
        assert_eq!(list.tracks[0].sizing, TrackSizing::Fr(1.0));
        assert!((list.tracks[0].min_size - 100.0).abs() < f32::EPSILON);
        assert_eq!(list.tracks[1].sizing, TrackSizing::Fr(2.0));
        assert!(list.tracks[1].min_size.abs() < f32::EPSILON);
        assert_eq!(list.tracks[2].sizing, TrackSizing::Auto);
        assert_eq!(list.tracks[2].max_size, Some(150.0));
    }

    /// Literal repeat counts expand inline; auto repeats are deferred.
    ///
    /// # Panics
    /// Panics if the repeat is expanded incorrectly.
    #[test]
    fn repeat_forms() {
        let counted = parse_track_list("50px repeat(2, 1fr 20px) auto", 16.0);
        assert_eq!(
            sizings(&counted),
            vec![
                TrackSizing::Fixed(50.0),
                TrackSizing::Fr(1.0),
                TrackSizing::Fixed(20.0),
                TrackSizing::Fr(1.0),
                TrackSizing::Fixed(20.0),
                TrackSizing::Auto,
            ]
        );
        assert!(counted.auto_repeat.is_none());

        let auto = parse_track_list("200px repeat(auto-fit, minmax(100px, 1fr))", 16.0);
        assert_eq!(sizings(&auto), vec![TrackSizing::Fixed(200.0)]);
        let repeat = auto.auto_repeat.as_ref();
        assert_eq!(repeat.map(|rep| rep.kind), Some(RepeatKind::AutoFit));
        assert_eq!(repeat.map(|rep| rep.insert_at), Some(1));
        assert!(repeat.is_some_and(|rep| rep.pattern.iter().all(|track| track.collapsible)));
    }

    /// Line names are skipped.
    ///
    /// # Panics
    /// Panics if a line name produces a track.
    #[test]
    fn line_names_are_skipped() {
        let list = parse_track_list("[start] 1fr [middle] 1fr [end]", 16.0);
        assert_eq!(sizings(&list), vec![TrackSizing::Fr(1.0), TrackSizing::Fr(1.0)]);
    }
}
