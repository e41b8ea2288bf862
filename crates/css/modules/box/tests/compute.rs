#![cfg(test)]
#![allow(
    clippy::missing_panics_doc,
    reason = "Assertions in tests are expected"
)]

use css_box::{BoxSides, Edges, Length, Rect, resolve_box_sides};

/// Margins keep their sign, padding and borders clamp at zero, percentages resolve against the width.
#[test]
fn resolve_box_sides_basic() {
    let margin = Edges {
        top: Length::Px(10.0),
        right: Length::Px(-5.0),
        bottom: Length::Percent(10.0),
        left: Length::Auto,
    };
    let padding = Edges {
        top: Length::Px(3.5),
        right: Length::Px(-4.0),
        bottom: Length::Px(2.0),
        left: Length::Percent(5.0),
    };
    let border = Edges {
        top: 2.0,
        right: -1.0,
        bottom: 0.0,
        left: 1.0,
    };

    let sides: BoxSides = resolve_box_sides(&margin, &padding, &border, 200.0);
    assert_eq!(sides.margin.top, 10.0);
    assert_eq!(sides.margin.right, -5.0);
    assert_eq!(sides.margin.bottom, 20.0);
    assert_eq!(sides.margin.left, 0.0);

    assert_eq!(sides.padding.right, 0.0);
    assert_eq!(sides.padding.left, 10.0);
    assert_eq!(sides.border.right, 0.0);

    assert_eq!(sides.content_offset_left(), 0.0 + 1.0 + 10.0);
    assert_eq!(sides.box_sizing_width(), 1.0 + 10.0);
}

/// Rectangle helpers.
#[test]
fn rect_intersection_and_containment() {
    let outer = Rect::new(0.0, 0.0, 100.0, 50.0);
    let inner = Rect::new(80.0, 40.0, 40.0, 40.0);
    assert_eq!(outer.intersect(&inner), Some(Rect::new(80.0, 40.0, 20.0, 10.0)));
    assert!(outer.contains(0.0, 0.0));
    assert!(!outer.contains(100.0, 10.0));
    assert_eq!(outer.union(&inner), Rect::new(0.0, 0.0, 120.0, 80.0));
    assert!(Rect::new(0.0, 0.0, 10.0, 10.0).intersect(&Rect::new(10.0, 0.0, 5.0, 5.0)).is_none());
}
