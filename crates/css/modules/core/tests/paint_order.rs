#![cfg(test)]
#![allow(
    clippy::missing_panics_doc,
    reason = "Assertions in tests are expected"
)]
#![allow(
    clippy::missing_errors_doc,
    reason = "Test helpers return Result for clear propagation"
)]

use core::error::Error;
use css_box::{Length, Rect, Size};
use css_core::{Document, DocumentContainer};
use indextree::NodeId;
use style_engine::{ComputedStyle, FontMetrics, Overflow, Position, Visibility};

struct Viewport;

impl DocumentContainer for Viewport {
    fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn text_width(&self, text: &str, _font: &FontMetrics) -> f32 {
        text.chars().count() as f32 * 8.0
    }

    fn image_size(&self, _src: &str) -> Size {
        Size::default()
    }
}

/// Style of a `width` x `height` box.
fn block(width: f32, height: f32) -> ComputedStyle {
    ComputedStyle {
        width: Length::Px(width),
        height: Length::Px(height),
        ..ComputedStyle::default()
    }
}

/// Style of a box positioned at `(left, top)`.
fn placed(position: Position, left: f32, top: f32, z_index: Option<i32>) -> ComputedStyle {
    let mut style = block(100.0, 100.0);
    style.position = position;
    style.inset.left = Length::Px(left);
    style.inset.top = Length::Px(top);
    style.z_index = z_index;
    style
}

fn add(
    doc: &mut Document<Viewport>,
    parent: NodeId,
    style: ComputedStyle,
) -> Result<NodeId, Box<dyn Error>> {
    let node = doc.create_element("div");
    doc.set_style(node, style);
    doc.append_child(parent, node)?;
    Ok(node)
}

fn painted_elements(doc: &Document<Viewport>) -> Vec<NodeId> {
    doc.paint_order()
        .into_iter()
        .filter_map(|item| item.element)
        .collect()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Negative z-index paints under the flow, `auto` and positive z-index
/// over it, whatever the tree order.
///
/// # Panics
/// Panics if the paint order is wrong.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn stacking_layers_follow_z_index() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    let front = add(&mut doc, root, placed(Position::Absolute, 0.0, 0.0, Some(5)))?;
    let middle = add(&mut doc, root, placed(Position::Absolute, 0.0, 0.0, None))?;
    let back = add(&mut doc, root, placed(Position::Absolute, 0.0, 0.0, Some(-1)))?;
    let flow = add(&mut doc, root, block(800.0, 50.0))?;
    doc.layout(800.0)?;

    assert_eq!(painted_elements(&doc), vec![root, back, flow, middle, front]);
    Ok(())
}

/// A z-index change repaints without a reflow and reorders the layers.
///
/// # Panics
/// Panics if the new z-index is not honored.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn z_index_change_reorders_without_reflow() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    let first = add(&mut doc, root, placed(Position::Absolute, 0.0, 0.0, Some(1)))?;
    let second = add(&mut doc, root, placed(Position::Absolute, 0.0, 0.0, Some(2)))?;
    doc.layout(800.0)?;
    assert_eq!(doc.hit_test(10.0, 10.0), Some(second));

    doc.set_style(first, placed(Position::Absolute, 0.0, 0.0, Some(3)));
    doc.layout(800.0)?;
    assert_eq!(doc.generation(), 1);
    assert_eq!(painted_elements(&doc), vec![root, second, first]);
    assert_eq!(doc.hit_test(10.0, 10.0), Some(first));
    Ok(())
}

/// The top-most box under a point wins; empty space hits nothing.
///
/// # Panics
/// Panics if the wrong element is hit.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn hit_test_picks_top_most_box() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    let upper = add(&mut doc, root, placed(Position::Absolute, 50.0, 50.0, Some(2)))?;
    let lower = add(&mut doc, root, placed(Position::Absolute, 0.0, 0.0, Some(1)))?;
    doc.layout(800.0)?;

    assert_eq!(doc.hit_test(75.0, 75.0), Some(upper));
    assert_eq!(doc.hit_test(10.0, 10.0), Some(lower));
    assert_eq!(doc.hit_test(500.0, 500.0), None);
    Ok(())
}

/// Hits on text resolve to the element holding it.
///
/// # Panics
/// Panics if the paragraph is not hit.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn text_hits_resolve_to_parent_element() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    let paragraph = add(&mut doc, root, ComputedStyle::default())?;
    let text = doc.create_text("hello world");
    doc.append_child(paragraph, text)?;
    doc.layout(800.0)?;

    assert_eq!(doc.hit_test(5.0, 5.0), Some(paragraph));
    Ok(())
}

/// Hidden boxes are not painted, their visible children are.
///
/// # Panics
/// Panics if a hidden box is painted or its visible child is not.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn hidden_boxes_are_skipped() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    let mut hidden = block(200.0, 100.0);
    hidden.visibility = Visibility::Hidden;
    let veiled = add(&mut doc, root, hidden)?;
    let shown = add(&mut doc, veiled, block(50.0, 50.0))?;
    doc.layout(800.0)?;

    assert_eq!(painted_elements(&doc), vec![root, shown]);
    assert_eq!(doc.hit_test(150.0, 75.0), Some(root), "hidden boxes take no hits");
    assert_eq!(doc.hit_test(25.0, 25.0), Some(shown));
    Ok(())
}

/// Clipped content does not take hits outside its clip, and element
/// scrolling moves it.
///
/// # Panics
/// Panics if clipping or element scrolling is ignored.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn overflow_clips_and_scrolls_content() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    let mut frame = block(100.0, 100.0);
    frame.overflow = Overflow::Hidden;
    let scroller = add(&mut doc, root, frame)?;
    let content = add(&mut doc, scroller, block(100.0, 300.0))?;
    doc.layout(800.0)?;

    assert_eq!(doc.hit_test(10.0, 50.0), Some(content));
    assert_eq!(doc.hit_test(10.0, 250.0), None);
    assert!((doc.document_size().height - 100.0).abs() < f32::EPSILON);

    doc.set_element_scroll(scroller, 0.0, 150.0);
    let painted = doc
        .paint_order()
        .into_iter()
        .find(|item| item.element == Some(content))
        .ok_or("content not painted")?;
    assert!((painted.rect.y + 150.0).abs() < f32::EPSILON);
    assert_eq!(painted.clip, Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    Ok(())
}

/// A sticky header stays at the top of the viewport while its parent is in
/// view.
///
/// # Panics
/// Panics if the header does not follow the scroll.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn sticky_header_follows_scroll() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    let page = add(&mut doc, root, block(800.0, 2000.0))?;
    let mut sticky = block(800.0, 30.0);
    sticky.position = Position::Sticky;
    sticky.inset.top = Length::Px(0.0);
    let header = add(&mut doc, page, sticky)?;
    doc.layout(800.0)?;

    doc.set_scroll(0.0, 500.0);
    let painted = doc
        .paint_order()
        .into_iter()
        .find(|item| item.element == Some(header))
        .ok_or("header not painted")?;
    assert!((painted.rect.y - 500.0).abs() < f32::EPSILON);
    assert_eq!(doc.hit_test(10.0, 510.0), Some(header));

    doc.set_scroll(0.0, 1990.0);
    let painted = doc
        .paint_order()
        .into_iter()
        .find(|item| item.element == Some(header))
        .ok_or("header not painted")?;
    assert!(
        (painted.rect.y - 1970.0).abs() < f32::EPSILON,
        "stops at the bottom of its parent"
    );
    Ok(())
}

/// Fixed boxes are placed against the viewport and take no part in the
/// document size.
///
/// # Panics
/// Panics if the fixed box does not follow the scroll or counts towards
/// the document size.
///
/// # Errors
/// Returns an error if the document cannot be built or laid out.
#[test]
fn fixed_boxes_follow_viewport() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut doc = Document::new(Viewport);
    let root = doc.root();
    add(&mut doc, root, block(800.0, 1000.0))?;
    let banner = add(&mut doc, root, placed(Position::Fixed, 0.0, 10.0, None))?;
    let far = add(&mut doc, root, placed(Position::Absolute, 0.0, 1500.0, None))?;
    doc.layout(800.0)?;

    let size = doc.document_size();
    assert!((size.height - 1600.0).abs() < f32::EPSILON);
    assert!((size.width - 800.0).abs() < f32::EPSILON);

    doc.set_scroll(0.0, 300.0);
    let placement = doc.placement(banner).ok_or("banner has no box")?;
    assert!((placement.y - 310.0).abs() < f32::EPSILON);
    let painted = doc
        .paint_order()
        .into_iter()
        .find(|item| item.element == Some(banner))
        .ok_or("banner not painted")?;
    assert_eq!(painted.rect, placement);
    assert_eq!(doc.hit_test(50.0, 320.0), Some(banner));

    let far_box = doc.placement(far).ok_or("far box missing")?;
    assert!((far_box.y - 1500.0).abs() < f32::EPSILON);
    Ok(())
}
