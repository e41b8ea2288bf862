//! Services the embedding application provides to layout.

use css_box::{Rect, Size};
use style_engine::FontMetrics;

/// Host rendering surface.
///
/// Every call is synchronous. Answers may be placeholders: an image that has
/// not loaded yet reports `0x0`, and the host calls
/// [`Document::resource_ready`](crate::Document::resource_ready) once it has
/// a real size, then requests a new layout.
pub trait DocumentContainer {
    /// Visible area in CSS pixels; its size is the initial containing block
    /// and the containing block of fixed boxes.
    fn viewport(&self) -> Rect;

    /// Advance width of `text` set in `font`.
    fn text_width(&self, text: &str, font: &FontMetrics) -> f32;

    /// Intrinsic size of the image at `src`, or `0x0` while unknown.
    fn image_size(&self, src: &str) -> Size;

    /// Called at box boundaries during layout. Returning `false` aborts the
    /// pass; the partial result is discarded.
    #[inline]
    fn on_layout_progress(&mut self) -> bool {
        true
    }
}
