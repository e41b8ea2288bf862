//! Replaced element sizing.
//!
//! Spec: CSS 2.2 §10.3.2 / §10.6.2 Inline replaced elements
//! <https://www.w3.org/TR/CSS22/visudet.html#inline-replaced-width>

use super::LayoutPass;
use crate::box_tree::{ContainingBlock, RenderId};
use crate::host::DocumentContainer;
use css_box::Size;
use style_engine::ComputedStyle;

impl<C: DocumentContainer + ?Sized> LayoutPass<'_, C> {
    /// Content size of a replaced box: the CSS size where given, the host's
    /// intrinsic size otherwise, keeping the aspect ratio when only one
    /// dimension is set. A `0x0` intrinsic size is a valid answer.
    pub(super) fn replaced_size(&self, id: RenderId, own: &ContainingBlock) -> (f32, f32) {
        let intrinsic = self
            .tree
            .get(id)
            .and_then(|item| item.element)
            .and_then(|node| self.arena.get(node))
            .and_then(|node| node.get().kind.content_size(&*self.host))
            .unwrap_or_default();
        let Size { width, height } = scale_replaced(
            intrinsic,
            own.width.definite(),
            own.height.definite(),
        );
        (own.clamp_width(width), own.clamp_height(height))
    }

    /// Min-content and max-content width of a text run: the widest word and
    /// the whole run on one line.
    pub(super) fn text_widths(&self, text: &str, style: &ComputedStyle) -> (f32, f32) {
        let font = &style.font;
        let space = self.host.text_width(" ", font);
        let mut widest = 0.0_f32;
        let mut total = 0.0_f32;
        for (index, word) in text.split_whitespace().enumerate() {
            let width = self.host.text_width(word, font);
            widest = widest.max(width);
            if index > 0 {
                total += space;
            }
            total += width;
        }
        (widest, total)
    }
}

fn scale_replaced(intrinsic: Size, width: Option<f32>, height: Option<f32>) -> Size {
    match (width, height) {
        (Some(width), Some(height)) => Size::new(width, height),
        (Some(width), None) if intrinsic.width > 0.0 => {
            Size::new(width, width * intrinsic.height / intrinsic.width)
        }
        (None, Some(height)) if intrinsic.height > 0.0 => {
            Size::new(height * intrinsic.width / intrinsic.height, height)
        }
        (Some(width), None) => Size::new(width, intrinsic.height),
        (None, Some(height)) => Size::new(intrinsic.width, height),
        (None, None) => intrinsic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One given dimension scales the other by the intrinsic ratio.
    ///
    /// # Panics
    /// Panics if the ratio is not kept.
    #[test]
    fn keeps_aspect_ratio() {
        let intrinsic = Size::new(200.0, 100.0);
        assert_eq!(scale_replaced(intrinsic, Some(50.0), None), Size::new(50.0, 25.0));
        assert_eq!(scale_replaced(intrinsic, None, Some(50.0)), Size::new(100.0, 50.0));
        assert_eq!(scale_replaced(intrinsic, None, None), intrinsic);
        assert_eq!(
            scale_replaced(Size::default(), Some(40.0), None),
            Size::new(40.0, 0.0)
        );
    }
}
