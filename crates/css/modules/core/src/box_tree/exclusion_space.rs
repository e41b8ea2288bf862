//! Exclusion space for float positioning.
//!
//! Floats create exclusions that shorten line boxes and push later floats
//! and cleared boxes down. Coordinates are relative to the content box of the
//! formatting context root.

use super::RenderId;
use style_engine::{Clear, Float};

/// A positioned float creating an exclusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatExclusion {
    /// Which box this float belongs to
    pub render_id: RenderId,

    /// Margin box of the float
    pub inline_start: f32,
    pub inline_end: f32,
    pub block_start: f32,
    pub block_end: f32,

    /// Which side this float is on
    pub float_type: Float,
}

/// Floats placed so far in one block formatting context.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSpace {
    left_floats: Vec<FloatExclusion>,
    right_floats: Vec<FloatExclusion>,
    /// Bottom of the deepest float.
    last_float_bottom: f32,
}

impl ExclusionSpace {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left_floats.is_empty() && self.right_floats.is_empty()
    }

    /// Get the bottom edge of the last (deepest) float.
    #[inline]
    pub fn last_float_bottom(&self) -> f32 {
        self.last_float_bottom
    }

    /// Get available inline space at a given block offset.
    ///
    /// Returns `(start_offset, available_width)` inside a container of
    /// `container_inline_size`.
    pub fn available_inline_size_at_offset(
        &self,
        block_offset: f32,
        container_inline_size: f32,
    ) -> (f32, f32) {
        let left_edge = self
            .left_floats
            .iter()
            .filter(|float| float.block_start <= block_offset && block_offset < float.block_end)
            .map(|float| float.inline_end)
            .fold(0.0f32, f32::max);
        let right_edge = self
            .right_floats
            .iter()
            .filter(|float| float.block_start <= block_offset && block_offset < float.block_end)
            .map(|float| float.inline_start)
            .fold(container_inline_size, f32::min);
        (left_edge, (right_edge - left_edge).max(0.0))
    }

    /// Get the clearance offset for a given clear value.
    pub fn clearance_offset(&self, clear: Clear) -> f32 {
        let deepest = |floats: &[FloatExclusion]| {
            floats
                .iter()
                .map(|float| float.block_end)
                .fold(0.0f32, f32::max)
        };
        match clear {
            Clear::None => 0.0,
            Clear::Left => deepest(&self.left_floats),
            Clear::Right => deepest(&self.right_floats),
            Clear::Both => self.last_float_bottom,
        }
    }

    /// Place a float whose margin box is `width` x `height`, no higher than
    /// `min_block_offset`, inside a container of `container_inline_size`.
    /// Returns the margin box origin.
    ///
    /// Spec: CSS 2.2 §9.5.1 Rules for positioning floats
    pub fn place_float(
        &mut self,
        render_id: RenderId,
        float_type: Float,
        width: f32,
        height: f32,
        min_block_offset: f32,
        container_inline_size: f32,
    ) -> (f32, f32) {
        // A float is never placed above an earlier float.
        let mut block_offset = self
            .left_floats
            .iter()
            .chain(&self.right_floats)
            .map(|float| float.block_start)
            .fold(min_block_offset, f32::max);
        loop {
            let (start, available) =
                self.available_inline_size_at_offset(block_offset, container_inline_size);
            let next_edge = self
                .left_floats
                .iter()
                .chain(&self.right_floats)
                .map(|float| float.block_end)
                .filter(|end| *end > block_offset)
                .fold(f32::INFINITY, f32::min);
            if available >= width || next_edge.is_infinite() {
                let inline_start = if float_type == Float::Right {
                    start + available - width
                } else {
                    start
                };
                self.add_float(FloatExclusion {
                    render_id,
                    inline_start,
                    inline_end: inline_start + width,
                    block_start: block_offset,
                    block_end: block_offset + height,
                    float_type,
                });
                return (inline_start, block_offset);
            }
            block_offset = next_edge;
        }
    }

    /// Add a positioned float.
    pub fn add_float(&mut self, exclusion: FloatExclusion) {
        match exclusion.float_type {
            Float::Left => self.left_floats.push(exclusion),
            Float::Right => self.right_floats.push(exclusion),
            Float::None => return,
        }
        self.last_float_bottom = self.last_float_bottom.max(exclusion.block_end);
    }

    /// Get all floats.
    pub fn all_floats(&self) -> impl Iterator<Item = &FloatExclusion> {
        self.left_floats.iter().chain(self.right_floats.iter())
    }
}
