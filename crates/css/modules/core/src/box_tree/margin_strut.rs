//! Margin strut for tracking collapsing margins.
//!
//! Tracks the largest positive and the most negative margin that have not
//! collapsed yet between adjoining sibling boxes.

/// Adjoining margins waiting to collapse.
///
/// Spec: CSS 2.2 §8.3.1 Collapsing margins
/// <https://www.w3.org/TR/CSS22/box.html#collapsing-margins>
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarginStrut {
    /// Largest positive margin accumulated
    pub positive_margin: f32,

    /// Smallest negative margin accumulated (most negative)
    pub negative_margin: f32,
}

impl MarginStrut {
    /// A strut holding a single margin.
    #[inline]
    pub fn with_margin(margin: f32) -> Self {
        let mut strut = Self::default();
        strut.append(margin);
        strut
    }

    /// Add an adjoining margin: positives keep the largest, negatives the
    /// most negative.
    #[inline]
    pub fn append(&mut self, margin: f32) {
        if margin > 0.0 {
            self.positive_margin = self.positive_margin.max(margin);
        } else if margin < 0.0 {
            self.negative_margin = self.negative_margin.min(margin);
        }
    }

    /// The collapsed margin.
    #[inline]
    pub fn collapse(&self) -> f32 {
        self.positive_margin + self.negative_margin
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positive_margin <= 0.0 && self.negative_margin >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Largest positive plus most negative.
    ///
    /// # Panics
    /// Panics if margins collapse incorrectly.
    #[test]
    fn collapses_mixed_margins() {
        let mut strut = MarginStrut::with_margin(20.0);
        strut.append(30.0);
        assert!((strut.collapse() - 30.0).abs() < f32::EPSILON);
        strut.append(-5.0);
        strut.append(-12.0);
        assert!((strut.collapse() - 18.0).abs() < f32::EPSILON);
        assert!(!strut.is_empty());
        assert!(MarginStrut::default().is_empty());
    }
}
