//! Damage flags recording which part of a box's layout is stale.

use core::ops::{BitOr, BitOrAssign};

/// Bitset of stale aspects of a box. Flags combine with `|`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DamageFlags(u32);

impl DamageFlags {
    pub const NONE: Self = Self(0);
    /// Visual-only change (color, background); no layout needed.
    pub const REPAINT: Self = Self(0x01);
    /// The box itself must be laid out again.
    pub const REFLOW_SELF: Self = Self(0x02);
    /// Some descendant must be laid out again.
    pub const REFLOW_CHILDREN: Self = Self(0x04);
    pub const REFLOW_ALL: Self = Self(0x02 | 0x04);
    /// Intrinsic widths may have changed.
    pub const WIDTH_CHANGED: Self = Self(0x08);
    pub const HEIGHT_CHANGED: Self = Self(0x10);
    pub const POSITION_CHANGED: Self = Self(0x20);
    /// Text or replaced content changed.
    pub const CONTENT_CHANGED: Self = Self(0x40);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// True if any flag in `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Damage that drops the box's cached measurements.
    #[inline]
    pub const fn invalidates_cache(self) -> bool {
        self.intersects(Self(
            Self::REFLOW_SELF.0 | Self::REFLOW_CHILDREN.0 | Self::WIDTH_CHANGED.0,
        ))
    }

    /// Damage that ancestors must see as `REFLOW_CHILDREN`.
    #[inline]
    pub const fn propagates_up(self) -> bool {
        self.intersects(Self(
            Self::REFLOW_SELF.0 | Self::WIDTH_CHANGED.0 | Self::HEIGHT_CHANGED.0,
        ))
    }

    /// Damage that requires a layout pass over this box.
    #[inline]
    pub const fn needs_layout(self) -> bool {
        self.intersects(Self::REFLOW_ALL)
    }
}

impl BitOr for DamageFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for DamageFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
