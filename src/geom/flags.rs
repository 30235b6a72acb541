//! Shape interaction categories

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// Bitmask describing what kinds of interaction a shape region takes part in
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeFlag(u32);

impl ShapeFlag {
    pub const NONE: Self = Self(0);
    /// Takes damage from player shots
    pub const VULNERABLE: Self = Self(1 << 0);
    /// Kills players on contact
    pub const DANGEROUS: Self = Self(1 << 1);
    /// Absorbs shots without damage
    pub const SHIELD: Self = Self(1 << 2);
    /// Absorbs shots but is destroyed by them
    pub const WEAK_SHIELD: Self = Self(1 << 3);
    /// Blocks shots without being dangerous to touch
    pub const SAFE_SHIELD: Self = Self(1 << 4);
    /// Visible to enemy-on-enemy queries
    pub const ENEMY_INTERACTION: Self = Self(1 << 5);
    pub const ALL: Self = Self((1 << 6) - 1);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Unknown bits are dropped
    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn names(self) -> Vec<&'static str> {
        [
            (Self::VULNERABLE, "vulnerable"),
            (Self::DANGEROUS, "dangerous"),
            (Self::SHIELD, "shield"),
            (Self::WEAK_SHIELD, "weak_shield"),
            (Self::SAFE_SHIELD, "safe_shield"),
            (Self::ENEMY_INTERACTION, "enemy_interaction"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

impl fmt::Debug for ShapeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "ShapeFlag(none)");
        }
        write!(f, "ShapeFlag({})", self.names().join(" | "))
    }
}

impl BitOr for ShapeFlag {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ShapeFlag {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ShapeFlag {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ShapeFlag {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for ShapeFlag {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_ops() {
        let f = ShapeFlag::VULNERABLE | ShapeFlag::SHIELD;
        assert!(f.contains(ShapeFlag::SHIELD));
        assert!(!f.contains(ShapeFlag::DANGEROUS));
        assert!(f.intersects(ShapeFlag::SHIELD | ShapeFlag::DANGEROUS));
        assert_eq!(f & ShapeFlag::SHIELD, ShapeFlag::SHIELD);
        assert_eq!(!ShapeFlag::ALL, ShapeFlag::NONE);
        assert_eq!(ShapeFlag::from_bits_truncate(u32::MAX), ShapeFlag::ALL);
    }

    #[test]
    fn test_debug_lists_names() {
        let f = ShapeFlag::DANGEROUS | ShapeFlag::VULNERABLE;
        assert_eq!(format!("{f:?}"), "ShapeFlag(vulnerable | dangerous)");
        assert_eq!(format!("{:?}", ShapeFlag::NONE), "ShapeFlag(none)");
    }
}
