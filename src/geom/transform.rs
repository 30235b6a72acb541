//! Rigid 2D transform accumulated while walking a shape tree

use crate::math::{FVec2, Fixed};

/// Translation followed by rotation, no scale
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affine {
    pub translation: FVec2,
    pub rotation: Fixed,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        translation: FVec2::ZERO,
        rotation: Fixed::ZERO,
    };

    pub const fn new(translation: FVec2, rotation: Fixed) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Move the local origin by `offset`, expressed in local coordinates
    pub fn translate(self, offset: FVec2) -> Self {
        Self {
            translation: self.apply(offset),
            rotation: self.rotation,
        }
    }

    /// Rotate local axes by `angle`
    pub fn rotate(self, angle: Fixed) -> Self {
        if angle == Fixed::ZERO {
            return self;
        }
        Self {
            translation: self.translation,
            rotation: (self.rotation + angle).normalize_angle(),
        }
    }

    /// Local point to world
    #[inline]
    pub fn apply(self, local: FVec2) -> FVec2 {
        self.translation + local.rotate(self.rotation)
    }

    /// World point to local
    #[inline]
    pub fn apply_inverse(self, world: FVec2) -> FVec2 {
        (world - self.translation).rotate(-self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_is_exact_without_rotation() {
        let t = Affine::IDENTITY
            .translate(FVec2::from_ints(10, 5))
            .translate(FVec2::from_ints(-3, 1));
        assert_eq!(t.apply(FVec2::from_ints(1, 1)), FVec2::from_ints(8, 7));
        assert_eq!(t.apply_inverse(FVec2::from_ints(8, 7)), FVec2::from_ints(1, 1));
    }

    #[test]
    fn test_rotated_translation() {
        let t = Affine::IDENTITY
            .rotate(Fixed::HALF_PI)
            .translate(FVec2::from_ints(10, 0));
        let p = t.apply(FVec2::ZERO);
        let tolerance = Fixed::from_ratio(1, 100);
        assert!(p.x.abs() < tolerance);
        assert!((p.y - Fixed::from_int(10)).abs() < tolerance);

        let back = t.apply_inverse(p);
        assert!(back.x.abs() < tolerance && back.y.abs() < tolerance);
    }
}
