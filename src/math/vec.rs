//! 2D vectors over fixed-point or floating scalars
//!
//! Simulation code uses [`FVec2`]; render-side code converts to `glam::Vec2`.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::fixed::Fixed;

/// Scalar types a [`Vec2`] can be built over
pub trait Scalar:
    Copy
    + Debug
    + Default
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;
    const PI: Self;

    fn from_int(value: i32) -> Self;
    fn sqrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    /// `atan2(self, x)` with `self` as the y coordinate
    fn atan2(self, x: Self) -> Self;
    /// Wrap into [-π, π)
    fn normalize_angle(self) -> Self;
}

impl Scalar for Fixed {
    const ZERO: Self = Fixed::ZERO;
    const ONE: Self = Fixed::ONE;
    const PI: Self = Fixed::PI;

    fn from_int(value: i32) -> Self {
        Fixed::from_int(value)
    }
    fn sqrt(self) -> Self {
        Fixed::sqrt(self)
    }
    fn sin(self) -> Self {
        Fixed::sin(self)
    }
    fn cos(self) -> Self {
        Fixed::cos(self)
    }
    fn atan2(self, x: Self) -> Self {
        Fixed::atan2(self, x)
    }
    fn normalize_angle(self) -> Self {
        Fixed::normalize_angle(self)
    }
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const PI: Self = std::f32::consts::PI;

    fn from_int(value: i32) -> Self {
        value as f32
    }
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }
    fn sin(self) -> Self {
        f32::sin(self)
    }
    fn cos(self) -> Self {
        f32::cos(self)
    }
    fn atan2(self, x: Self) -> Self {
        f32::atan2(self, x)
    }
    fn normalize_angle(self) -> Self {
        use std::f32::consts::{PI, TAU};
        let r = self.rem_euclid(TAU);
        if r >= PI { r - TAU } else { r }
    }
}

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

/// Simulation vector
pub type FVec2 = Vec2<Fixed>;

impl<T: Scalar> Vec2<T> {
    pub const ZERO: Self = Self { x: T::ZERO, y: T::ZERO };

    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn splat(v: T) -> Self {
        Self { x: v, y: v }
    }

    #[inline]
    pub fn dot(self, other: Self) -> T {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3D cross product
    #[inline]
    pub fn cross(self, other: Self) -> T {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn length_squared(self) -> T {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> T {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance_squared(self, other: Self) -> T {
        (self - other).length_squared()
    }

    /// Unit vector in the same direction; the zero vector stays zero
    pub fn normalise(self) -> Self {
        let len = self.length();
        if len == T::ZERO {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(self, angle: T) -> Self {
        // cos(0) is not exactly one for the fixed-point polynomial
        if angle == T::ZERO {
            return self;
        }
        let (s, c) = (angle.sin(), angle.cos());
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Perpendicular (rotated a quarter turn counter-clockwise)
    #[inline]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Vector of the given length pointing at `angle`
    pub fn from_polar(angle: T, length: T) -> Self {
        Self::new(length, T::ZERO).rotate(angle)
    }

    /// Polar angle in [-π, π]
    #[inline]
    pub fn angle(self) -> T {
        self.y.atan2(self.x)
    }

    /// Component-wise clamp into the box [lo, hi]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        let c = |v: T, l: T, h: T| if v < l { l } else if v > h { h } else { v };
        Self::new(c(self.x, lo.x, hi.x), c(self.y, lo.y, hi.y))
    }
}

/// Signed shortest rotation taking angle `from` to angle `to`, in [-π, π)
pub fn angle_diff<T: Scalar>(from: T, to: T) -> T {
    (to - from).normalize_angle()
}

impl FVec2 {
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_int(x), Fixed::from_int(y))
    }

    /// Render-side conversion
    pub fn to_glam(self) -> glam::Vec2 {
        glam::Vec2::new(self.x.to_f32(), self.y.to_f32())
    }
}

impl From<Vec2<f32>> for glam::Vec2 {
    fn from(v: Vec2<f32>) -> Self {
        glam::Vec2::new(v.x, v.y)
    }
}

impl<T: Scalar> Add for Vec2<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Scalar> Sub for Vec2<T> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Scalar> Mul<T> for Vec2<T> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: T) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl<T: Scalar> Div<T> for Vec2<T> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: T) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl<T: Scalar> Neg for Vec2<T> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl<T: Scalar> AddAssign for Vec2<T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: Scalar> SubAssign for Vec2<T> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
