//! Q32.32 fixed-point arithmetic
//!
//! Every simulation quantity goes through this type so that a replay produces
//! bit-identical results on every platform:
//! - Multiply and divide never use native 128-bit operations
//! - Trigonometry is polynomial/rational, no platform intrinsics
//! - All arithmetic wraps exactly like native `i64`
//! - Division by zero returns zero instead of trapping

use std::fmt;
use std::iter::Sum;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Shl, Shr, Sub, SubAssign,
};

use serde::{Deserialize, Serialize};

/// Number of fractional bits
pub const FRAC_BITS: u32 = 32;

/// Newton iterations used by [`Fixed::sqrt`]
const SQRT_ITERATIONS: u32 = 8;

/// sin(x) ≈ x - S3·x³ + S5·x⁵ on [-π/2, π/2] (max error ≈ 1.6e-4)
const SIN_C3: Fixed = Fixed(713_179_320);
const SIN_C5: Fixed = Fixed(32_684_701);

/// atan(z) ≈ z / (1 + C·z²) on [0, 1] (max error ≈ 4.7e-3)
const ATAN_C: Fixed = Fixed(1_206_284_515);

/// Signed Q32.32 fixed-point number
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << FRAC_BITS);
    pub const HALF: Self = Self(1 << (FRAC_BITS - 1));
    /// Smallest positive value (one ULP)
    pub const EPSILON: Self = Self(1);
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    pub const PI: Self = Self(13_493_037_705);
    pub const TAU: Self = Self(26_986_075_409);
    pub const HALF_PI: Self = Self(6_746_518_852);
    pub const QUARTER_PI: Self = Self(3_373_259_426);

    /// Create from the raw Q32.32 bit pattern
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw Q32.32 bit pattern
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self((value as i64) << FRAC_BITS)
    }

    /// `numerator / denominator` computed exactly in fixed point (zero if the
    /// denominator is zero)
    #[inline]
    pub const fn from_ratio(numerator: i32, denominator: i32) -> Self {
        Self(div_raw(
            (numerator as i64) << FRAC_BITS,
            (denominator as i64) << FRAC_BITS,
        ))
    }

    /// Convert from a float. Only for configuration and tests; values derived
    /// this way are deterministic but should not be produced inside a tick.
    pub fn from_f64(value: f64) -> Self {
        Self((value * (1u64 << FRAC_BITS) as f64).round() as i64)
    }

    /// Integer part, rounded toward negative infinity
    #[inline]
    pub const fn to_int(self) -> i32 {
        (self.0 >> FRAC_BITS) as i32
    }

    /// Convert for display/rendering only
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }

    /// Convert for display/rendering only
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u64 << FRAC_BITS) as f64
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    #[inline]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Square root by bounded Newton iteration. Non-positive input yields zero.
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        // sqrt(raw · 2^32) has roughly (bits + 32) / 2 significant bits
        let bits = 64 - self.0.leading_zeros();
        let mut guess = Self(1i64 << ((bits + FRAC_BITS) / 2));
        for _ in 0..SQRT_ITERATIONS {
            let next = (guess + self / guess) >> 1;
            if next == guess {
                break;
            }
            guess = next;
        }
        guess
    }

    /// Sine of an angle in radians
    pub fn sin(self) -> Self {
        let mut x = self.normalize_angle();
        if x > Self::HALF_PI {
            x = Self::PI - x;
        } else if x < -Self::HALF_PI {
            x = -Self::PI - x;
        }
        let x2 = x * x;
        let x3 = x2 * x;
        let x5 = x3 * x2;
        x - SIN_C3 * x3 + SIN_C5 * x5
    }

    /// Cosine of an angle in radians
    #[inline]
    pub fn cos(self) -> Self {
        (self + Self::HALF_PI).sin()
    }

    /// Four-quadrant arctangent of `self / x` (self is the y coordinate)
    pub fn atan2(self, x: Self) -> Self {
        let y = self;
        if x == Self::ZERO && y == Self::ZERO {
            return Self::ZERO;
        }
        let ax = x.abs();
        let ay = y.abs();
        let octant = |z: Self| z / (Self::ONE + ATAN_C * z * z);
        let a = if ax >= ay {
            octant(ay / ax)
        } else {
            Self::HALF_PI - octant(ax / ay)
        };
        let a = if x.is_negative() { Self::PI - a } else { a };
        if y.is_negative() { -a } else { a }
    }

    /// Wrap an angle into [-π, π)
    pub fn normalize_angle(self) -> Self {
        let r = self.0.rem_euclid(Self::TAU.0);
        if r >= Self::PI.0 {
            Self(r - Self::TAU.0)
        } else {
            Self(r)
        }
    }
}

/// Q32.32 multiply over 32-bit halves (no 128-bit intermediate)
pub const fn mul_raw(a: i64, b: i64) -> i64 {
    let negative = (a < 0) != (b < 0);
    let x = a.unsigned_abs();
    let y = b.unsigned_abs();
    let (xh, xl) = (x >> 32, x & 0xffff_ffff);
    let (yh, yl) = (y >> 32, y & 0xffff_ffff);
    let product = (xh.wrapping_mul(yh) << 32)
        .wrapping_add(xh.wrapping_mul(yl))
        .wrapping_add(xl.wrapping_mul(yh))
        .wrapping_add(xl.wrapping_mul(yl) >> 32);
    let product = product as i64;
    if negative {
        product.wrapping_neg()
    } else {
        product
    }
}

/// Q32.32 long division, consuming as many quotient bits per step as the
/// remainder's leading zeros allow. Division by zero yields zero.
pub const fn div_raw(a: i64, b: i64) -> i64 {
    if b == 0 {
        return 0;
    }
    let negative = (a < 0) != (b < 0);
    let d = b.unsigned_abs();
    let n = a.unsigned_abs();
    let mut q = n / d;
    let mut r = n % d;
    let mut bits = FRAC_BITS;
    while bits > 0 {
        if r == 0 {
            q = q.wrapping_shl(bits);
            break;
        }
        let lz = r.leading_zeros();
        let step = if lz < bits { lz } else { bits };
        if step == 0 {
            // Top bit set: shift one bit, tracking the carry out of u64
            let carry = r >> 63;
            r <<= 1;
            q = q.wrapping_shl(1);
            if carry != 0 || r >= d {
                r = r.wrapping_sub(d);
                q |= 1;
            }
            bits -= 1;
        } else {
            r <<= step;
            q = q.wrapping_shl(step).wrapping_add(r / d);
            r %= d;
            bits -= step;
        }
    }
    let q = q as i64;
    if negative { q.wrapping_neg() } else { q }
}

impl Add for Fixed {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for Fixed {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(mul_raw(self.0, rhs.0))
    }
}

impl Div for Fixed {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self(div_raw(self.0, rhs.0))
    }
}

impl Neg for Fixed {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Shl<u32> for Fixed {
    type Output = Self;
    #[inline]
    fn shl(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shl(rhs))
    }
}

impl Shr<u32> for Fixed {
    type Output = Self;
    #[inline]
    fn shr(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shr(rhs))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fixed {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Fixed {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Sum for Fixed {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |a, b| a + b)
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Fixed, b: Fixed, tolerance: Fixed) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_constants() {
        assert_eq!(Fixed::ONE.raw(), 1i64 << 32);
        assert_eq!(Fixed::from_int(-3).to_int(), -3);
        assert!(close(Fixed::PI, Fixed::from_f64(std::f64::consts::PI), Fixed::EPSILON));
        assert!(close(Fixed::TAU, Fixed::PI + Fixed::PI, Fixed::from_raw(2)));
    }

    #[test]
    fn test_mul_basic() {
        let a = Fixed::from_f64(1.5);
        let b = Fixed::from_int(-4);
        assert_eq!(a * b, Fixed::from_int(-6));
        assert_eq!(Fixed::HALF * Fixed::HALF, Fixed::from_ratio(1, 4));
    }

    #[test]
    fn test_div_basic() {
        assert_eq!(Fixed::from_int(7) / Fixed::from_int(2), Fixed::from_f64(3.5));
        assert_eq!(Fixed::from_int(-9) / Fixed::from_int(3), Fixed::from_int(-3));
        assert_eq!(Fixed::ONE / Fixed::from_int(4), Fixed::from_ratio(1, 4));
    }

    #[test]
    fn test_div_by_zero_is_zero() {
        assert_eq!(Fixed::from_int(5) / Fixed::ZERO, Fixed::ZERO);
        assert_eq!(Fixed::from_ratio(3, 0), Fixed::ZERO);
    }

    #[test]
    fn test_third_times_three() {
        let one = Fixed::ONE;
        let three = Fixed::from_int(3);
        let result = one / three * three;
        assert!(close(result, one, Fixed::from_ratio(1, 1000)));
    }

    #[test]
    fn test_div_large_divisor() {
        // Divisor with the top magnitude bit set exercises the carry path
        let d = Fixed::from_raw(i64::MAX - 5);
        let n = Fixed::from_raw(i64::MAX - 10);
        let q = n / d;
        assert!(close(q, Fixed::ONE, Fixed::from_raw(16)));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(Fixed::from_int(16).sqrt(), Fixed::from_int(4));
        assert_eq!(Fixed::ZERO.sqrt(), Fixed::ZERO);
        assert_eq!(Fixed::from_int(-4).sqrt(), Fixed::ZERO);
        let two = Fixed::from_int(2).sqrt();
        assert!(close(two, Fixed::from_f64(std::f64::consts::SQRT_2), Fixed::from_ratio(1, 100_000)));
        let small = Fixed::from_ratio(1, 10_000).sqrt();
        assert!(close(small, Fixed::from_ratio(1, 100), Fixed::from_ratio(1, 100_000)));
        let big = Fixed::from_int(1_000_000).sqrt();
        assert!(close(big, Fixed::from_int(1000), Fixed::from_ratio(1, 1000)));
    }

    #[test]
    fn test_sin_cos_samples() {
        let tolerance = Fixed::from_ratio(1, 1000);
        for i in -32..=32 {
            let theta = i as f64 * std::f64::consts::PI / 16.0;
            let fx = Fixed::from_f64(theta);
            assert!(close(fx.sin(), Fixed::from_f64(theta.sin()), tolerance), "sin({theta})");
            assert!(close(fx.cos(), Fixed::from_f64(theta.cos()), tolerance), "cos({theta})");
        }
    }

    #[test]
    fn test_atan2_quadrants() {
        let tolerance = Fixed::from_ratio(1, 100);
        let cases = [(1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0), (0.0, -2.0), (3.0, 0.0)];
        for (y, x) in cases {
            let expected = Fixed::from_f64(f64::atan2(y, x));
            let actual = Fixed::from_f64(y).atan2(Fixed::from_f64(x));
            assert!(close(actual, expected, tolerance), "atan2({y}, {x}) = {actual}");
        }
        assert_eq!(Fixed::ZERO.atan2(Fixed::ZERO), Fixed::ZERO);
    }

    #[test]
    fn test_atan2_round_trip() {
        let tolerance = Fixed::from_ratio(1, 100);
        for i in -64..=64 {
            let theta = Fixed::PI * Fixed::from_int(i) / Fixed::from_int(64);
            let back = theta.sin().atan2(theta.cos());
            let diff = (back - theta).normalize_angle();
            assert!(diff.abs() <= tolerance, "theta={theta} back={back}");
        }
    }

    #[test]
    fn test_normalize_angle() {
        let a = (Fixed::PI + Fixed::HALF_PI).normalize_angle();
        assert!(close(a, -Fixed::HALF_PI, Fixed::from_raw(4)));
        assert!(close(Fixed::PI.normalize_angle(), -Fixed::PI, Fixed::from_raw(2)));
        assert_eq!(Fixed::ONE.normalize_angle(), Fixed::ONE);
    }

    #[test]
    fn test_trig_is_bit_stable() {
        // Pinned outputs: any change to the approximations breaks replays
        assert_eq!(Fixed::from_ratio(1, 3).raw(), 1_431_655_765);
        assert_eq!(Fixed::from_ratio(1, 3).sin().raw(), 1_405_376_221);
        assert_eq!(Fixed::ONE.sin().raw(), 3_614_472_677);
        assert_eq!(Fixed::from_int(-3).sin().raw(), -606_113_163);
    }

    proptest! {
        #[test]
        fn prop_add_sub_round_trip(a in any::<i64>(), b in any::<i64>()) {
            let (a, b) = (Fixed::from_raw(a), Fixed::from_raw(b));
            prop_assert_eq!((a + b) - b, a);
        }

        #[test]
        fn prop_div_mul_close(a in -1_000_000i32..1_000_000, b in 1i32..10_000) {
            let a = Fixed::from_int(a) / Fixed::from_int(7);
            let b = Fixed::from_int(b) / Fixed::from_int(3);
            let back = a / b * b;
            // One ULP of the quotient scaled back up by b
            let tolerance = Fixed::from_raw(b.to_int() as i64 + 3);
            prop_assert!((back - a).abs() <= tolerance);
        }

        #[test]
        fn prop_div_by_zero(a in any::<i64>()) {
            prop_assert_eq!(Fixed::from_raw(a) / Fixed::ZERO, Fixed::ZERO);
        }

        #[test]
        fn prop_mul_matches_wide(a in -(1i64 << 40)..(1i64 << 40), b in -(1i64 << 40)..(1i64 << 40)) {
            // Cross-check against i128 in the test only
            let expected = ((a as i128 * b as i128) >> 32) as i64;
            let actual = (Fixed::from_raw(a) * Fixed::from_raw(b)).raw();
            prop_assert!((expected - actual).abs() <= 1);
        }

        #[test]
        fn prop_div_matches_wide(a in -(1i64 << 50)..(1i64 << 50), b in (1i64 << 30)..(1i64 << 50)) {
            let expected = ((a as i128) << 32) / b as i128;
            let actual = (Fixed::from_raw(a) / Fixed::from_raw(b)).raw() as i128;
            prop_assert!((expected - actual).abs() <= 1);
        }
    }
}
