//! Deterministic fixed-point mathematics library.
//!
//! Every value that reaches simulation state is a Q16.16 number stored in an
//! `i32`: 16 integer bits, 16 fractional bits. All arithmetic is integer-only
//! and wraps on overflow exactly like native 32-bit integers, so every client
//! computes bit-identical results regardless of CPU, OS or FPU.
//!
//! Floats only appear at the edges (`from_num` for config/test literals,
//! `to_f32` for rendering) and never flow back into the simulation.

use fixed::types::I16F16;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

pub use vec2::FixedVec2;

pub mod trig;
mod vec2;
#[cfg(test)]
mod tests;

/// Number of fractional bits.
pub const FRAC_BITS: u32 = 16;

/// Newton iterations used by [`FixedNum::sqrt`]. Fixed so every platform does the same work.
const SQRT_ITERATIONS: usize = 16;

/// Q16.16 fixed-point scalar.
///
/// Range is roughly ±32768 with a precision of 1/65536.
///
/// # Overflow
///
/// Addition, subtraction, multiplication and negation wrap around on overflow.
/// Division by zero yields [`FixedNum::ZERO`] instead of panicking.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedNum(I16F16);

impl FixedNum {
    pub const ZERO: Self = Self(I16F16::ZERO);
    pub const ONE: Self = Self(I16F16::ONE);
    pub const HALF: Self = Self::from_bits(1 << (FRAC_BITS - 1));
    /// Smallest positive value (one LSB).
    pub const EPSILON: Self = Self::from_bits(1);
    pub const MAX: Self = Self(I16F16::MAX);
    pub const MIN: Self = Self(I16F16::MIN);
    /// round(π · 2¹⁶)
    pub const PI: Self = Self::from_bits(205_887);
    /// round(2π · 2¹⁶)
    pub const TWO_PI: Self = Self::from_bits(411_775);
    /// round(π/2 · 2¹⁶)
    pub const HALF_PI: Self = Self::from_bits(102_944);

    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(I16F16::from_bits(bits))
    }

    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0.to_bits()
    }

    /// Integer to fixed-point. Wraps for values outside ±32768.
    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self::from_bits(value.wrapping_shl(FRAC_BITS))
    }

    /// Integer part, rounded toward negative infinity.
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.to_bits() >> FRAC_BITS
    }

    /// Float to fixed-point, rounded to the nearest representable value.
    ///
    /// Non-finite input maps to zero. Out-of-range input wraps.
    pub fn from_num(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        Self(I16F16::wrapping_from_num(value))
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0.to_num::<f64>()
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0.to_num::<f32>()
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.to_bits() == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.to_bits() < 0
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// `-1`, `0` or `1` as a fixed-point value.
    #[inline]
    pub fn signum(self) -> Self {
        match self.to_bits() {
            0 => Self::ZERO,
            b if b > 0 => Self::ONE,
            _ => -Self::ONE,
        }
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        if self >= other { self } else { other }
    }

    #[inline]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// Largest integer value not greater than `self`.
    #[inline]
    pub fn floor(self) -> Self {
        Self(self.0.wrapping_floor())
    }

    /// Smallest integer value not less than `self`.
    #[inline]
    pub fn ceil(self) -> Self {
        Self(self.0.wrapping_ceil())
    }

    /// Linear interpolation, `t` in [0, 1].
    #[inline]
    pub fn lerp(self, other: Self, t: Self) -> Self {
        self + (other - self) * t
    }

    /// Square root by Newton's method.
    ///
    /// Seeded at `(a + ONE) >> 1` and always runs the same number of
    /// iterations; there is no tolerance-based early exit. Non-positive
    /// input returns zero.
    pub fn sqrt(self) -> Self {
        if self.to_bits() <= 0 {
            return Self::ZERO;
        }
        let mut x = Self::from_bits(self.to_bits().wrapping_add(Self::ONE.to_bits()) >> 1);
        for _ in 0..SQRT_ITERATIONS {
            if x.is_zero() {
                break;
            }
            x = Self::from_bits((x + self / x).to_bits() >> 1);
        }
        x
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

impl Add for FixedNum {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for FixedNum {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for FixedNum {
    type Output = Self;
    /// `(a * b) / 2^16`, rounded half up, truncated back to 32 bits.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        let product = self.to_bits() as i64 * rhs.to_bits() as i64;
        Self::from_bits(((product + (1 << (FRAC_BITS - 1))) >> FRAC_BITS) as i32)
    }
}

impl Div for FixedNum {
    type Output = Self;
    /// `(a << 16) / b`, truncated toward zero. Division by zero returns zero.
    #[inline]
    fn div(self, rhs: Self) -> Self::Output {
        if rhs.is_zero() {
            return Self::ZERO;
        }
        let numerator = (self.to_bits() as i64) << FRAC_BITS;
        Self::from_bits((numerator / rhs.to_bits() as i64) as i32)
    }
}

impl Neg for FixedNum {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Self(self.0.wrapping_neg())
    }
}

impl AddAssign for FixedNum {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixedNum {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for FixedNum {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for FixedNum {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

// ============================================================================
// Formatting & serialization
// ============================================================================

impl fmt::Debug for FixedNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedNum({})", self.0)
    }
}

impl fmt::Display for FixedNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Serialized as the raw `i32` bits so every encoder round-trips exactly.
impl Serialize for FixedNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.to_bits())
    }
}

impl<'de> Deserialize<'de> for FixedNum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Self::from_bits)
    }
}
