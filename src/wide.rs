//! The formulas are written once and instantiated at two widths.
//! [WideInt] is the capability set they need: ring arithmetic,
//! comparison, conversions, and the fast divide by a 64-bit
//! divisor that dominates the inner loops.

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

pub trait WideInt:
    Copy
    + Send
    + Sync
    + Ord
    + Display
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + SubAssign
{
    const ZERO: Self;

    fn from_i64(v: i64) -> Self;
    fn from_i128(v: i128) -> Self;
    fn to_i64(self) -> i64;
    fn as_i128(self) -> i128;
    fn to_f64(self) -> f64;

    /// Divide by a positive 64-bit divisor. For the 128-bit
    /// instantiation this takes a 64/64 shortcut whenever the
    /// numerator's high half is empty, which it is for almost
    /// every division the inner loops perform.
    fn fast_div(self, d: i64) -> Self;

    #[inline]
    fn fast_div64(self, d: i64) -> i64 {
        self.fast_div(d).to_i64()
    }
}

impl WideInt for i64 {
    const ZERO: Self = 0;

    #[inline]
    fn from_i64(v: i64) -> Self {
        v
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        debug_assert!(v <= i64::MAX as i128 && v >= i64::MIN as i128);
        v as i64
    }

    #[inline]
    fn to_i64(self) -> i64 {
        self
    }

    #[inline]
    fn as_i128(self) -> i128 {
        self as i128
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn fast_div(self, d: i64) -> Self {
        debug_assert!(d > 0);
        self / d
    }
}

impl WideInt for i128 {
    const ZERO: Self = 0;

    #[inline]
    fn from_i64(v: i64) -> Self {
        v as i128
    }

    #[inline]
    fn from_i128(v: i128) -> Self {
        v
    }

    #[inline]
    fn to_i64(self) -> i64 {
        debug_assert!(self <= i64::MAX as i128 && self >= i64::MIN as i128);
        self as i64
    }

    #[inline]
    fn as_i128(self) -> i128 {
        self
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn fast_div(self, d: i64) -> Self {
        debug_assert!(d > 0);
        debug_assert!(self >= 0);
        // A u64/u64 divide is >4x cheaper than the compiler's
        // general 128/128 path.
        if self <= u64::MAX as i128 {
            ((self as u64) / (d as u64)) as i128
        } else {
            self / (d as i128)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_div_matches_plain_division() {
        let cases: [(i128, i64); 6] = [
            (0, 3),
            (100, 7),
            (u64::MAX as i128, 1),
            (u64::MAX as i128 + 12345, 97),
            (1i128 << 100, 1_000_003),
            (i128::MAX / 2, i64::MAX),
        ];
        for (x, d) in cases {
            assert_eq!(x.fast_div(d), x / d as i128, "x={x} d={d}");
        }
        assert_eq!(9_999_999_999i64.fast_div(13), 9_999_999_999i64 / 13);
    }

    #[test]
    fn conversions_round_trip() {
        assert_eq!(i64::from_i128(42i128), 42);
        assert_eq!(77i64.as_i128(), 77i128);
        assert_eq!(i128::from_i64(-5).to_i64(), -5);
    }
}
