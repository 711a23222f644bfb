//! # Weight Module
//!
//! Provides the `Weight` type for metal weights.
//!
//! ## Why Integer Milligrams?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 g + 0.2 g = 0.30000000000000004 g   ❌ WRONG!                      │
//! │                                                                         │
//! │  A ledger that compares "available >= required" on floats can accept   │
//! │  or reject an allocation based on the last bit of a rounding error.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Milligrams                                      │
//! │    100.000 g = 100_000 mg, 5.125 g × 3 = 15_375 mg exactly             │
//! │    Conservation (received == consumed + available) holds bit-for-bit  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use karat_core::weight::Weight;
//!
//! let net = Weight::from_milligrams(5_250); // 5.250 g
//! let line = net * 4;                        // 21.000 g
//! assert_eq!(line, Weight::from_grams(21));
//! assert_eq!(line.to_string(), "21.000 g");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Milligrams per gram.
pub const MG_PER_GRAM: i64 = 1_000;

// =============================================================================
// Weight Type
// =============================================================================

/// A metal weight in milligrams.
///
/// Signed so that a corrupted or hand-edited history shows up as a negative
/// availability instead of wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Weight(i64);

impl Weight {
    /// Creates a weight from milligrams.
    #[inline]
    pub const fn from_milligrams(mg: i64) -> Self {
        Weight(mg)
    }

    /// Creates a weight from whole grams.
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams * MG_PER_GRAM)
    }

    /// Parses a gram amount typed by a user, e.g. `"12.5"` or `"0.125"`.
    ///
    /// ## Rules
    /// - At most three decimals (milligram precision)
    /// - A leading `-` is accepted; callers decide whether negatives are legal
    ///
    /// ## Example
    /// ```rust
    /// use karat_core::weight::Weight;
    ///
    /// assert_eq!(Weight::parse_grams("12.5").unwrap().milligrams(), 12_500);
    /// assert!(Weight::parse_grams("1.2345").is_err());
    /// assert!(Weight::parse_grams("abc").is_err());
    /// ```
    pub fn parse_grams(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "weight".to_string(),
            reason: reason.to_string(),
        };

        let input = input.trim();
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("must be a number of grams"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a number of grams"));
        }
        if frac.len() > 3 {
            return Err(invalid("at most 3 decimal places (milligrams)"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };
        let frac_mg: i64 = format!("{:0<3}", frac)
            .parse()
            .map_err(|_| invalid("must be a number of grams"))?;

        let mg = whole
            .checked_mul(MG_PER_GRAM)
            .and_then(|w| w.checked_add(frac_mg))
            .ok_or_else(|| invalid("too large"))?;

        Ok(Weight(if negative { -mg } else { mg }))
    }

    /// Returns the value in milligrams.
    #[inline]
    pub const fn milligrams(&self) -> i64 {
        self.0
    }

    /// Returns the whole-gram portion.
    #[inline]
    pub const fn whole_grams(&self) -> i64 {
        self.0 / MG_PER_GRAM
    }

    /// Returns the milligram remainder (always 0-999).
    #[inline]
    pub const fn milligram_part(&self) -> i64 {
        (self.0 % MG_PER_GRAM).abs()
    }

    /// Zero weight.
    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a per-unit weight by a quantity, failing on overflow.
    ///
    /// ## User Workflow
    /// ```text
    /// Item: Ring-A, net weight 5.000 g
    /// Quantity: 10
    ///      │
    ///      ▼
    /// checked_mul_quantity(10) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Required: 50.000 g
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(mg) => Some(Weight(mg)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Grams with milligram precision, e.g. `"50.000 g"`.
///
/// Debugging and log output only; forms own their display precision.
impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:03} g",
            sign,
            self.whole_grams().abs(),
            self.milligram_part()
        )
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight::zero()
    }
}

impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl AddAssign for Weight {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Weight {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Weight(self.0 - other.0)
    }
}

impl SubAssign for Weight {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Weight {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Weight(self.0 * qty)
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grams() {
        let w = Weight::from_grams(100);
        assert_eq!(w.milligrams(), 100_000);
        assert_eq!(w.whole_grams(), 100);
        assert_eq!(w.milligram_part(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Weight::from_milligrams(50_000).to_string(), "50.000 g");
        assert_eq!(Weight::from_milligrams(5_125).to_string(), "5.125 g");
        assert_eq!(Weight::from_milligrams(-5_000).to_string(), "-5.000 g");
        assert_eq!(Weight::from_milligrams(-250).to_string(), "-0.250 g");
        assert_eq!(Weight::zero().to_string(), "0.000 g");
    }

    #[test]
    fn test_parse_grams() {
        assert_eq!(Weight::parse_grams("100").unwrap(), Weight::from_grams(100));
        assert_eq!(Weight::parse_grams("22.5").unwrap().milligrams(), 22_500);
        assert_eq!(Weight::parse_grams("0.001").unwrap().milligrams(), 1);
        assert_eq!(Weight::parse_grams(".75").unwrap().milligrams(), 750);
        assert_eq!(Weight::parse_grams(" 3. ").unwrap().milligrams(), 3_000);
        assert_eq!(Weight::parse_grams("-2.5").unwrap().milligrams(), -2_500);

        assert!(Weight::parse_grams("").is_err());
        assert!(Weight::parse_grams(".").is_err());
        assert!(Weight::parse_grams("1.2345").is_err());
        assert!(Weight::parse_grams("1,5").is_err());
        assert!(Weight::parse_grams("ten").is_err());
        assert!(Weight::parse_grams("99999999999999999999").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Weight::from_grams(100);
        let b = Weight::from_grams(45);

        assert_eq!(a + b, Weight::from_grams(145));
        assert_eq!(a - b, Weight::from_grams(55));
        assert_eq!(b * 2, Weight::from_grams(90));

        let mut c = a;
        c -= b;
        c += Weight::from_milligrams(1);
        assert_eq!(c.milligrams(), 55_001);
    }

    #[test]
    fn test_sum() {
        let total: Weight = [1_000, 2_500, 250]
            .into_iter()
            .map(Weight::from_milligrams)
            .sum();
        assert_eq!(total.milligrams(), 3_750);

        let empty: Weight = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_checked_mul_quantity() {
        let net = Weight::from_milligrams(5_250);
        assert_eq!(net.checked_mul_quantity(4), Some(Weight::from_grams(21)));
        assert_eq!(Weight::from_milligrams(i64::MAX).checked_mul_quantity(2), None);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Weight::zero().is_zero());
        assert!(Weight::from_milligrams(1).is_positive());
        assert!(Weight::from_milligrams(-1).is_negative());
    }
}
