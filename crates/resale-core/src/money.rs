//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a resale ledger, paid_now and remaining are re-added on every       │
//! │  edit of a sale. Cent-level drift would compound across edits.          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Floats are only touched once, at the request boundary, where they    │
//! │    are rounded half-up to cents. Everything downstream is i64.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resale_core::money::{Money, Precision};
//!
//! // Parse once at the boundary
//! let price = Money::parse_numeric(199.99, "sale_price").unwrap();
//! assert_eq!(price.cents(), 19999);
//!
//! // Installment math stays in integer cents
//! let monthly = Money::from_cents(60000).div_round(6);
//! assert_eq!(monthly.cents(), 10000); // $100.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Precision Classes
// =============================================================================

/// Storage precision class for a monetary column.
///
/// ## Why Two Classes?
/// Per-sale amounts live in NUMERIC(12,2)-equivalent columns; worker
/// lifetime counters accumulate across every sale and get the wider
/// NUMERIC(14,2)-equivalent bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// 12 significant digits, 2 decimal places (per-sale amounts).
    Standard,
    /// 14 significant digits, 2 decimal places (lifetime counters).
    Wide,
}

impl Precision {
    /// Largest absolute cent value the class can represent, exclusive.
    #[inline]
    pub const fn limit_cents(self) -> i64 {
        match self {
            // 12 significant digits at scale 2 → |value| < 10^10, in cents 10^12
            Precision::Standard => 1_000_000_000_000,
            // 14 significant digits at scale 2 → |value| < 10^12, in cents 10^14
            Precision::Wide => 100_000_000_000_000,
        }
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative intermediate values so that
///   `remaining = total - paid_now` can be computed and then rejected
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support; serialized as plain cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a request-boundary numeric into Money.
    ///
    /// This is the ONLY place floating point is allowed to touch money.
    /// The value is rounded to the nearest cent; everything downstream uses
    /// integer arithmetic.
    ///
    /// ## Errors
    /// `CoreError::InvalidNumeric` when the value is NaN, infinite, or too
    /// large to represent in cents at all.
    ///
    /// ## Example
    /// ```rust
    /// use resale_core::money::Money;
    ///
    /// assert_eq!(Money::parse_numeric(199.99, "x").unwrap().cents(), 19999);
    /// assert!(Money::parse_numeric(f64::NAN, "x").is_err());
    /// ```
    pub fn parse_numeric(value: f64, field: &str) -> CoreResult<Money> {
        if !value.is_finite() {
            return Err(CoreError::InvalidNumeric {
                field: field.to_string(),
            });
        }

        // Guard the cast: i64::MAX cents ≈ 9.2e16, stay well inside it.
        if value.abs() >= 9.0e16 {
            return Err(CoreError::InvalidNumeric {
                field: field.to_string(),
            });
        }

        Ok(Money((value * 100.0).round() as i64))
    }

    /// Fails with `PrecisionOverflow` when the value does not fit the
    /// given storage precision class. Returns self for chaining.
    ///
    /// ## Example
    /// ```rust
    /// use resale_core::money::{Money, Precision};
    ///
    /// let ok = Money::from_cents(50_000);
    /// assert!(ok.ensure_fits_precision("total_price", Precision::Standard).is_ok());
    ///
    /// let too_big = Money::from_cents(Precision::Standard.limit_cents());
    /// assert!(too_big.ensure_fits_precision("total_price", Precision::Standard).is_err());
    /// ```
    pub fn ensure_fits_precision(self, field: &str, precision: Precision) -> CoreResult<Money> {
        if self.0.abs() >= precision.limit_cents() {
            return Err(CoreError::PrecisionOverflow {
                field: field.to_string(),
            });
        }
        Ok(self)
    }

    /// Fails with `NegativeRemaining` when the value is below zero.
    /// Returns self for chaining.
    pub fn ensure_non_negative_remaining(self) -> CoreResult<Money> {
        if self.is_negative() {
            return Err(CoreError::NegativeRemaining {
                remaining_cents: self.0,
            });
        }
        Ok(self)
    }

    /// Divides into `parts` equal shares, rounding half-up to the cent.
    ///
    /// Used for installment math: the monthly amount of a PAY_LATER sale
    /// is `total.div_round(months)`.
    ///
    /// ## Example
    /// ```rust
    /// use resale_core::money::Money;
    ///
    /// // $600.00 over 6 months = $100.00
    /// assert_eq!(Money::from_cents(60000).div_round(6).cents(), 10000);
    /// // $100.00 over 3 months = $33.33 (half-up at $33.333…)
    /// assert_eq!(Money::from_cents(10000).div_round(3).cents(), 3333);
    /// ```
    ///
    /// `parts` must be at least 1; callers clamp requested months with
    /// `max(1, months)` before getting here.
    pub fn div_round(self, parts: i64) -> Money {
        debug_assert!(parts >= 1);
        // i128 keeps the doubled numerator from overflowing on large totals
        let cents = ((self.0 as i128) * 2 + parts as i128) / (2 * parts as i128);
        Money(cents as i64)
    }

    /// Takes a basis-point share of the value, rounding half-up.
    ///
    /// Used for percent-salary commissions:
    /// `commission = profit.percent_of(salary_percent_bps)`.
    ///
    /// ## Example
    /// ```rust
    /// use resale_core::money::Money;
    ///
    /// // 10% (1000 bps) of $1000.00 profit = $100.00
    /// assert_eq!(Money::from_cents(100_000).percent_of(1000).cents(), 10_000);
    /// ```
    pub fn percent_of(self, bps: i64) -> Money {
        // Use i128 to prevent overflow on large amounts
        // Formula: amount_cents * bps / 10000, +5000 rounds half-up
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is the format embedded in audit-trail notes
/// ("Phone sold for $200.00"), so it is part of persisted output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(Money::parse_numeric(199.99, "x").unwrap().cents(), 19999);
        assert_eq!(Money::parse_numeric(0.0, "x").unwrap().cents(), 0);
        // Float noise from upstream addition collapses back to exact cents
        assert_eq!(Money::parse_numeric(0.1 + 0.2, "x").unwrap().cents(), 30);
    }

    #[test]
    fn test_parse_numeric_rejects_non_finite() {
        assert!(matches!(
            Money::parse_numeric(f64::NAN, "paid_now"),
            Err(CoreError::InvalidNumeric { field }) if field == "paid_now"
        ));
        assert!(Money::parse_numeric(f64::INFINITY, "x").is_err());
        assert!(Money::parse_numeric(1.0e17, "x").is_err());
    }

    #[test]
    fn test_precision_bounds() {
        let just_under = Money::from_cents(Precision::Standard.limit_cents() - 1);
        assert!(just_under
            .ensure_fits_precision("total_price", Precision::Standard)
            .is_ok());

        let at_limit = Money::from_cents(Precision::Standard.limit_cents());
        assert!(matches!(
            at_limit.ensure_fits_precision("total_price", Precision::Standard),
            Err(CoreError::PrecisionOverflow { field }) if field == "total_price"
        ));

        // The wide class accepts what the standard class rejects
        assert!(at_limit
            .ensure_fits_precision("total_sold", Precision::Wide)
            .is_ok());
    }

    #[test]
    fn test_non_negative_remaining() {
        assert!(Money::from_cents(0).ensure_non_negative_remaining().is_ok());
        assert!(matches!(
            Money::from_cents(-1).ensure_non_negative_remaining(),
            Err(CoreError::NegativeRemaining { remaining_cents: -1 })
        ));
    }

    #[test]
    fn test_div_round() {
        // Exact division
        assert_eq!(Money::from_cents(60000).div_round(6).cents(), 10000);
        // Truncating case
        assert_eq!(Money::from_cents(10000).div_round(3).cents(), 3333);
        // Exact half rounds up: $6.67 / 2 = $3.335 → $3.34
        assert_eq!(Money::from_cents(667).div_round(2).cents(), 334);
        // Single installment is identity
        assert_eq!(Money::from_cents(12345).div_round(1).cents(), 12345);
    }

    #[test]
    fn test_percent_of() {
        // 10% of $1000.00
        assert_eq!(Money::from_cents(100_000).percent_of(1000).cents(), 10_000);
        // 8.25% of $10.00 = $0.825 → $0.83 half-up
        assert_eq!(Money::from_cents(1000).percent_of(825).cents(), 83);
        // 0% is zero
        assert_eq!(Money::from_cents(100_000).percent_of(0).cents(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let mut acc = Money::zero();
        acc += a;
        acc += b;
        assert_eq!(acc.cents(), 1500);
    }

    /// Repeated edits must not drift: summing the same prices in any order
    /// always lands on the same cents.
    #[test]
    fn test_no_drift_across_reordering() {
        let prices = [19999, 15000, 15001];
        let forward: i64 = prices.iter().sum();
        let backward: i64 = prices.iter().rev().sum();
        assert_eq!(forward, backward);
        assert_eq!(Money::from_cents(forward).cents(), 50000);
    }
}
