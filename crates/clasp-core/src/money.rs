//! # Money Module
//!
//! Provides the `Money` type and the single rounding rule used by every
//! price, discount, tax and fee calculation in the engine.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A bracelet at $2.00/in × 18.5in, minus 15%, plus 8.25% tax, plus a     │
//! │  5% platform fee passes through four multiplications. Float drift in    │
//! │  any of them shows up as a penny on the receipt.                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + One Rounding Rule                        │
//! │    every fractional result goes through round_half_away() exactly once │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use clasp_core::money::Money;
//! use clasp_core::types::Rate;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;             // $21.98
//! assert_eq!(doubled.cents(), 2198);
//!
//! // 12.5 cents rounds away from zero
//! let fee = Money::from_cents(125).apply_rate(Rate::from_bps(1000));
//! assert_eq!(fee.cents(), 13);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Rounding
// =============================================================================

/// Divides `numerator / denominator`, rounding half away from zero.
///
/// This is the engine's only rounding primitive. `0.125` dollars is
/// `12.5` cents, which rounds to `13`; `-12.5` rounds to `-13`.
///
/// `denominator` must be positive.
///
/// ## Example
/// ```rust
/// use clasp_core::money::round_half_away;
///
/// assert_eq!(round_half_away(125, 10), 13);
/// assert_eq!(round_half_away(124, 10), 12);
/// assert_eq!(round_half_away(-125, 10), -13);
/// ```
pub fn round_half_away(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0, "denominator must be positive");
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate differences (gross − discount) may dip
///   below zero before they are clamped
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  InventoryItem.sell_price ─┬─► resolve_unit_price ─► CartItem.unit_price│
/// │  ChainProductPrice ────────┘                              │             │
/// │                                                           ▼             │
/// │                                          apply_discount ─► line_total   │
/// │                                                           │             │
/// │  recompute: Σ line_total ─► cart discount ─► tax ─► tip ─► fee ─► total │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use clasp_core::money::Money;
    ///
    /// let price = Money::from_cents(3700);
    /// assert_eq!(price.to_string(), "$37.00");
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts an operator-entered decimal amount (e.g. a tip typed as
    /// `4.5`) into cents, rounding half away from zero.
    ///
    /// This is the only place a float enters the money domain. It happens
    /// once, at input time.
    ///
    /// ```rust
    /// use clasp_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_f64(0.125).cents(), 13);
    /// assert_eq!(Money::from_major_f64(4.5).cents(), 450);
    /// ```
    pub fn from_major_f64(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors the value at zero.
    ///
    /// Used wherever a derived amount (a discounted line, a discounted
    /// subtotal) must never go negative.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Applies a rate and rounds once: `round(cents × bps / 10000)`.
    ///
    /// Used for tax, platform fees and percent discount amounts.
    ///
    /// ## Example
    /// ```rust
    /// use clasp_core::money::Money;
    /// use clasp_core::types::Rate;
    ///
    /// let subtotal = Money::from_cents(1000);        // $10.00
    /// let tax = subtotal.apply_rate(Rate::from_bps(825)); // 8.25%
    /// // $0.825 → $0.83
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        self.scale(rate.bps() as i64, 10_000)
    }

    /// Multiplies by `numerator / denominator`, rounding once.
    ///
    /// Uses i128 internally so large carts cannot overflow mid-calculation.
    pub fn scale(&self, numerator: i64, denominator: i64) -> Money {
        let scaled = round_half_away(self.0 as i128 * numerator as i128, denominator as i128);
        Money(scaled as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use clasp_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1500);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 4500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `$12.34` / `-$5.50`.
///
/// Register-specific symbols are handled by
/// [`RegisterConfig::format_currency`](crate::config::RegisterConfig::format_currency).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_half_away(125, 10), 13);
        assert_eq!(round_half_away(115, 10), 12);
        assert_eq!(round_half_away(114, 10), 11);
        assert_eq!(round_half_away(-125, 10), -13);
        assert_eq!(round_half_away(0, 10), 0);
    }

    #[test]
    fn test_round2_of_an_eighth() {
        // $0.125 is 12.5 cents; 10% of $1.25 lands exactly there
        let fee = Money::from_cents(125).apply_rate(Rate::from_bps(1000));
        assert_eq!(fee.cents(), 13);
        assert_eq!(Money::from_major_f64(0.125).cents(), 13);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_non_negative_floors_at_zero() {
        assert_eq!(Money::from_cents(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(42).non_negative().cents(), 42);
    }

    #[test]
    fn test_apply_rate_tax() {
        // $10.00 at 8.25% = $0.825 → $0.83
        let tax = Money::from_cents(1000).apply_rate(Rate::from_bps(825));
        assert_eq!(tax.cents(), 83);

        // $118.00 at 5% = $5.90
        let fee = Money::from_cents(11800).apply_rate(Rate::from_bps(500));
        assert_eq!(fee.cents(), 590);
    }

    #[test]
    fn test_scale_does_not_overflow_large_amounts() {
        let big = Money::from_cents(i64::MAX / 2);
        let half = big.scale(1, 2);
        assert_eq!(half.cents(), round_half_away((i64::MAX / 2) as i128, 2) as i64);
    }

    #[test]
    fn test_multiply_quantity_saturates() {
        let big = Money::from_cents(i64::MAX / 2);
        assert_eq!(big.multiply_quantity(3).cents(), i64::MAX);
        assert_eq!(Money::from_cents(1500).multiply_quantity(3).cents(), 4500);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }
}
