//! # Item Discount Applier
//!
//! Turns `quantity × unit_price` plus an optional discount into a line
//! total. This is the single rounding boundary for a line: the result is
//! whole cents and later steps never re-round it.
//!
//! ```text
//! gross = quantity × unit_price
//!
//!   None / value ≤ 0   line_total = gross
//!   Flat(v)            line_total = max(0, gross − v)
//!   Percent(p)         line_total = round2(gross × (1 − min(p, 100%)))
//! ```

use crate::money::Money;
use crate::types::{Discount, Rate};

/// Computes a clamped line total.
///
/// Oversized discounts are not errors: a flat discount larger than the
/// line, or a percent above 100%, floors the line at `$0.00`.
///
/// ## Example
/// ```rust
/// use clasp_core::discount::apply_discount;
/// use clasp_core::money::Money;
/// use clasp_core::types::{Discount, Rate};
///
/// let price = Money::from_cents(2000);
/// assert_eq!(apply_discount(2, price, &Discount::None).cents(), 4000);
/// assert_eq!(apply_discount(2, price, &Discount::Flat(Money::from_cents(500))).cents(), 3500);
/// assert_eq!(apply_discount(2, price, &Discount::Percent(Rate::from_bps(2500))).cents(), 3000);
/// assert_eq!(apply_discount(1, price, &Discount::Flat(Money::from_cents(9999))).cents(), 0);
/// ```
pub fn apply_discount(quantity: i64, unit_price: Money, discount: &Discount) -> Money {
    let gross = unit_price.multiply_quantity(quantity);

    if !discount.is_effective() {
        return gross;
    }

    let line_total = match *discount {
        Discount::None => gross,
        Discount::Flat(amount) => gross - amount,
        Discount::Percent(rate) => {
            let rate = rate.min(Rate::FULL);
            gross.scale((Rate::FULL.bps() - rate.bps()) as i64, Rate::FULL.bps() as i64)
        }
    };

    line_total.non_negative()
}

/// How much the discount took off the line, for receipts.
pub fn discount_amount(quantity: i64, unit_price: Money, discount: &Discount) -> Money {
    let gross = unit_price.multiply_quantity(quantity);
    gross - apply_discount(quantity, unit_price, discount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_discount_is_gross() {
        let price = Money::from_cents(1250);
        assert_eq!(apply_discount(3, price, &Discount::None).cents(), 3750);
        assert_eq!(
            apply_discount(3, price, &Discount::Flat(Money::from_cents(-500))).cents(),
            3750
        );
        assert_eq!(
            apply_discount(3, price, &Discount::Percent(Rate::zero())).cents(),
            3750
        );
    }

    #[test]
    fn test_flat_discount_floors_at_zero() {
        let price = Money::from_cents(1000);
        let total = apply_discount(1, price, &Discount::Flat(Money::from_cents(5000)));
        assert_eq!(total, Money::zero());
        assert_eq!(
            discount_amount(1, price, &Discount::Flat(Money::from_cents(5000))).cents(),
            1000
        );
    }

    #[test]
    fn test_percent_discount_rounds_once() {
        // $33.33 × 15% off = $28.3305 → $28.33
        let total = apply_discount(1, Money::from_cents(3333), &Discount::Percent(Rate::from_bps(1500)));
        assert_eq!(total.cents(), 2833);

        // $0.25 × 50% off = 12.5 cents → 13 cents
        let total = apply_discount(1, Money::from_cents(25), &Discount::Percent(Rate::from_bps(5000)));
        assert_eq!(total.cents(), 13);
    }

    #[test]
    fn test_percent_over_hundred_clamps() {
        let total = apply_discount(2, Money::from_cents(1000), &Discount::Percent(Rate::from_bps(15_000)));
        assert_eq!(total, Money::zero());
    }

    #[test]
    fn test_line_total_never_negative() {
        let discounts = [
            Discount::None,
            Discount::Flat(Money::from_cents(1)),
            Discount::Flat(Money::from_cents(1_000_000)),
            Discount::Percent(Rate::from_bps(9_999)),
            Discount::Percent(Rate::from_bps(10_000)),
            Discount::Percent(Rate::from_bps(u32::MAX)),
        ];
        for qty in [1, 2, 7, 999] {
            for cents in [0, 1, 99, 3700] {
                for d in &discounts {
                    let total = apply_discount(qty, Money::from_cents(cents), d);
                    assert!(!total.is_negative(), "{:?} on {}×{}", d, qty, cents);
                }
            }
        }
    }
}
