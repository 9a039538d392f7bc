//! # Pricing Module
//!
//! Pure checkout math: subtotal, discount, tax, total, change, points.
//!
//! ## Computation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Price Pipeline                             │
//! │                                                                         │
//! │  cart lines ──► subtotal = Σ unit_price × qty                          │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  discount = percentage | fixed, clamped to subtotal                    │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  discounted subtotal = subtotal − discount   (never negative)          │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  tax = discounted subtotal × location tax rate                         │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  total = discounted subtotal + tax                                     │
//! │                     │                                                   │
//! │                     ├──► change = tendered − total   (cash only)       │
//! │                     └──► points earned = whole dollars of total        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is deterministic and I/O free; the database
//! layer persists whatever this module computes.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{DiscountType, TaxRate};
use crate::validation::validate_quantity;

// =============================================================================
// Cart Input
// =============================================================================

/// One priced cart line, already snapshotted from the product record.
///
/// ## Snapshot Pattern
/// The name and unit price are frozen at the moment the product enters
/// the cart; later catalog edits do not change a committed receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    /// Line total before tax (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A manual discount entered by the operator at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Discount {
    pub kind: DiscountType,
    /// Whole percent for [`DiscountType::Percentage`] (10 = 10% off),
    /// cents for [`DiscountType::Fixed`].
    pub value: i64,
}

// =============================================================================
// Totals
// =============================================================================

/// The monetary breakdown of a checkout, ready to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub points_earned: i64,
}

/// Computes the full monetary breakdown for a cart.
///
/// ## Rules
/// 1. `subtotal` = sum of line totals
/// 2. `discount` = percentage of subtotal or a fixed amount, clamped
///    so the discounted subtotal is never negative
/// 3. `tax` applies to the discounted subtotal
/// 4. `points earned` = one point per whole dollar of the final total.
///    This rate is fixed; the `points_per_dollar` system setting is
///    intentionally not consulted here (see DESIGN.md).
///
/// ## Errors
/// Rejects an empty cart, non-positive quantities, and negative
/// discount inputs - all before any money math runs.
pub fn compute_totals(
    lines: &[CartLine],
    discount: Option<Discount>,
    tax_rate: TaxRate,
) -> Result<CheckoutTotals, CoreError> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    for line in lines {
        validate_quantity(line.quantity)?;
    }

    let subtotal = lines
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.line_total());

    let discount_amount = match discount {
        Some(d) => compute_discount(subtotal, d)?,
        None => Money::zero(),
    };

    let discounted_subtotal = subtotal - discount_amount;
    let tax = discounted_subtotal.calculate_tax(tax_rate);
    let total = discounted_subtotal + tax;

    Ok(CheckoutTotals {
        subtotal_cents: subtotal.cents(),
        discount_cents: discount_amount.cents(),
        tax_cents: tax.cents(),
        total_cents: total.cents(),
        points_earned: total.dollars(),
    })
}

/// Computes the clamped discount amount for a subtotal.
///
/// Percentage discounts convert the whole-percent input to basis
/// points and reuse the Money rounding rule; fixed discounts are taken
/// verbatim. Either way the result is capped at the subtotal.
pub fn compute_discount(subtotal: Money, discount: Discount) -> Result<Money, CoreError> {
    if discount.value < 0 {
        return Err(CoreError::InvalidDiscount {
            reason: "discount cannot be negative".to_string(),
        });
    }

    let amount = match discount.kind {
        DiscountType::Percentage => {
            if discount.value > 100 {
                return Err(CoreError::InvalidDiscount {
                    reason: "percentage discount cannot exceed 100".to_string(),
                });
            }
            subtotal.percentage_of(discount.value as u32 * 100)
        }
        DiscountType::Fixed => Money::from_cents(discount.value),
    };

    Ok(amount.clamp_at(subtotal))
}

/// Computes change due for a cash tender.
///
/// ## Errors
/// `InsufficientCash` when the tendered amount does not cover the
/// total - checkout must reject before any write happens.
pub fn change_due(total: Money, amount_received: Money) -> Result<Money, CoreError> {
    let change = amount_received - total;
    if change.is_negative() {
        return Err(CoreError::InsufficientCash {
            total_cents: total.cents(),
            received_cents: amount_received.cents(),
        });
    }
    Ok(change)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, qty: i64) -> CartLine {
        CartLine {
            product_id: format!("p-{price_cents}"),
            name: "Test".to_string(),
            unit_price_cents: price_cents,
            quantity: qty,
        }
    }

    /// Two 10.00 items plus one 5.00 item, 8% tax, no discount:
    /// subtotal 25.00, tax 2.00, total 27.00, 27 points.
    #[test]
    fn test_totals_no_discount() {
        let lines = vec![line(1000, 2), line(500, 1)];
        let totals = compute_totals(&lines, None, TaxRate::from_bps(800)).unwrap();

        assert_eq!(totals.subtotal_cents, 2500);
        assert_eq!(totals.discount_cents, 0);
        assert_eq!(totals.tax_cents, 200);
        assert_eq!(totals.total_cents, 2700);
        assert_eq!(totals.points_earned, 27);
    }

    /// Same cart with a 10% discount: discount 2.50, tax 1.80,
    /// total 24.30, 24 points.
    #[test]
    fn test_totals_percentage_discount() {
        let lines = vec![line(1000, 2), line(500, 1)];
        let discount = Discount {
            kind: DiscountType::Percentage,
            value: 10,
        };
        let totals = compute_totals(&lines, Some(discount), TaxRate::from_bps(800)).unwrap();

        assert_eq!(totals.subtotal_cents, 2500);
        assert_eq!(totals.discount_cents, 250);
        assert_eq!(totals.tax_cents, 180);
        assert_eq!(totals.total_cents, 2430);
        assert_eq!(totals.points_earned, 24);
    }

    /// A fixed 30.00 discount on a 25.00 subtotal clamps to zero:
    /// no negative totals, no tax on nothing.
    #[test]
    fn test_totals_fixed_discount_clamped() {
        let lines = vec![line(1000, 2), line(500, 1)];
        let discount = Discount {
            kind: DiscountType::Fixed,
            value: 3000,
        };
        let totals = compute_totals(&lines, Some(discount), TaxRate::from_bps(800)).unwrap();

        assert_eq!(totals.discount_cents, 2500);
        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_cents, 0);
        assert_eq!(totals.points_earned, 0);
    }

    #[test]
    fn test_totals_fixed_discount_partial() {
        let lines = vec![line(1000, 2), line(500, 1)];
        let discount = Discount {
            kind: DiscountType::Fixed,
            value: 500,
        };
        let totals = compute_totals(&lines, Some(discount), TaxRate::from_bps(800)).unwrap();

        // 25.00 - 5.00 = 20.00, tax 1.60, total 21.60
        assert_eq!(totals.discount_cents, 500);
        assert_eq!(totals.tax_cents, 160);
        assert_eq!(totals.total_cents, 2160);
        assert_eq!(totals.points_earned, 21);
    }

    /// total == max(0, subtotal - discount) * (1 + rate) holds across
    /// sizes, including the single-cent cart.
    #[test]
    fn test_totals_identity_small_and_large() {
        for (price, qty) in [(1i64, 1i64), (100, 1), (999, 3), (250000, 40)] {
            let lines = vec![line(price, qty)];
            let totals = compute_totals(&lines, None, TaxRate::from_bps(800)).unwrap();
            let subtotal = price * qty;
            let expected_tax = (subtotal as i128 * 800 + 5000) / 10000;
            assert_eq!(totals.subtotal_cents, subtotal);
            assert_eq!(totals.tax_cents, expected_tax as i64);
            assert_eq!(totals.total_cents, subtotal + expected_tax as i64);
        }
    }

    /// Points floor: one point per whole dollar of the total.
    #[test]
    fn test_points_floor() {
        for (total_cents, expected) in [(0i64, 0i64), (1, 0), (100, 1), (999, 9), (10050, 100)] {
            assert_eq!(Money::from_cents(total_cents).dollars(), expected);
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = compute_totals(&[], None, TaxRate::from_bps(800)).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let lines = vec![line(1000, 0)];
        assert!(compute_totals(&lines, None, TaxRate::from_bps(800)).is_err());
    }

    #[test]
    fn test_negative_discount_rejected() {
        let discount = Discount {
            kind: DiscountType::Fixed,
            value: -100,
        };
        assert!(compute_discount(Money::from_cents(1000), discount).is_err());
    }

    #[test]
    fn test_percentage_over_100_rejected() {
        let discount = Discount {
            kind: DiscountType::Percentage,
            value: 101,
        };
        assert!(compute_discount(Money::from_cents(1000), discount).is_err());
    }

    #[test]
    fn test_change_due() {
        let change = change_due(Money::from_cents(2700), Money::from_cents(3000)).unwrap();
        assert_eq!(change.cents(), 300);

        let exact = change_due(Money::from_cents(2700), Money::from_cents(2700)).unwrap();
        assert!(exact.is_zero());
    }

    #[test]
    fn test_insufficient_cash_rejected() {
        let err = change_due(Money::from_cents(2700), Money::from_cents(2000)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCash { .. }));
    }
}
