//! # Pricing Calculator
//!
//! Pure pricing math over already-resolved snapshots.
//!
//! ## The Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Line Pricing                                         │
//! │                                                                         │
//! │  line_subtotal = (unit_price + Σ customization.adjustment) × quantity  │
//! │                                                                         │
//! │  Cappuccino        15000                                               │
//! │  + Extra Shot       5000                                               │
//! │                   ──────                                               │
//! │  effective unit    20000                                               │
//! │  × quantity 2      40000  ← line subtotal                              │
//! │                                                                         │
//! │  order_total = Σ line subtotals (full precision, no mid-sum rounding)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution of customization ids against the catalog happens in the
//! composition service; by the time amounts reach this module every input
//! is a frozen snapshot. These functions have no side effects.

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CustomizationSnapshot, OrderLine};
use crate::validation::validate_quantity;

/// Computes one line's subtotal from frozen inputs.
///
/// ## Errors
/// `Validation` if the quantity is not a positive integer within bounds.
///
/// ## Example
/// ```rust
/// use kopi_core::money::Money;
/// use kopi_core::pricing::line_subtotal;
/// use kopi_core::types::CustomizationSnapshot;
///
/// let extra_shot = CustomizationSnapshot {
///     customization_id: "c-1".into(),
///     name: "Extra Shot".into(),
///     price_adjustment_cents: 5000,
/// };
///
/// let subtotal = line_subtotal(Money::from_cents(15000), 2, &[extra_shot]).unwrap();
/// assert_eq!(subtotal.cents(), 40000);
/// ```
pub fn line_subtotal(
    unit_price: Money,
    quantity: i64,
    customizations: &[CustomizationSnapshot],
) -> CoreResult<Money> {
    validate_quantity(quantity)?;

    let adjustment_sum: Money = customizations.iter().map(|c| c.price_adjustment()).sum();
    let effective_unit = unit_price + adjustment_sum;

    Ok(effective_unit.multiply_quantity(quantity))
}

/// Sums line subtotals into an order total.
///
/// Plain integer summation; formatting to two decimal places is a
/// display concern, never applied mid-calculation.
pub fn order_total(lines: &[OrderLine]) -> Money {
    lines.iter().map(|l| l.subtotal()).sum()
}

/// Computes change for a cash settlement.
///
/// ## Errors
/// `Validation(TenderedTooSmall)` if `tendered < total`. Change must
/// never be negative - the sale is rejected, not clamped to zero.
pub fn change_due(tendered: Money, total: Money) -> CoreResult<Money> {
    if tendered < total {
        return Err(ValidationError::TenderedTooSmall {
            tendered_cents: tendered.cents(),
            total_cents: total.cents(),
        }
        .into());
    }
    Ok(tendered - total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn snap(id: &str, adjustment: i64) -> CustomizationSnapshot {
        CustomizationSnapshot {
            customization_id: id.to_string(),
            name: format!("custom {id}"),
            price_adjustment_cents: adjustment,
        }
    }

    #[test]
    fn test_plain_line() {
        let subtotal = line_subtotal(Money::from_cents(15000), 3, &[]).unwrap();
        assert_eq!(subtotal.cents(), 45000);
    }

    #[test]
    fn test_line_with_customizations() {
        // (15000 + 5000) × 2 = 40000
        let subtotal =
            line_subtotal(Money::from_cents(15000), 2, &[snap("c-1", 5000)]).unwrap();
        assert_eq!(subtotal.cents(), 40000);
    }

    #[test]
    fn test_multiple_adjustments_including_negative() {
        // (15000 + 5000 - 2000) × 2 = 36000
        let subtotal = line_subtotal(
            Money::from_cents(15000),
            2,
            &[snap("c-1", 5000), snap("c-2", -2000)],
        )
        .unwrap();
        assert_eq!(subtotal.cents(), 36000);
    }

    #[test]
    fn test_zero_adjustment_changes_nothing() {
        let with = line_subtotal(Money::from_cents(12000), 1, &[snap("c-1", 0)]).unwrap();
        let without = line_subtotal(Money::from_cents(12000), 1, &[]).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert!(matches!(
            line_subtotal(Money::from_cents(1000), 0, &[]),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            line_subtotal(Money::from_cents(1000), -3, &[]),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let lines = vec![
            OrderLine {
                id: "l-1".to_string(),
                order_id: "o-1".to_string(),
                product_id: "p-1".to_string(),
                product_name: "Cappuccino".to_string(),
                quantity: 2,
                unit_price_cents: 15000,
                subtotal_cents: 40000,
                customizations: vec![snap("c-1", 5000)],
            },
            OrderLine {
                id: "l-2".to_string(),
                order_id: "o-1".to_string(),
                product_id: "p-2".to_string(),
                product_name: "Croissant".to_string(),
                quantity: 1,
                unit_price_cents: 18000,
                subtotal_cents: 18000,
                customizations: Vec::new(),
            },
        ];

        assert_eq!(order_total(&lines).cents(), 58000);
    }

    #[test]
    fn test_change_due() {
        // Cashier tenders 50000 against a 40000 total → change 10000
        let change = change_due(Money::from_cents(50000), Money::from_cents(40000)).unwrap();
        assert_eq!(change.cents(), 10000);

        // Exact tender → zero change
        let change = change_due(Money::from_cents(40000), Money::from_cents(40000)).unwrap();
        assert!(change.is_zero());
    }

    #[test]
    fn test_change_due_rejects_short_tender() {
        // Tendering 30000 against 40000 is an error, not change of -10000
        let err = change_due(Money::from_cents(30000), Money::from_cents(40000)).unwrap_err();
        match err {
            CoreError::Validation(ValidationError::TenderedTooSmall {
                tendered_cents,
                total_cents,
            }) => {
                assert_eq!(tendered_cents, 30000);
                assert_eq!(total_cents, 40000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
