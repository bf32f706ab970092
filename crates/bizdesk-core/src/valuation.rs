//! # Line Item Valuation
//!
//! `line_total = quantity × unit_price`, exact.
//!
//! ```text
//! LineItemInput { quantity: 2, unit_price: 50 }
//!      │
//!      ▼
//! valuate(2, 50) ← THIS MODULE
//!      │
//!      ├── quantity < 0?   → InvalidItem
//!      ├── unit_price < 0? → InvalidItem
//!      │
//!      └── Money(100)
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{LineItem, LineItemInput};
use crate::validation::ValidationResult;

/// Anything that carries a quantity and a unit price.
///
/// Implemented by both the caller's [`LineItemInput`] and the stored
/// [`LineItem`], so totals can be computed over either.
pub trait Priced {
    fn quantity(&self) -> Decimal;
    fn unit_price(&self) -> Decimal;
}

impl Priced for LineItemInput {
    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

impl Priced for LineItem {
    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

/// Computes the exact line total for one item.
///
/// Zero is valid for both factors. Errors report index 0; callers working on
/// a list re-tag them with [`ValidationError::at_item`].
///
/// ## Example
/// ```rust
/// use bizdesk_core::valuation::valuate;
/// use rust_decimal::Decimal;
///
/// let total = valuate(Decimal::new(15, 1), Decimal::from(40)).unwrap(); // 1.5 × 40
/// assert_eq!(total.amount(), Decimal::from(60));
///
/// assert!(valuate(Decimal::from(-1), Decimal::from(40)).is_err());
/// ```
pub fn valuate(quantity: Decimal, unit_price: Decimal) -> ValidationResult<Money> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(ValidationError::InvalidItem {
            index: 0,
            reason: format!("quantity must not be negative, got {quantity}"),
        });
    }

    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(ValidationError::InvalidItem {
            index: 0,
            reason: format!("unit price must not be negative, got {unit_price}"),
        });
    }

    quantity
        .checked_mul(unit_price)
        .map(Money::new)
        .ok_or_else(|| ValidationError::InvalidItem {
            index: 0,
            reason: "amount out of range".to_string(),
        })
}

/// Valuates a list of priced items, tagging any error with its position.
pub fn valuate_all<P: Priced>(items: &[P]) -> ValidationResult<Vec<Money>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| valuate(item.quantity(), item.unit_price()).map_err(|e| e.at_item(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valuate_basic() {
        assert_eq!(valuate(dec!(2), dec!(50)).unwrap().amount(), dec!(100));
        assert_eq!(valuate(dec!(0), dec!(50)).unwrap().amount(), dec!(0));
        assert_eq!(valuate(dec!(3), dec!(0)).unwrap().amount(), dec!(0));
        assert_eq!(valuate(dec!(0.5), dec!(33.33)).unwrap().amount(), dec!(16.665));
    }

    #[test]
    fn test_valuate_rejects_negative() {
        assert!(matches!(
            valuate(dec!(-1), dec!(10)),
            Err(ValidationError::InvalidItem { .. })
        ));
        assert!(matches!(
            valuate(dec!(1), dec!(-0.01)),
            Err(ValidationError::InvalidItem { .. })
        ));
    }

    #[test]
    fn test_valuate_overflow_is_an_item_error() {
        let items = vec![
            LineItemInput::new("ok", dec!(1), dec!(10)),
            LineItemInput::new("big", Decimal::MAX, dec!(2)),
        ];
        match valuate_all(&items) {
            Err(ValidationError::InvalidItem { index, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(reason, "amount out of range");
            }
            other => panic!("expected InvalidItem, got {other:?}"),
        }
    }

    #[test]
    fn test_valuate_all_reports_position() {
        let items = vec![
            LineItemInput::new("ok", dec!(1), dec!(10)),
            LineItemInput::new("ok", dec!(1), dec!(10)),
            LineItemInput::new("bad", dec!(-2), dec!(10)),
        ];
        match valuate_all(&items) {
            Err(ValidationError::InvalidItem { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected InvalidItem, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_valuate_is_exact_product(
            qty_units in 0i64..1_000_000,
            qty_scale in 0u32..4,
            price_cents in 0i64..100_000_000,
        ) {
            let quantity = Decimal::new(qty_units, qty_scale);
            let unit_price = Decimal::new(price_cents, 2);
            let total = valuate(quantity, unit_price).unwrap();
            prop_assert_eq!(total.amount(), quantity * unit_price);
            prop_assert!(!total.is_negative());
        }

        #[test]
        fn prop_valuate_rejects_any_negative_quantity(
            qty_units in 1i64..1_000_000,
            price_cents in 0i64..100_000,
        ) {
            let result = valuate(Decimal::new(-qty_units, 2), Decimal::new(price_cents, 2));
            prop_assert!(result.is_err());
        }
    }
}
