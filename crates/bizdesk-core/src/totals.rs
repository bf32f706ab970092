//! # Document Totals
//!
//! Composes line totals, discount and tax into document totals.
//!
//! ## Order of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal        = Σ line_total                                        │
//! │  discount_amount = subtotal × discount% / 100                          │
//! │  after_discount  = subtotal − discount_amount                          │
//! │  tax_amount      = after_discount × tax% / 100                         │
//! │  total           = after_discount + tax_amount                         │
//! │                                                                         │
//! │  Discount is ALWAYS applied before tax.                                │
//! │  100.00, 10% off, 10% tax → 90.00 + 9.00 = 99.00 (never 100 × 1.1 × .9)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Proposals carry no tax: pass `None` and `total == after_discount`.
//!
//! No rounding happens here. Every field is exact so the identities above hold
//! by equality; cents rounding is left to presentation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{Money, Percentage};
use crate::validation::{validate_item_count, ValidationResult};
use crate::valuation::{valuate_all, Priced};

/// Computed totals for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub after_discount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

/// Computes totals for a list of items.
///
/// ## Errors
/// - `InvalidDiscount` when `discount_pct` is outside `[0, 100]`
/// - `InvalidTax` when `tax_pct` is outside `[0, 100]`
/// - `InvalidItem` when any item has a negative quantity or price
/// - `TooManyItems` past [`crate::MAX_LINE_ITEMS`]
///
/// An empty list is legal and yields all zeros.
///
/// ## Example
/// ```rust
/// use bizdesk_core::totals::compute_totals;
/// use bizdesk_core::types::LineItemInput;
/// use rust_decimal::Decimal;
///
/// let items = vec![LineItemInput::new("Audit", Decimal::ONE, Decimal::from(100))];
/// let totals = compute_totals(&items, Decimal::from(10), Some(Decimal::from(10))).unwrap();
/// assert_eq!(totals.total.amount(), Decimal::from(99));
/// ```
pub fn compute_totals<P: Priced>(
    items: &[P],
    discount_pct: Decimal,
    tax_pct: Option<Decimal>,
) -> ValidationResult<DocumentTotals> {
    let discount = Percentage::discount(discount_pct)?;
    let tax = match tax_pct {
        Some(pct) => Percentage::tax(pct)?,
        None => Percentage::zero(),
    };
    validate_item_count(items.len())?;

    let subtotal = Money::checked_sum(valuate_all(items)?).ok_or_else(|| out_of_range("subtotal"))?;
    apply_rates(subtotal, discount, tax)
}

/// Applies already-validated rates to a subtotal.
///
/// `AmountOutOfRange` when a result leaves the decimal range.
pub fn apply_rates(
    subtotal: Money,
    discount: Percentage,
    tax: Percentage,
) -> ValidationResult<DocumentTotals> {
    let discount_amount = discount
        .of(subtotal)
        .ok_or_else(|| out_of_range("discount_amount"))?;
    let after_discount = subtotal - discount_amount;
    let tax_amount = tax
        .of(after_discount)
        .ok_or_else(|| out_of_range("tax_amount"))?;
    let total = after_discount
        .checked_add(tax_amount)
        .ok_or_else(|| out_of_range("total"))?;

    Ok(DocumentTotals {
        subtotal,
        discount_amount,
        after_discount,
        tax_amount,
        total,
    })
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::AmountOutOfRange {
        field: field.to_string(),
    }
}
