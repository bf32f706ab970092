//! # Money Module
//!
//! Provides the `Money` and `Percentage` types for handling monetary values safely.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Invoices quote fractional quantities (1.5 hours) and percentages      │
//! │  (12.5% tax), so integer cents are not enough either.                  │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 decimals (rust_decimal)                         │
//! │    1.5 × 33.33 = 49.995 exactly                                        │
//! │    Amounts stay exact inside the engine; rounding to cents happens     │
//! │    only when a value is displayed.                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bizdesk_core::money::{Money, Percentage};
//! use rust_decimal::Decimal;
//!
//! let subtotal = Money::new(Decimal::from(100));
//! let discount = Percentage::discount(Decimal::from(10)).unwrap();
//!
//! let after_discount = subtotal - discount.of(subtotal).unwrap();
//! assert_eq!(after_discount.amount(), Decimal::from(90));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

// =============================================================================
// Money Type
// =============================================================================

/// Represents an exact monetary value.
///
/// ## Design Decisions
/// - **Decimal**: exact base-10 arithmetic, no float drift
/// - **Single field tuple struct**: zero-cost abstraction over `Decimal`
/// - **Serialized as a string**: `"140.4"`, never a JSON float
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineItem.quantity × unit_price ──► LineItem.line_total                 │
/// │                                          │                              │
/// │                                    Σ ────┘                              │
/// │                                    ▼                                    │
/// │  subtotal ──► − discount ──► after_discount ──► + tax ──► total         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns zero money value.
    ///
    /// ## Example
    /// ```rust
    /// use bizdesk_core::money::Money;
    ///
    /// let zero = Money::zero();
    /// assert!(zero.is_zero());
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying exact amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Adds two amounts, `None` past the decimal range.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Sums amounts, `None` as soon as the running total leaves the range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Rounds to two decimal places using Bankers Rounding (round half to even).
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.125 → 0.13, 0.135 → 0.14 (always up = +bias)                  │
    /// │                                                                     │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN digit:                │
    /// │    0.125 → 0.12, 0.135 → 0.14 (alternates = no bias)               │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Stored totals are never rounded; this is for presentation.
    ///
    /// ## Example
    /// ```rust
    /// use bizdesk_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let amount = Money::new(Decimal::new(49995, 3)); // 49.995
    /// assert_eq!(amount.round_to_cents().amount(), Decimal::new(5000, 2));
    /// ```
    pub fn round_to_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
        )
    }
}

// =============================================================================
// Percentage Type
// =============================================================================

/// A percentage in the closed range `[0, 100]`.
///
/// The two constructors only differ in which validation error they raise,
/// so callers get `InvalidDiscount` or `InvalidTax` as appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Percentage(Decimal);

impl Percentage {
    const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

    /// Validates a discount percentage.
    ///
    /// ## Example
    /// ```rust
    /// use bizdesk_core::money::Percentage;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(Percentage::discount(Decimal::from(10)).is_ok());
    /// assert!(Percentage::discount(Decimal::from(101)).is_err());
    /// ```
    pub fn discount(value: Decimal) -> ValidationResult<Self> {
        if Self::in_range(value) {
            Ok(Percentage(value))
        } else {
            Err(ValidationError::InvalidDiscount {
                value: value.to_string(),
            })
        }
    }

    /// Validates a tax percentage.
    pub fn tax(value: Decimal) -> ValidationResult<Self> {
        if Self::in_range(value) {
            Ok(Percentage(value))
        } else {
            Err(ValidationError::InvalidTax {
                value: value.to_string(),
            })
        }
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(Decimal::ZERO)
    }

    /// Returns the raw percentage value (10 for 10%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns `amount × (pct / 100)`, exactly; `None` past the decimal range.
    ///
    /// The rate is scaled first, so the product never exceeds `amount`.
    pub fn of(&self, amount: Money) -> Option<Money> {
        amount
            .amount()
            .checked_mul(self.0 / Self::HUNDRED)
            .map(Money)
    }

    fn in_range(value: Decimal) -> bool {
        value >= Decimal::ZERO && value <= Self::HUNDRED
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount rounded to cents, without a currency symbol.
///
/// ## Note
/// The currency symbol is an application setting; see the CLI config.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_to_cents().0;
        rounded.rescale(2);
        write!(f, "{}", rounded)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

/// Multiplication by a decimal quantity.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
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
    use rust_decimal_macros::dec;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::new(dec!(140.4))), "140.40");
        assert_eq!(format!("{}", Money::new(dec!(5))), "5.00");
        assert_eq!(format!("{}", Money::new(dec!(-5.5))), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(dec!(10.00));
        let b = Money::new(dec!(5.25));

        assert_eq!((a + b).amount(), dec!(15.25));
        assert_eq!((a - b).amount(), dec!(4.75));
        assert_eq!((a * dec!(1.5)).amount(), dec!(15));

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.amount(), dec!(20.50));
    }

    #[test]
    fn test_bankers_rounding() {
        assert_eq!(Money::new(dec!(0.125)).round_to_cents().amount(), dec!(0.12));
        assert_eq!(Money::new(dec!(0.135)).round_to_cents().amount(), dec!(0.14));
        assert_eq!(Money::new(dec!(49.995)).round_to_cents().amount(), dec!(50.00));
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::discount(dec!(0)).is_ok());
        assert!(Percentage::discount(dec!(100)).is_ok());
        assert!(matches!(
            Percentage::discount(dec!(-0.01)),
            Err(ValidationError::InvalidDiscount { .. })
        ));
        assert!(matches!(
            Percentage::tax(dec!(100.5)),
            Err(ValidationError::InvalidTax { .. })
        ));
    }

    #[test]
    fn test_percentage_of() {
        let pct = Percentage::tax(dec!(12.5)).unwrap();
        assert_eq!(pct.of(Money::new(dec!(80))).unwrap().amount(), dec!(10));
        assert_eq!(format!("{}", pct), "12.5%");
    }

    #[test]
    fn test_percentage_of_near_the_limit() {
        let full = Percentage::discount(dec!(100)).unwrap();
        let huge = Money::new(Decimal::MAX);
        assert_eq!(full.of(huge), Some(huge));
    }

    #[test]
    fn test_checked_sum_overflow() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(Money::checked_sum([huge, Money::new(dec!(1))]), None);
        assert_eq!(
            Money::checked_sum([Money::new(dec!(1.5)), Money::new(dec!(2))]),
            Some(Money::new(dec!(3.5)))
        );
    }

    /// Fractional quantities keep full precision until display.
    #[test]
    fn test_no_precision_loss() {
        let line = Money::new(dec!(33.33)) * dec!(1.5);
        assert_eq!(line.amount(), dec!(49.995));
        assert_eq!(line.to_string(), "50.00");
    }
}
