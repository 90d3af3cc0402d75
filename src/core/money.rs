//! Money arithmetic - decimal amounts, cent conversion and sales tax.
//!
//! Amounts are `rust_decimal::Decimal` in the domain and `i64` cents in storage.
//! Everything shown to the customer is rounded to two decimal places, midpoints
//! away from zero.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// Sales tax applied to every sale unless the store configures another rate (16%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// Rounds an amount to whole cents.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an amount to integer cents for storage.
///
/// # Errors
/// Returns `Error::InvalidAmount` if the amount does not fit in an `i64` of cents.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    round_cents(amount)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or(Error::InvalidAmount { amount })
}

/// Converts stored cents back to a decimal amount.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Formats an amount as dollars with two decimals, e.g. `$6.96`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", round_cents(amount))
}

/// Subtotal, tax and grand total of a cart or sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    /// Sum of line subtotals
    pub subtotal: Decimal,
    /// `subtotal * tax_rate`, rounded to cents
    pub tax: Decimal,
    /// `subtotal + tax`
    pub total: Decimal,
}

impl Totals {
    /// Computes tax and total for a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal, tax_rate: Decimal) -> Self {
        let subtotal = round_cents(subtotal);
        let tax = round_cents(subtotal * tax_rate);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_tax_rate_is_sixteen_percent() {
        assert_eq!(DEFAULT_TAX_RATE, dec("0.16"));
    }

    #[test]
    fn test_totals_single_line_scenario() {
        let totals = Totals::from_subtotal(dec("6.00"), DEFAULT_TAX_RATE);
        assert_eq!(totals.subtotal, dec("6.00"));
        assert_eq!(totals.tax, dec("0.96"));
        assert_eq!(totals.total, dec("6.96"));
    }

    #[test]
    fn test_totals_two_line_scenario() {
        let totals = Totals::from_subtotal(dec("37.50"), DEFAULT_TAX_RATE);
        assert_eq!(totals.tax, dec("6.00"));
        assert_eq!(totals.total, dec("43.50"));
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        // 0.05 * 0.16 = 0.008
        let totals = Totals::from_subtotal(dec("0.05"), DEFAULT_TAX_RATE);
        assert_eq!(totals.tax, dec("0.01"));
        assert_eq!(totals.total, dec("0.06"));

        assert_eq!(round_cents(dec("0.125")), dec("0.13"));
        assert_eq!(round_cents(dec("-0.125")), dec("-0.13"));
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(dec("6.96")).unwrap(), 696);
        assert_eq!(to_cents(dec("0.005")).unwrap(), 1);
        assert_eq!(from_cents(696), dec("6.96"));
        assert_eq!(from_cents(-150), dec("-1.50"));
        assert_eq!(from_cents(0), Decimal::ZERO);
    }

    #[test]
    fn test_to_cents_rejects_overflow() {
        let result = to_cents(Decimal::MAX);
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("6.96")), "$6.96");
        assert_eq!(format_amount(dec("2")), "$2.00");
        assert_eq!(format_amount(dec("0.004")), "$0.00");
    }
}
