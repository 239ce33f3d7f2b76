//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic is done with `Decimal` internally, then converted
//! to `f64` for storage/serialization, rounded to 2 decimal places half-up.
//! The payment gateway speaks in minor units (cents); conversion to and from
//! minor units happens here and nowhere else.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for precise calculation
///
/// Non-finite input maps to zero; stored amounts are always finite because
/// they were produced by [`to_f64`].
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or(0.0)
}

/// Round a monetary value to 2 decimal places, half-up
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount to the gateway's minor unit (cents)
pub fn to_minor_units(amount: f64) -> i64 {
    (round_money(to_decimal(amount)) * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(0)
}

/// Convert a minor-unit amount (cents) back to major units
pub fn from_minor_units(minor: i64) -> f64 {
    to_f64(Decimal::from(minor) / Decimal::ONE_HUNDRED)
}

/// Check the order total invariant:
/// `total == subtotal + tax + delivery_fee - discount`
///
/// Stored f64 amounts are normalized through [`round_money`] before the
/// comparison so binary-float noise cannot produce a false mismatch.
pub fn totals_balance(subtotal: f64, tax: f64, delivery_fee: f64, discount: f64, total: f64) -> bool {
    let expected = round_money(to_decimal(subtotal))
        + round_money(to_decimal(tax))
        + round_money(to_decimal(delivery_fee))
        - round_money(to_decimal(discount));
    round_money(to_decimal(total)) == round_money(expected)
}
