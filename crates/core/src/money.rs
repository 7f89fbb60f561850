//! Decimal helpers for monetary and quantity fields.
//!
//! Fiscal documents carry amounts as fixed-precision strings. All arithmetic
//! happens on [`Decimal`]; nothing here touches binary floating point.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for monetary amounts (`valor_*` fields).
pub const MONEY_SCALE: u32 = 2;

/// Decimal places for commercial quantities.
pub const QUANTITY_SCALE: u32 = 4;

/// Decimal places for unit values.
pub const UNIT_VALUE_SCALE: u32 = 4;

/// Round half away from zero to `scale` places, keeping trailing zeros.
pub fn round_to(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// Round a monetary amount to cents.
pub fn round_money(value: Decimal) -> Decimal {
    round_to(value, MONEY_SCALE)
}

/// Render `value` with exactly `scale` decimal places (`"350.00"`).
pub fn to_fixed(value: Decimal, scale: u32) -> String {
    round_to(value, scale).to_string()
}

/// Render a monetary amount with two decimals.
pub fn money_string(value: Decimal) -> String {
    to_fixed(value, MONEY_SCALE)
}
