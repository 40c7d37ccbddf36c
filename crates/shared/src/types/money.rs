//! Monetary amount helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the ledger is a `rust_decimal::Decimal` in rupiah, stored
//! with two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Absolute difference under which two totals are considered equal (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Scale used when persisting and comparing amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Rounds an amount to the storage scale, half away from zero.
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true when `amount` has more decimal places than the storage scale.
#[must_use]
pub fn exceeds_amount_scale(amount: Decimal) -> bool {
    amount.normalize().scale() > AMOUNT_SCALE
}

/// Returns true when `left` and `right` differ by less than [`BALANCE_TOLERANCE`].
#[must_use]
pub fn within_tolerance(left: Decimal, right: Decimal) -> bool {
    (left - right).abs() < BALANCE_TOLERANCE
}

/// Computes `amount * percentage / 100`, rounded to the storage scale.
#[must_use]
pub fn percentage_of(amount: Decimal, percentage: Decimal) -> Decimal {
    round_amount(amount * percentage / Decimal::ONE_HUNDRED)
}

/// Percentage change from `base` to `current`.
///
/// Returns zero when the base is zero, where the change is undefined.
#[must_use]
pub fn percentage_change(base: Decimal, current: Decimal) -> Decimal {
    if base.is_zero() {
        return Decimal::ZERO;
    }
    round_amount((current - base) / base.abs() * Decimal::ONE_HUNDRED)
}
