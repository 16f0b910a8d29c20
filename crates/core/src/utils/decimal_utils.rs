//! Rounding and comparison helpers for monetary values.
//!
//! Arithmetic keeps full `Decimal` precision; rounding happens only here, at
//! presentation and comparison boundaries.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{DISPLAY_DECIMAL_PRECISION, MONEY_TOLERANCE};
use crate::errors::ValidationError;
use crate::Result;

/// Rounds to two decimal places, midpoint away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        DISPLAY_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// True when `a` and `b` differ by no more than one cent.
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= MONEY_TOLERANCE
}

fn fits(field: &str, value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or_else(|| ValidationError::Overflow(field.to_string()).into())
}

/// `a * b`, or `ValidationError::Overflow` naming `field`.
pub fn checked_mul(field: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    fits(field, a.checked_mul(b))
}

pub fn checked_add(field: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    fits(field, a.checked_add(b))
}

pub fn checked_sub(field: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    fits(field, a.checked_sub(b))
}

/// Division by zero is reported as an overflow too.
pub fn checked_div(field: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    fits(field, a.checked_div(b))
}
