//! Fixed-point helpers
//!
//! Rates live in basis points (`RATE_PRECISION`), impacts and fractions in
//! 18-decimal fixed point (`PRECISION`). Every division floors.

use primitive_types::U256;

use crate::error::{Result, XFatError};

/// Basis-point denominator for all rates
pub const RATE_PRECISION: u128 = 10_000;

/// High-precision fixed-point scale for fractions and impact
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// `floor(a * b / denom)` with a 256-bit intermediate product
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Result<u128> {
    if denom == 0 {
        return Err(XFatError::ArithmeticOverflow);
    }
    if a == 0 || b == 0 {
        return Ok(0);
    }
    let out = U256::from(a) * U256::from(b) / U256::from(denom);
    if out > U256::from(u128::MAX) {
        return Err(XFatError::ArithmeticOverflow);
    }
    Ok(out.as_u128())
}

/// `floor(a * b / denom)`, saturating at `u128::MAX` instead of failing
pub fn mul_div_floor_saturating(a: u128, b: u128, denom: u128) -> Result<u128> {
    match mul_div_floor(a, b, denom) {
        Err(XFatError::ArithmeticOverflow) if denom != 0 => Ok(u128::MAX),
        other => other,
    }
}

/// `amount * rate / RATE_PRECISION`, floored
pub fn apply_rate(amount: u128, rate: u128) -> Result<u128> {
    mul_div_floor(amount, rate, RATE_PRECISION)
}

/// `numerator / denominator` in `PRECISION` fixed point, floored
pub fn fraction(numerator: u128, denominator: u128) -> Result<u128> {
    mul_div_floor(numerator, PRECISION, denominator)
}

/// Rescale a `PRECISION` fixed-point value into basis points, floored
pub fn to_basis_points(value: u128) -> Result<u128> {
    mul_div_floor(value, RATE_PRECISION, PRECISION)
}

pub fn checked_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(XFatError::ArithmeticOverflow)
}
