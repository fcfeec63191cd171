//! Conversion between display coins and integer base units.
//!
//! The ledger only ever sees `u64` base units. Fractional display amounts
//! (e.g. `0.05`) are converted here, at the boundary, with exact decimal
//! arithmetic.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::{Result, TreasuryError, constants};

/// Convert a display amount into base units.
///
/// # Errors
/// - `InvalidAmount` if negative or finer than one base unit
/// - `ArithmeticOverflow` if the result does not fit in `u64`
pub fn to_base_units(amount: Decimal) -> Result<u64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(TreasuryError::InvalidAmount {
            reason: format!("amount {amount} is negative"),
        });
    }
    let scaled = amount
        .checked_mul(Decimal::from(constants::BASE_UNITS_PER_COIN))
        .ok_or_else(|| TreasuryError::overflow(format!("{amount} coins in base units")))?;
    if !scaled.fract().is_zero() {
        return Err(TreasuryError::InvalidAmount {
            reason: format!(
                "amount {amount} has more than {} decimal places",
                constants::BASE_UNIT_DECIMALS
            ),
        });
    }
    scaled
        .to_u64()
        .ok_or_else(|| TreasuryError::overflow(format!("{amount} coins in base units")))
}

/// Convert base units into a display amount.
#[must_use]
pub fn from_base_units(units: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(units), constants::BASE_UNIT_DECIMALS)
}
