//! Amount <-> base-unit conversion
//!
//! Amounts cross the contract boundary as integers in the token's smallest
//! denomination. Callers deal in decimal strings ("1.5"). Conversion is
//! exact string arithmetic on top of `U256`; extra fractional digits beyond
//! the token's decimals are rounded down.

use alloy_primitives::U256;

use crate::error::{Result, SdkError};

/// Decimals used by datatokens, fees and exchange rates
pub const WEI_DECIMALS: u8 = 18;

/// Convert a human-readable decimal string into base units.
pub fn amount_to_units(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(SdkError::invalid("amount is empty"));
    }
    if amount.starts_with('-') {
        return Err(SdkError::invalid(format!("amount {amount} is negative")));
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(SdkError::invalid(format!("amount {amount} has no digits")));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(SdkError::invalid(format!("amount {amount} is not a decimal number")));
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    if frac_part.len() >= decimals {
        digits.push_str(&frac_part[..decimals]);
    } else {
        digits.push_str(frac_part);
        digits.extend(std::iter::repeat('0').take(decimals - frac_part.len()));
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10)
        .map_err(|_| SdkError::invalid(format!("amount {amount} does not fit in 256 bits")))
}

/// Convert base units back into the shortest decimal string.
pub fn units_to_amount(units: U256, decimals: u8) -> String {
    let raw = units.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return raw;
    }

    let padded = if raw.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - raw.len()), raw)
    } else {
        raw
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// 18-decimal shortcut for rates, fee fractions and datatoken amounts
pub fn to_wei(amount: &str) -> Result<U256> {
    amount_to_units(amount, WEI_DECIMALS)
}

pub fn from_wei(units: U256) -> String {
    units_to_amount(units, WEI_DECIMALS)
}

/// Tokens that report 0 decimals are treated as 18-decimal tokens.
pub fn effective_decimals(reported: u8) -> u8 {
    if reported == 0 {
        WEI_DECIMALS
    } else {
        reported
    }
}
