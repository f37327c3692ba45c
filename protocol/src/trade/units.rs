//! Conversion between user-entered decimal amounts and integer base units.

use thiserror::Error;

use crate::config::{DEFAULT_ASSET_DECIMALS, DISPLAY_DECIMALS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount `{0}`")]
    Invalid(String),

    #[error("amount `{0}` does not fit into base units")]
    Overflow(String),
}

/// Convert a decimal string (`"1.5"`, `".25"`, `"3"`) into base units with
/// `decimals` fractional digits (9 when unknown). Extra fractional digits
/// are truncated, never rounded.
pub fn to_base_units(amount: &str, decimals: Option<u32>) -> Result<u128, UnitsError> {
    let decimals = decimals.unwrap_or(DEFAULT_ASSET_DECIMALS) as usize;
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }

    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (unsigned, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::Invalid(amount.to_string()));
    }

    let kept: String = fraction.chars().take(decimals).collect();
    let digits = format!("{whole}{kept:0<decimals$}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse::<u128>()
        .map_err(|_| UnitsError::Overflow(amount.to_string()))
}

/// Render base units as a decimal with two fractional digits, rounding half
/// up.
pub fn from_base_units(units: u128, decimals: Option<u32>) -> String {
    let decimals = decimals.unwrap_or(DEFAULT_ASSET_DECIMALS);
    let shown = DISPLAY_DECIMALS as u32;

    let hundredths = if decimals >= shown {
        match 10u128.checked_pow(decimals - shown) {
            Some(divisor) => {
                let quotient = units / divisor;
                let remainder = units % divisor;
                if divisor > 1 && remainder >= divisor - remainder {
                    quotient + 1
                } else {
                    quotient
                }
            }
            None => 0,
        }
    } else {
        units.saturating_mul(10u128.pow(shown - decimals))
    };

    let scale = 10u128.pow(shown);
    format!(
        "{}.{:0width$}",
        hundredths / scale,
        hundredths % scale,
        width = DISPLAY_DECIMALS
    )
}
