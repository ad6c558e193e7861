//! Validation utilities for DINSY payment inputs

use crate::{
    amount::Decimal,
    error::{DinsyError, Result},
};

/// Largest supported native decimal exponent
pub const MAX_NATIVE_DECIMALS: u32 = 36;

/// Normalize an account identifier for comparison
///
/// Account identifiers are hex strings whose letter case only carries a
/// checksum, so comparison ignores case and surrounding whitespace.
///
/// # Example
/// ```
/// # use dinsy_sdk::validation::normalize_address;
/// assert_eq!(
///     normalize_address("  0xAFa5f9670b6809F7A200DBB4A3E8bfD056c855E8 "),
///     "0xafa5f9670b6809f7a200dbb4a3e8bfd056c855e8"
/// );
/// ```
#[must_use]
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Whether two account identifiers refer to the same account
#[must_use]
pub fn addresses_match(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

/// Check that an address looks like a 20-byte `0x`-prefixed hex account
///
/// Checksum casing is not verified.
///
/// # Example
/// ```
/// # use dinsy_sdk::validation::is_valid_wallet_address;
/// assert!(is_valid_wallet_address("0xAFa5f9670b6809F7A200DBB4A3E8bfD056c855E8"));
/// assert!(!is_valid_wallet_address("0x1234"));
/// assert!(!is_valid_wallet_address("Master"));
/// ```
#[must_use]
pub fn is_valid_wallet_address(address: &str) -> bool {
    let trimmed = address.trim();
    let Some(body) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    else {
        return false;
    };
    body.len() == 40 && hex::decode(body).is_ok()
}

/// Validate an exchange rate (fiat units per native unit)
///
/// # Errors
/// Returns `InvalidExchangeRate` when the rate is not strictly positive
pub fn validate_exchange_rate(rate: &Decimal) -> Result<()> {
    if rate.is_zero() {
        return Err(DinsyError::InvalidExchangeRate(rate.to_string()));
    }
    Ok(())
}

/// Validate a sponsor share fraction
///
/// # Errors
/// Returns `InvalidSharePct` when the share is greater than 1
pub fn validate_share_pct(share: &Decimal) -> Result<()> {
    if *share > Decimal::one() {
        return Err(DinsyError::InvalidSharePct(share.to_string()));
    }
    Ok(())
}

/// Validate the native decimal exponent
///
/// # Errors
/// Returns a configuration error above [`MAX_NATIVE_DECIMALS`]
pub fn validate_native_decimals(decimals: u32) -> Result<()> {
    if decimals > MAX_NATIVE_DECIMALS {
        return Err(DinsyError::Config(format!(
            "native decimal exponent must be at most {MAX_NATIVE_DECIMALS}, got: {decimals}"
        )));
    }
    Ok(())
}

/// Validate a configured destination address
///
/// # Errors
/// Returns a configuration error naming the field when the address is malformed
pub fn validate_configured_address(field: &str, address: &str) -> Result<()> {
    if !is_valid_wallet_address(address) {
        return Err(DinsyError::Config(format!(
            "{field} must be a 0x-prefixed 20-byte hex address, got: '{address}'"
        )));
    }
    Ok(())
}

/// Require the wallet's chain to match the expected chain
///
/// # Errors
/// Returns `WrongNetwork` on mismatch
pub fn validate_chain_id(expected: u64, actual: u64) -> Result<()> {
    if expected != actual {
        return Err(DinsyError::WrongNetwork { expected, actual });
    }
    Ok(())
}
