//! Sponsor split calculation
//!
//! Maps a tier selection (or custom amount) to the total, sponsor share and
//! remainder, both in fiat and in the chain's smallest native unit.
//!
//! Fiat math is exact decimal arithmetic. Native amounts are floored
//! independently for the total and the sponsor share; the remainder is then
//! reconciled as `total_native - sponsor_native` so the two transfers always
//! add up to the total.

use crate::{
    amount::{serialize_native, Decimal, NativeAmount},
    error::{DinsyError, Result},
    tiers::TierCatalog,
    validation::{validate_exchange_rate, validate_native_decimals, validate_share_pct},
};
use serde::Serialize;
use tracing::debug;

/// Default sponsor share (9%)
pub const DEFAULT_SPONSOR_SHARE_PCT: &str = "0.09";

/// Decimal places of the reference chain's native unit
pub const DEFAULT_NATIVE_DECIMALS: u32 = 18;

/// Pricing parameters shared by every split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitParams {
    /// Fiat units per one whole native unit
    pub exchange_rate: Decimal,
    /// Sponsor share in [0, 1]
    pub sponsor_share_pct: Decimal,
    /// `10^native_decimals` smallest units make one native unit
    pub native_decimals: u32,
}

impl SplitParams {
    #[must_use]
    pub const fn new(exchange_rate: Decimal, sponsor_share_pct: Decimal, native_decimals: u32) -> Self {
        Self {
            exchange_rate,
            sponsor_share_pct,
            native_decimals,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_exchange_rate(&self.exchange_rate)?;
        validate_share_pct(&self.sponsor_share_pct)?;
        validate_native_decimals(self.native_decimals)
    }
}

/// Output of one split calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitResult {
    pub total_fiat: Decimal,
    pub sponsor_fiat: Decimal,
    pub remainder_fiat: Decimal,
    #[serde(serialize_with = "serialize_native")]
    pub total_native: NativeAmount,
    #[serde(serialize_with = "serialize_native")]
    pub sponsor_native: NativeAmount,
    #[serde(serialize_with = "serialize_native")]
    pub remainder_native: NativeAmount,
}

/// Split an already-resolved fiat total
pub fn split_amount(total_fiat: Decimal, params: &SplitParams) -> Result<SplitResult> {
    params.validate()?;

    let sponsor_fiat = total_fiat.product(&params.sponsor_share_pct);
    let remainder_fiat = total_fiat.checked_sub(&sponsor_fiat)?;

    let total_native = total_fiat.to_native_units(&params.exchange_rate, params.native_decimals)?;
    let sponsor_native =
        sponsor_fiat.to_native_units(&params.exchange_rate, params.native_decimals)?;
    let remainder_native = total_native
        .checked_sub(sponsor_native)
        .ok_or(DinsyError::AmountOverflow("remainder reconciliation"))?;

    debug!(
        service = "dinsy-sdk",
        component = "split",
        event = "split_computed",
        total_fiat = %total_fiat,
        sponsor_fiat = %sponsor_fiat,
        total_native = %total_native,
        sponsor_native = %sponsor_native,
        remainder_native = %remainder_native,
        "Computed sponsor split"
    );

    Ok(SplitResult {
        total_fiat,
        sponsor_fiat,
        remainder_fiat,
        total_native,
        sponsor_native,
        remainder_native,
    })
}

/// Resolve the level's fiat total and split it
///
/// # Errors
/// - `UnknownLevel` when the level is not in the catalogue
/// - `InvalidCustomAmount` when level 0 lacks a positive custom amount
/// - `InvalidExchangeRate` when the rate is zero
/// - `InvalidSharePct` when the share exceeds 1
pub fn calculate_split(
    tiers: &TierCatalog,
    level: u32,
    custom_amount_usd: Option<&str>,
    params: &SplitParams,
) -> Result<SplitResult> {
    let total_fiat = tiers.resolve_total(level, custom_amount_usd)?;
    split_amount(total_fiat, params)
}
