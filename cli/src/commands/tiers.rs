//! List tiers command implementation

use crate::config::DinsyCliConfig;
use crate::utils::formatting::{format_tiers_human, tier_infos, to_json};
use crate::utils::OutputFormat;
use anyhow::Result;
use dinsy_sdk::{PaymentConfig, DEFAULT_TIERS};
use serde_json::json;
use tracing::info;

/// Execute the tiers command
///
/// # Errors
/// Returns error if a tier price cannot be converted at the configured rate
pub fn execute(
    payment_config: &PaymentConfig,
    config: &DinsyCliConfig,
    output_format: OutputFormat,
) -> Result<String> {
    info!("Listing {} membership tiers", DEFAULT_TIERS.len());

    match output_format {
        OutputFormat::Human => format_tiers_human(&DEFAULT_TIERS, payment_config, &config.native_symbol),
        OutputFormat::Json => to_json(&json!({
            "exchange_rate": payment_config.exchange_rate,
            "native_decimals": payment_config.native_decimal_exponent,
            "tiers": tier_infos(&DEFAULT_TIERS, payment_config)?,
        })),
    }
}
