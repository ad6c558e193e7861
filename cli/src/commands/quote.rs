//! Quote command implementation
//!
//! Computes the sponsor split for a level without contacting the wallet.

use crate::config::DinsyCliConfig;
use crate::utils::formatting::{format_split_human, to_json};
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use dinsy_sdk::{calculate_split, PaymentConfig, DEFAULT_TIERS};
use serde_json::json;
use tracing::info;

/// Execute the quote command
///
/// # Errors
/// Returns error if the level is unknown, the custom amount is missing or invalid,
/// or the configured rate or share is invalid
pub fn execute(
    payment_config: &PaymentConfig,
    config: &DinsyCliConfig,
    level: u32,
    custom_amount_usd: Option<&str>,
    output_format: OutputFormat,
) -> Result<String> {
    info!("Quoting level {}", level);

    let split = calculate_split(
        &DEFAULT_TIERS,
        level,
        custom_amount_usd,
        &payment_config.split_params(),
    )
    .map_err(|e| anyhow!("Failed to compute split: {e}"))?;

    match output_format {
        OutputFormat::Human => {
            let label = DEFAULT_TIERS.find(level).map_or("", |tier| tier.label);
            Ok(format!(
                "Level {level} ({label})\n{}",
                format_split_human(&split, payment_config, &config.native_symbol)?
            ))
        }
        OutputFormat::Json => to_json(&json!({
            "level": level,
            "exchange_rate": payment_config.exchange_rate,
            "sponsor_share_pct": payment_config.sponsor_share_pct,
            "split": split,
        })),
    }
}
