//! Plan purchase command implementation
//!
//! Sends the full plan price to the plan address in one transfer, priced at
//! the network's current gas price.

use crate::config::DinsyCliConfig;
use crate::utils::formatting::{format_plan_receipt_human, to_json};
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use dinsy_sdk::{FundsPolicy, PaymentConfig, PlanPurchase, WalletSigner};
use tracing::info;

/// Execute the pay-plan command
///
/// # Errors
/// Returns error if the wallet is unavailable or on the wrong network, the level is
/// not a plan, the balance is insufficient without `force`, or the transfer is rejected
pub async fn execute<W: WalletSigner>(
    wallet: &W,
    payment_config: &PaymentConfig,
    config: &DinsyCliConfig,
    level: u32,
    force: bool,
    output_format: OutputFormat,
) -> Result<String> {
    info!("Starting plan purchase for level {}", level);

    let mut payment_config = payment_config.clone();
    if force {
        payment_config.funds_policy = FundsPolicy::Proceed;
    }

    let purchase = PlanPurchase::new(wallet, &payment_config);
    let context = purchase
        .connect()
        .await
        .map_err(|e| anyhow!("Failed to connect wallet: {e}"))?;

    let receipt = purchase
        .pay(&context, level)
        .await
        .map_err(|e| anyhow!("Plan purchase failed: {e}"))?;

    info!("Plan purchase submitted: {}", receipt.tx);

    match output_format {
        OutputFormat::Human => {
            format_plan_receipt_human(&receipt, &payment_config, &config.native_symbol)
        }
        OutputFormat::Json => to_json(&receipt),
    }
}
