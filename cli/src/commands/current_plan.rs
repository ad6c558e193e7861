//! Current plan command implementation

use crate::utils::formatting::{format_current_plan_human, to_json};
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use dinsy_sdk::{is_valid_wallet_address, RegistryClient, DEFAULT_TIERS};
use serde_json::json;
use tracing::info;

/// Execute the current-plan command
///
/// # Errors
/// Returns error if the address is malformed or the backend request fails
pub async fn execute(
    registry: &RegistryClient,
    wallet: &str,
    output_format: OutputFormat,
) -> Result<String> {
    let wallet = wallet.trim();
    if !is_valid_wallet_address(wallet) {
        return Err(anyhow!("Invalid wallet address '{wallet}'"));
    }
    info!("Looking up current plan for wallet {}", wallet);

    let plan = registry
        .current_plan(wallet, &DEFAULT_TIERS)
        .await
        .map_err(|e| anyhow!("Failed to look up current plan: {e}"))?;

    match output_format {
        OutputFormat::Human => Ok(format_current_plan_human(wallet, &plan)),
        OutputFormat::Json => to_json(&json!({
            "wallet": wallet,
            "plan": plan,
        })),
    }
}
