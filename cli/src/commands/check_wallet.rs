//! Wallet registration check command implementation

use crate::utils::formatting::{format_wallet_registration_human, to_json};
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use dinsy_sdk::{is_valid_wallet_address, RegistryClient};
use tracing::info;

/// Execute the check-wallet command
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
    info!("Checking registration for wallet {}", wallet);

    let registration = registry
        .wallet_registration(wallet)
        .await
        .map_err(|e| anyhow!("Failed to check wallet registration: {e}"))?;

    match output_format {
        OutputFormat::Human => format_wallet_registration_human(wallet, &registration),
        OutputFormat::Json => to_json(&registration),
    }
}
