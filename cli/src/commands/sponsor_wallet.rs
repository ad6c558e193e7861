//! Sponsor wallet lookup command implementation

use crate::utils::formatting::to_json;
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use dinsy_sdk::SponsorLookup;
use serde_json::json;
use tracing::info;

/// Execute the sponsor-wallet command
///
/// # Errors
/// Returns error if the lookup fails or the username has no wallet
pub async fn execute<L: SponsorLookup>(
    sponsors: &L,
    username: &str,
    output_format: OutputFormat,
) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(anyhow!("Username must not be empty"));
    }
    info!("Looking up sponsor wallet for {}", username);

    let wallet = sponsors
        .sponsor_wallet(username)
        .await
        .map_err(|e| anyhow!("Failed to look up sponsor '{username}': {e}"))?
        .ok_or_else(|| anyhow!("Sponsor not found: {username}"))?;

    match output_format {
        OutputFormat::Human => Ok(format!("Sponsor {username}: {wallet}")),
        OutputFormat::Json => to_json(&json!({ "username": username, "wallet": wallet })),
    }
}
