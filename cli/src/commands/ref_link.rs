//! Referral link command implementation

use crate::utils::formatting::to_json;
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use dinsy_sdk::{generate_referral_link, RegistryClient};
use serde_json::json;
use tracing::info;

/// Execute the ref-link command
///
/// With `local` set the link is built from the configured site URL without
/// asking the backend.
///
/// # Errors
/// Returns error if the backend request fails or the link cannot be built
pub async fn execute(
    registry: &RegistryClient,
    username: &str,
    local: bool,
    output_format: OutputFormat,
) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(anyhow!("Username must not be empty"));
    }

    let link = if local {
        generate_referral_link(registry.base_url(), username)
            .map_err(|e| anyhow!("Failed to build referral link: {e}"))?
            .to_string()
    } else {
        info!("Fetching referral link for {}", username);
        registry
            .ref_link(username)
            .await
            .map_err(|e| anyhow!("Failed to fetch referral link for '{username}': {e}"))?
    };

    match output_format {
        OutputFormat::Human => Ok(format!("Referral link for {username}: {link}")),
        OutputFormat::Json => to_json(&json!({ "username": username, "ref_link": link })),
    }
}
