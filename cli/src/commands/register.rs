//! Register command implementation

use crate::utils::formatting::to_json;
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use dinsy_sdk::{Registration, RegistryClient, DEFAULT_TIERS};
use tracing::info;

/// Registration parameters from the command line
#[derive(Debug, Clone)]
pub struct RegisterRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub username: &'a str,
    pub sponsor: Option<&'a str>,
    pub level: u32,
    pub wallet: &'a str,
}

impl RegisterRequest<'_> {
    /// Build the backend registration, rejecting levels outside the catalogue
    ///
    /// # Errors
    /// Returns error for an unknown level or missing fields
    pub fn to_registration(&self) -> Result<Registration> {
        if DEFAULT_TIERS.find(self.level).is_none() {
            return Err(anyhow!("Unknown level: {}", self.level));
        }
        let registration = Registration {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            username: self.username.trim().to_string(),
            sponsor: self.sponsor.map(|s| s.trim().to_string()),
            level: self.level,
            wallet: self.wallet.trim().to_string(),
            ref_link: None,
        };
        registration
            .validate()
            .map_err(|e| anyhow!("Invalid registration: {e}"))?;
        Ok(registration)
    }
}

/// Execute the register command
///
/// # Errors
/// Returns error if the registration is invalid or the backend rejects it
pub async fn execute(
    registry: &RegistryClient,
    request: &RegisterRequest<'_>,
    output_format: OutputFormat,
) -> Result<String> {
    let registration = request.to_registration()?;
    info!("Registering {} at level {}", registration.username, registration.level);

    let receipt = registry
        .register(registration)
        .await
        .map_err(|e| anyhow!("Failed to register user: {e}"))?;

    match output_format {
        OutputFormat::Human => Ok(format!(
            "{}\nUsername: {}\nReferral link: {}",
            if receipt.message.is_empty() {
                "User registered successfully"
            } else {
                receipt.message.as_str()
            },
            request.username.trim(),
            receipt.ref_link
        )),
        OutputFormat::Json => to_json(&receipt),
    }
}
