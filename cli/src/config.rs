//! Configuration management for the DINSY CLI
//!
//! Endpoint and display settings, configurable via environment variables
//! with sensible defaults. Command-line flags override these values.

use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

/// Centralized configuration for the DINSY CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DinsyCliConfig {
    /// Wallet JSON-RPC endpoint
    pub rpc_url: String,

    /// Membership backend base URL
    pub api_base_url: String,

    /// Default output format for CLI commands
    pub default_output_format: String,

    /// Timeout for every HTTP request
    pub http_timeout_secs: u64,

    /// Ticker shown next to native amounts
    pub native_symbol: String,
}

impl DinsyCliConfig {
    /// Create a new configuration instance with values from environment variables
    /// or sensible defaults if not set
    ///
    /// # Errors
    /// Returns an error if a numeric variable is set but malformed
    pub fn new() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    ///
    /// # Errors
    /// Returns an error if a numeric variable is set but malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_timeout_secs = match lookup("DINSY_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid DINSY_HTTP_TIMEOUT_SECS '{raw}': {e}"))?,
            None => 30,
        };

        Ok(Self {
            rpc_url: lookup("DINSY_RPC_URL").unwrap_or_else(|| "http://127.0.0.1:8545".to_string()),

            api_base_url: lookup("DINSY_API_URL")
                .unwrap_or_else(|| dinsy_sdk::registry::DEFAULT_SITE_URL.to_string()),

            default_output_format: lookup("DINSY_OUTPUT_FORMAT")
                .unwrap_or_else(|| "human".to_string()),

            http_timeout_secs,

            native_symbol: lookup("DINSY_NATIVE_SYMBOL").unwrap_or_else(|| "BNB".to_string()),
        })
    }

    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
