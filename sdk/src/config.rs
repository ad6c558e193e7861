//! Payment configuration
//!
//! Pricing, destinations and chain parameters for the payment flow. Values
//! start from built-in defaults, may be replaced by a JSON file and are then
//! overlaid with `DINSY_*` environment variables.

use crate::{
    amount::Decimal,
    error::{DinsyError, Result},
    payment::FundsPolicy,
    registry::DEFAULT_SPONSOR_USERNAME,
    sponsor::DefaultSponsor,
    split::{SplitParams, DEFAULT_NATIVE_DECIMALS},
    transfer::CoincidentPolicy,
    validation::{
        addresses_match, validate_configured_address, validate_exchange_rate,
        validate_native_decimals, validate_share_pct,
    },
    wallet::{FeeModel, DEFAULT_GAS_LIMIT},
};
use ruint::aliases::U256;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Treasury receiving the remainder of every payment
pub const DEFAULT_REMAINDER_ADDRESS: &str = "0xAFa5f9670b6809F7A200DBB4A3E8bfD056c855E8";

/// Receiver of fixed-price plan purchases
pub const DEFAULT_PLAN_ADDRESS: &str = "0xB54aD663bBcbcB0bFadc7f0cB6Df3E44caa25E0c";

/// BNB Smart Chain mainnet
pub const DEFAULT_CHAIN_ID: u64 = 56;

/// USD per native unit used when nothing else is configured
pub const DEFAULT_EXCHANGE_RATE: u64 = 593;

/// Environment variable names
pub mod env_keys {
    pub const EXCHANGE_RATE: &str = "DINSY_EXCHANGE_RATE";
    pub const SPONSOR_SHARE_PCT: &str = "DINSY_SPONSOR_SHARE_PCT";
    pub const REMAINDER_ADDRESS: &str = "DINSY_REMAINDER_ADDRESS";
    pub const DEFAULT_SPONSOR_ADDRESS: &str = "DINSY_DEFAULT_SPONSOR_ADDRESS";
    pub const DEFAULT_SPONSOR_USERNAME: &str = "DINSY_DEFAULT_SPONSOR_USERNAME";
    pub const PLAN_ADDRESS: &str = "DINSY_PLAN_ADDRESS";
    pub const GAS_LIMIT: &str = "DINSY_GAS_LIMIT";
    pub const MAX_FEE_PER_GAS: &str = "DINSY_MAX_FEE_PER_GAS";
    pub const GAS_PRICE: &str = "DINSY_GAS_PRICE";
    pub const CHAIN_ID: &str = "DINSY_CHAIN_ID";
    pub const NATIVE_DECIMALS: &str = "DINSY_NATIVE_DECIMALS";
    pub const COINCIDENT_POLICY: &str = "DINSY_COINCIDENT_POLICY";
    pub const FUNDS_POLICY: &str = "DINSY_FUNDS_POLICY";
}

/// Configuration for split calculation and transfer submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Fiat units per one whole native unit
    pub exchange_rate: Decimal,
    pub sponsor_share_pct: Decimal,
    pub remainder_address: String,
    /// Fixed sponsor destination when the payer names no sponsor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sponsor_address: Option<String>,
    /// Sponsor looked up when the payer names no sponsor and no fixed
    /// address is configured
    pub default_sponsor_username: String,
    /// Receiver of plan purchases
    pub plan_address: String,
    pub gas_limit: u64,
    pub fee: FeeModel,
    pub expected_chain_id: u64,
    pub native_decimal_exponent: u32,
    /// `None` until chosen; behaves as [`CoincidentPolicy::default`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coincident_policy: Option<CoincidentPolicy>,
    pub funds_policy: FundsPolicy,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            exchange_rate: Decimal::from_u64(DEFAULT_EXCHANGE_RATE),
            // 9%
            sponsor_share_pct: Decimal::new(U256::from(9_u64), 2),
            remainder_address: DEFAULT_REMAINDER_ADDRESS.to_string(),
            default_sponsor_address: None,
            default_sponsor_username: DEFAULT_SPONSOR_USERNAME.to_string(),
            plan_address: DEFAULT_PLAN_ADDRESS.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
            fee: FeeModel::default(),
            expected_chain_id: DEFAULT_CHAIN_ID,
            native_decimal_exponent: DEFAULT_NATIVE_DECIMALS,
            coincident_policy: None,
            funds_policy: FundsPolicy::default(),
        }
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| DinsyError::Config(format!("{key}='{raw}': {e}")))
}

fn parse_policy<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase()))
        .map_err(|e| DinsyError::Config(format!("{key}='{raw}': {e}")))
}

impl PaymentConfig {
    /// Overlay variables from `lookup` onto this configuration
    ///
    /// Malformed values are errors rather than silently ignored.
    ///
    /// # Errors
    /// Returns a configuration error naming the offending variable
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(env_keys::EXCHANGE_RATE) {
            self.exchange_rate = parse_var(env_keys::EXCHANGE_RATE, &raw)?;
        }
        if let Some(raw) = lookup(env_keys::SPONSOR_SHARE_PCT) {
            self.sponsor_share_pct = parse_var(env_keys::SPONSOR_SHARE_PCT, &raw)?;
        }
        if let Some(raw) = lookup(env_keys::REMAINDER_ADDRESS) {
            self.remainder_address = raw.trim().to_string();
        }
        if let Some(raw) = lookup(env_keys::DEFAULT_SPONSOR_ADDRESS) {
            let address = raw.trim();
            self.default_sponsor_address = (!address.is_empty()).then(|| address.to_string());
        }
        if let Some(raw) = lookup(env_keys::DEFAULT_SPONSOR_USERNAME) {
            self.default_sponsor_username = raw.trim().to_string();
        }
        if let Some(raw) = lookup(env_keys::PLAN_ADDRESS) {
            self.plan_address = raw.trim().to_string();
        }
        if let Some(raw) = lookup(env_keys::GAS_LIMIT) {
            self.gas_limit = parse_var(env_keys::GAS_LIMIT, &raw)?;
        }

        match (
            lookup(env_keys::MAX_FEE_PER_GAS),
            lookup(env_keys::GAS_PRICE),
        ) {
            (Some(_), Some(_)) => {
                return Err(DinsyError::Config(format!(
                    "set only one of {} and {}",
                    env_keys::MAX_FEE_PER_GAS,
                    env_keys::GAS_PRICE
                )));
            }
            (Some(raw), None) => {
                self.fee = FeeModel::MaxFeePerGas(parse_var(env_keys::MAX_FEE_PER_GAS, &raw)?);
            }
            (None, Some(raw)) => {
                self.fee = FeeModel::GasPrice(parse_var(env_keys::GAS_PRICE, &raw)?);
            }
            (None, None) => {}
        }

        if let Some(raw) = lookup(env_keys::CHAIN_ID) {
            self.expected_chain_id = parse_chain_id(&raw)?;
        }
        if let Some(raw) = lookup(env_keys::NATIVE_DECIMALS) {
            self.native_decimal_exponent = parse_var(env_keys::NATIVE_DECIMALS, &raw)?;
        }
        if let Some(raw) = lookup(env_keys::COINCIDENT_POLICY) {
            self.coincident_policy = Some(parse_policy(env_keys::COINCIDENT_POLICY, &raw)?);
        }
        if let Some(raw) = lookup(env_keys::FUNDS_POLICY) {
            self.funds_policy = parse_policy(env_keys::FUNDS_POLICY, &raw)?;
        }
        Ok(self)
    }

    /// Defaults overlaid with the process environment
    ///
    /// # Errors
    /// Returns a configuration error for malformed variables
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|key| env::var(key).ok())
    }

    /// Read a JSON configuration file; missing fields take their defaults
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| DinsyError::Config(format!("cannot read {}: {e}", path.display())))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the configuration as pretty JSON, creating parent directories
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DinsyError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .map_err(|e| DinsyError::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// `<config dir>/dinsy/config.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dinsy").join("config.json"))
    }

    /// Explicit file, else the default file if present, else defaults;
    /// then environment overrides and validation
    ///
    /// # Errors
    /// Returns an error if a file cannot be loaded, a variable is malformed or
    /// the result is invalid
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(path, |key| env::var(key).ok())
    }

    /// [`Self::resolve`] with an explicit variable source
    ///
    /// # Errors
    /// See [`Self::resolve`]
    pub fn resolve_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(default) => Self::load(&default)?,
                None => Self::default(),
            },
        };
        let config = base.overlay(lookup)?;
        config.validate()?;

        debug!(
            service = "dinsy-sdk",
            component = "config",
            event = "config_resolved",
            exchange_rate = %config.exchange_rate,
            sponsor_share_pct = %config.sponsor_share_pct,
            expected_chain_id = config.expected_chain_id,
            "Resolved payment configuration"
        );
        Ok(config)
    }

    /// # Errors
    /// Returns the first invalid setting
    pub fn validate(&self) -> Result<()> {
        validate_exchange_rate(&self.exchange_rate)?;
        validate_share_pct(&self.sponsor_share_pct)?;
        validate_native_decimals(self.native_decimal_exponent)?;
        validate_configured_address("remainder_address", &self.remainder_address)?;
        validate_configured_address("plan_address", &self.plan_address)?;
        match &self.default_sponsor_address {
            Some(address) => {
                validate_configured_address("default_sponsor_address", address)?;
                if self.coincident_policy.is_none()
                    && addresses_match(address, &self.remainder_address)
                {
                    return Err(DinsyError::Config(
                        "default_sponsor_address equals remainder_address; set coincident_policy to choose what is sent"
                            .to_string(),
                    ));
                }
            }
            None if self.default_sponsor_username.trim().is_empty() => {
                return Err(DinsyError::Config(
                    "default_sponsor_username must not be empty when no default_sponsor_address is set"
                        .to_string(),
                ));
            }
            None => {}
        }
        if self.gas_limit == 0 {
            return Err(DinsyError::Config("gas_limit must be greater than 0".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn split_params(&self) -> SplitParams {
        SplitParams::new(
            self.exchange_rate.clone(),
            self.sponsor_share_pct.clone(),
            self.native_decimal_exponent,
        )
    }

    /// Policy for a sponsor equal to the treasury
    #[must_use]
    pub fn coincident_policy(&self) -> CoincidentPolicy {
        self.coincident_policy.unwrap_or_default()
    }

    /// Who receives the sponsor share when the payer names nobody
    #[must_use]
    pub fn default_sponsor(&self) -> DefaultSponsor<'_> {
        match &self.default_sponsor_address {
            Some(address) => DefaultSponsor::Address(address),
            None => DefaultSponsor::Username(&self.default_sponsor_username),
        }
    }
}

/// Chain ids are accepted in decimal or `0x` hex
fn parse_chain_id(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => u64::from_str_radix(hex_digits, 16).ok(),
        None => trimmed.parse().ok(),
    };
    parsed.ok_or_else(|| DinsyError::Config(format!("{}='{raw}': not a chain id", env_keys::CHAIN_ID)))
}
