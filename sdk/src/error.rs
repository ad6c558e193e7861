//! Error types for the DINSY SDK
//!
//! Every failure in the payment flow is reported as an explicit
//! [`DinsyError`] value. Nothing is retried automatically.
//!
//! # Error groups
//!
//! - **Input validation**: `UnknownLevel`, `NotAPlan`, `InvalidCustomAmount`,
//!   `InvalidExchangeRate`, `InvalidSharePct`, `InvalidAmount`
//! - **Pre-checks**: `WrongNetwork`, `SponsorNotFound`, `InsufficientFunds`,
//!   `NoAccounts`
//! - **Submission**: `TransferFailed` carries the [`TransferStage`] and, for a
//!   remainder-stage failure, the sponsor transaction that already went out
//!
//! # Example
//!
//! ```rust
//! use dinsy_sdk::error::{DinsyError, TransferStage};
//!
//! fn report(err: &DinsyError) -> String {
//!     match err {
//!         DinsyError::TransferFailed { stage: TransferStage::Remainder, sponsor_tx: Some(tx), .. } => {
//!             format!("sponsor share already sent in {tx}; remainder failed")
//!         }
//!         DinsyError::WrongNetwork { expected, .. } => {
//!             format!("switch your wallet to chain {expected}")
//!         }
//!         other => other.to_string(),
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for DINSY SDK operations
pub type Result<T> = std::result::Result<T, DinsyError>;

/// Which transfer a submission failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStage {
    /// Transfer #1, the sponsor's share
    Sponsor,
    /// Transfer #2, the remainder sent to the treasury
    Remainder,
    /// The single full-price transfer of a plan purchase
    Plan,
}

impl TransferStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sponsor => "sponsor",
            Self::Remainder => "remainder",
            Self::Plan => "plan",
        }
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types that can occur when using the DINSY SDK
#[derive(Error, Debug)]
pub enum DinsyError {
    /// The requested level is not in the tier catalogue
    #[error("Unknown level: {0}")]
    UnknownLevel(u32),

    /// The level has no fixed price and cannot be bought as a plan
    #[error("Level {0} is not a purchasable plan")]
    NotAPlan(u32),

    /// Level 0 was selected without a usable custom amount
    #[error("Invalid custom amount: {0}")]
    InvalidCustomAmount(String),

    /// Exchange rate must be strictly positive
    #[error("Invalid exchange rate: {0} (must be greater than 0)")]
    InvalidExchangeRate(String),

    /// Sponsor share must lie in [0, 1]
    #[error("Invalid sponsor share: {0} (must be between 0 and 1)")]
    InvalidSharePct(String),

    /// A decimal string could not be parsed
    #[error("Invalid decimal amount '{0}'")]
    InvalidAmount(String),

    /// Intermediate amount exceeded 256 bits
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    /// Wallet is connected to a different chain
    #[error("Wrong network: expected chain id {expected}, wallet is on {actual}. Switch networks in your wallet and retry.")]
    WrongNetwork { expected: u64, actual: u64 },

    /// A sponsor username was supplied but resolves to no wallet
    #[error("Sponsor not found: {0}")]
    SponsorNotFound(String),

    /// Balance does not cover amount plus gas
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    /// The wallet exposed no accounts
    #[error("Wallet returned no accounts. Connect and authorize an account first.")]
    NoAccounts,

    /// The signer rejected or failed a transfer
    #[error("Transfer failed at {stage} stage{}: {reason}", partial_note(.sponsor_tx))]
    TransferFailed {
        stage: TransferStage,
        sponsor_tx: Option<String>,
        reason: String,
    },

    /// JSON-RPC error object returned by the wallet endpoint
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error from serde JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL construction failure
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("DINSY SDK error: {0}")]
    Generic(String),
}

fn partial_note(sponsor_tx: &Option<String>) -> String {
    sponsor_tx
        .as_ref()
        .map(|tx| format!(" (sponsor transfer {tx} already submitted)"))
        .unwrap_or_default()
}

impl From<String> for DinsyError {
    fn from(msg: String) -> Self {
        Self::Generic(msg)
    }
}

impl From<&str> for DinsyError {
    fn from(msg: &str) -> Self {
        Self::Generic(msg.to_string())
    }
}

impl From<anyhow::Error> for DinsyError {
    fn from(error: anyhow::Error) -> Self {
        Self::Generic(error.to_string())
    }
}

impl DinsyError {
    /// Whether re-invoking with the same inputs could succeed without
    /// changing anything.
    ///
    /// Validation and transfer failures are never retryable here: a transfer
    /// retry would duplicate any transfer that already went out.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// The sponsor transaction id when the failure left a partial, non-reversible
    /// transfer behind
    #[must_use]
    pub fn partial_transfer(&self) -> Option<&str> {
        match self {
            Self::TransferFailed {
                stage: TransferStage::Remainder,
                sponsor_tx: Some(tx),
                ..
            } => Some(tx.as_str()),
            _ => None,
        }
    }
}
