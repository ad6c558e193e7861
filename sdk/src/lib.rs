//! DINSY SDK - Rust SDK for DINSY membership payments
//!
//! This crate computes membership prices and sponsor commissions and submits
//! the resulting value transfers through an external wallet. It includes
//! utilities for:
//!
//! - Resolving tier prices and splitting them between sponsor and treasury
//!   with exact decimal arithmetic
//! - Converting fiat totals into the chain's smallest native unit
//! - Submitting the sponsor and remainder transfers in order through a
//!   [`WalletSigner`]
//! - Buying a plan with a single full-price transfer at the live gas price
//! - Talking to the membership backend (sponsor wallets, referral links,
//!   registration)
//!
//! # Example Usage
//!
//! ```
//! use dinsy_sdk::{calculate_split, PaymentConfig, DEFAULT_TIERS};
//!
//! # fn main() -> dinsy_sdk::Result<()> {
//! let config = PaymentConfig::default();
//! let split = calculate_split(&DEFAULT_TIERS, 1, None, &config.split_params())?;
//!
//! assert_eq!(split.total_fiat.to_string(), "100");
//! assert_eq!(split.sponsor_fiat.to_string(), "9");
//! assert_eq!(split.remainder_fiat.to_string(), "91");
//! assert_eq!(split.sponsor_native.to_string(), "15177065767284991");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod amount;
pub mod config;
pub mod error;
pub mod payment;
pub mod plan;
pub mod registry;
pub mod rpc;
pub mod split;
pub mod sponsor;
pub mod tiers;
pub mod transfer;
pub mod validation;
pub mod wallet;

// Re-export commonly used items
pub use amount::{format_native, serialize_native, serialize_native_opt, Decimal, NativeAmount};
pub use config::PaymentConfig;
pub use error::{DinsyError, Result, TransferStage};
pub use payment::{
    connect_wallet, FundsCheck, FundsPolicy, PaymentFlow, PaymentReceipt, PaymentRequest,
    WalletContext,
};
pub use plan::{
    current_plan, quote_plan, CurrentPlan, PlanPurchase, PlanQuote, PlanReceipt, FREE_PLAN_LABEL,
};
pub use registry::{
    generate_referral_link, Registration, RegistrationReceipt, RegistryClient, WalletRegistration,
};
pub use rpc::JsonRpcWallet;
pub use split::{calculate_split, split_amount, SplitParams, SplitResult};
pub use sponsor::{
    resolve_sponsor_address, DefaultSponsor, ResolvedSponsor, SponsorDirectory, SponsorLookup,
};
pub use tiers::{Tier, TierCatalog, CUSTOM_LEVEL, DEFAULT_TIERS};
pub use transfer::{CoincidentPolicy, TransferOutcome, TransferParties, TransferSubmitter};
pub use validation::{addresses_match, is_valid_wallet_address, normalize_address};
pub use wallet::{FeeModel, TransferRequest, WalletSigner};

// Re-export commonly used external types
pub use ruint::aliases::U256;
pub use url::Url;
