//! End-to-end membership payment
//!
//! [`PaymentFlow`] runs one payment against explicit collaborators: a
//! [`WalletSigner`], a [`SponsorLookup`] and a [`PaymentConfig`]. Wallet
//! state is passed around as a [`WalletContext`] value obtained from
//! [`PaymentFlow::connect`].
//!
//! `pay` performs, in order: chain check, sponsor resolution, split,
//! funds check, transfer submission.

use crate::{
    amount::{serialize_native, NativeAmount},
    config::PaymentConfig,
    error::{DinsyError, Result},
    split::{calculate_split, SplitResult},
    sponsor::{resolve_sponsor_address, ResolvedSponsor, SponsorLookup},
    tiers::{TierCatalog, DEFAULT_TIERS},
    transfer::{TransferParties, TransferSubmitter},
    validation::validate_chain_id,
    wallet::WalletSigner,
};
use chrono::{DateTime, Utc};
use ruint::aliases::U256;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to do when the balance does not cover the payment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundsPolicy {
    /// Fail with `InsufficientFunds` before anything is sent
    #[default]
    Abort,
    /// Log the shortfall and submit anyway
    Proceed,
}

/// Balance compared with the worst-case cost of the planned transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FundsCheck {
    #[serde(serialize_with = "serialize_native")]
    pub required: NativeAmount,
    #[serde(serialize_with = "serialize_native")]
    pub available: NativeAmount,
    #[serde(serialize_with = "serialize_native")]
    pub shortfall: NativeAmount,
}

impl FundsCheck {
    #[must_use]
    pub fn new(required: NativeAmount, available: NativeAmount) -> Self {
        Self {
            required,
            available,
            shortfall: required.saturating_sub(available),
        }
    }

    #[must_use]
    pub fn is_sufficient(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Connected wallet account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletContext {
    pub address: String,
    pub chain_id: u64,
}

/// Ask `wallet` for its accounts and use the first non-empty one
///
/// # Errors
/// Returns `NoAccounts` if the wallet exposes none
pub async fn connect_wallet<W: WalletSigner>(wallet: &W) -> Result<WalletContext> {
    let accounts = wallet.request_accounts().await?;
    let address = accounts
        .into_iter()
        .map(|a| a.trim().to_string())
        .find(|a| !a.is_empty())
        .ok_or(DinsyError::NoAccounts)?;
    let chain_id = wallet.chain_id().await?;

    info!(
        service = "dinsy-sdk",
        component = "payment_flow",
        event = "wallet_connected",
        address = %address,
        chain_id = chain_id,
        "Wallet connected"
    );
    Ok(WalletContext { address, chain_id })
}

/// A membership purchase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentRequest {
    pub level: u32,
    /// Required for the custom level
    pub custom_amount_usd: Option<String>,
    /// Sponsor username; the configured default sponsor is used when absent
    pub sponsor: Option<String>,
}

impl PaymentRequest {
    #[must_use]
    pub const fn level(level: u32) -> Self {
        Self {
            level,
            custom_amount_usd: None,
            sponsor: None,
        }
    }

    #[must_use]
    pub fn custom_amount(mut self, amount_usd: &str) -> Self {
        self.custom_amount_usd = Some(amount_usd.to_string());
        self
    }

    #[must_use]
    pub fn sponsor(mut self, username: &str) -> Self {
        self.sponsor = Some(username.to_string());
        self
    }
}

/// Record of a submitted payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub level: u32,
    pub payer: String,
    pub sponsor: ResolvedSponsor,
    pub remainder_address: String,
    pub split: SplitResult,
    pub funds: FundsCheck,
    pub sponsor_tx: String,
    pub remainder_tx: Option<String>,
    #[serde(serialize_with = "serialize_native")]
    pub withheld_native: NativeAmount,
    pub submitted_at: DateTime<Utc>,
}

impl PaymentReceipt {
    #[must_use]
    pub fn transaction_ids(&self) -> Vec<&str> {
        std::iter::once(self.sponsor_tx.as_str())
            .chain(self.remainder_tx.as_deref())
            .collect()
    }
}

/// Payment orchestration over explicit collaborators
pub struct PaymentFlow<'a, W: WalletSigner, L: SponsorLookup> {
    wallet: &'a W,
    sponsors: &'a L,
    config: &'a PaymentConfig,
    tiers: &'a TierCatalog,
}

impl<'a, W: WalletSigner, L: SponsorLookup> PaymentFlow<'a, W, L> {
    pub fn new(wallet: &'a W, sponsors: &'a L, config: &'a PaymentConfig) -> Self {
        Self {
            wallet,
            sponsors,
            config,
            tiers: &DEFAULT_TIERS,
        }
    }

    #[must_use]
    pub const fn with_tiers(mut self, tiers: &'a TierCatalog) -> Self {
        self.tiers = tiers;
        self
    }

    fn submitter(&self) -> TransferSubmitter<'a, W> {
        TransferSubmitter::new(self.wallet)
            .gas_limit(self.config.gas_limit)
            .fee(self.config.fee)
            .coincident_policy(self.config.coincident_policy())
    }

    /// Ask the wallet for its accounts and use the first one
    ///
    /// # Errors
    /// Returns `NoAccounts` if the wallet exposes none
    pub async fn connect(&self) -> Result<WalletContext> {
        connect_wallet(self.wallet).await
    }

    /// Require the wallet to be on the configured chain right now
    ///
    /// # Errors
    /// Returns `WrongNetwork` on mismatch
    pub async fn verify_network(&self) -> Result<u64> {
        let actual = self.wallet.chain_id().await?;
        if let Err(e) = validate_chain_id(self.config.expected_chain_id, actual) {
            warn!(
                service = "dinsy-sdk",
                component = "payment_flow",
                event = "wrong_network",
                expected = self.config.expected_chain_id,
                actual = actual,
                "Wallet is on the wrong network"
            );
            return Err(e);
        }
        Ok(actual)
    }

    /// Split for a request without touching the wallet
    ///
    /// # Errors
    /// Returns the split calculator's validation errors
    pub fn quote(&self, request: &PaymentRequest) -> Result<SplitResult> {
        calculate_split(
            self.tiers,
            request.level,
            request.custom_amount_usd.as_deref(),
            &self.config.split_params(),
        )
    }

    /// Compare the payer's balance with the worst-case cost of the transfers
    /// `pay` would submit
    ///
    /// # Errors
    /// Returns an error if the balance query fails or the cost overflows
    pub async fn check_funds(
        &self,
        context: &WalletContext,
        split: &SplitResult,
        parties: &TransferParties,
    ) -> Result<FundsCheck> {
        let required = self
            .submitter()
            .plan(split, parties)
            .iter()
            .try_fold(U256::ZERO, |acc, request| {
                request.max_total_cost().and_then(|cost| acc.checked_add(cost))
            })
            .ok_or(DinsyError::AmountOverflow("required balance"))?;
        let available = self.wallet.balance(&context.address).await?;
        Ok(FundsCheck::new(required, available))
    }

    /// Run a full payment
    ///
    /// # Errors
    /// - `WrongNetwork` if the wallet is on another chain
    /// - `SponsorNotFound` if the named sponsor has no wallet
    /// - split validation errors
    /// - `InsufficientFunds` under [`FundsPolicy::Abort`]
    /// - `TransferFailed` from submission
    pub async fn pay(
        &self,
        context: &WalletContext,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt> {
        self.verify_network().await?;

        let sponsor = resolve_sponsor_address(
            self.sponsors,
            request.sponsor.as_deref(),
            self.config.default_sponsor(),
        )
        .await?;

        let split = self.quote(request)?;

        let parties = TransferParties {
            from: context.address.clone(),
            sponsor: sponsor.address.clone(),
            remainder: self.config.remainder_address.clone(),
        };

        let funds = self.check_funds(context, &split, &parties).await?;
        if !funds.is_sufficient() {
            warn!(
                service = "dinsy-sdk",
                component = "payment_flow",
                event = "funds_shortfall",
                required = %funds.required,
                available = %funds.available,
                shortfall = %funds.shortfall,
                policy = ?self.config.funds_policy,
                "Balance does not cover amount plus gas"
            );
            if self.config.funds_policy == FundsPolicy::Abort {
                return Err(DinsyError::InsufficientFunds {
                    required: funds.required.to_string(),
                    available: funds.available.to_string(),
                });
            }
        }

        let outcome = self.submitter().submit(&split, &parties).await?;

        info!(
            service = "dinsy-sdk",
            component = "payment_flow",
            event = "payment_submitted",
            level = request.level,
            payer = %context.address,
            sponsor = %sponsor.address,
            transfers = outcome.transaction_ids().len(),
            "Payment submitted"
        );

        Ok(PaymentReceipt {
            level: request.level,
            payer: context.address.clone(),
            sponsor,
            remainder_address: parties.remainder,
            split,
            funds,
            sponsor_tx: outcome.sponsor_tx,
            remainder_tx: outcome.remainder_tx,
            withheld_native: outcome.withheld_native,
            submitted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funds_check_shortfall() {
        let ok = FundsCheck::new(U256::from(10_u64), U256::from(15_u64));
        assert!(ok.is_sufficient());
        assert_eq!(ok.shortfall, U256::ZERO);

        let short = FundsCheck::new(U256::from(10_u64), U256::from(4_u64));
        assert!(!short.is_sufficient());
        assert_eq!(short.shortfall, U256::from(6_u64));
    }

    #[test]
    fn test_payment_request_builder() {
        let request = PaymentRequest::level(0).custom_amount("250").sponsor("alice");
        assert_eq!(request.level, 0);
        assert_eq!(request.custom_amount_usd.as_deref(), Some("250"));
        assert_eq!(request.sponsor.as_deref(), Some("alice"));
    }

    #[test]
    fn test_funds_policy_serde() {
        assert_eq!(serde_json::to_string(&FundsPolicy::Proceed).unwrap(), "\"proceed\"");
        assert_eq!(FundsPolicy::default(), FundsPolicy::Abort);
    }
}
