//! Sequential sponsor/remainder transfer submission
//!
//! Transfer #1 pays the sponsor share. Only after the wallet acknowledges it
//! is transfer #2 (the remainder, to the treasury) built and submitted. When
//! the sponsor and treasury addresses coincide a single transfer is sent,
//! shaped by [`CoincidentPolicy`].
//!
//! Nothing here retries or rolls back. A failure of transfer #2 is reported
//! together with the id of transfer #1, which has already left the wallet.

use crate::{
    amount::{serialize_native, NativeAmount},
    error::{DinsyError, Result, TransferStage},
    split::SplitResult,
    validation::addresses_match,
    wallet::{FeeModel, TransferRequest, WalletSigner, DEFAULT_GAS_LIMIT},
};
use ruint::aliases::U256;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// What to send when the sponsor and remainder destinations are the same account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoincidentPolicy {
    /// Send only the sponsor share; the remainder is withheld and reported
    #[default]
    SponsorShareOnly,
    /// Send the whole total in the single transfer
    Combined,
}

/// Accounts involved in one payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParties {
    /// Connected wallet account paying for the membership
    pub from: String,
    /// Sponsor destination
    pub sponsor: String,
    /// Treasury destination for the remainder
    pub remainder: String,
}

impl TransferParties {
    #[must_use]
    pub fn coincide(&self) -> bool {
        addresses_match(&self.sponsor, &self.remainder)
    }
}

/// Aggregate result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub sponsor_tx: String,
    pub remainder_tx: Option<String>,
    /// Remainder that was not sent because the destinations coincided
    #[serde(serialize_with = "serialize_native")]
    pub withheld_native: NativeAmount,
}

impl TransferOutcome {
    /// Transaction ids in submission order
    #[must_use]
    pub fn transaction_ids(&self) -> Vec<&str> {
        std::iter::once(self.sponsor_tx.as_str())
            .chain(self.remainder_tx.as_deref())
            .collect()
    }
}

/// Submits the sponsor and remainder transfers through a wallet
pub struct TransferSubmitter<'w, W: WalletSigner> {
    wallet: &'w W,
    gas_limit: u64,
    fee: FeeModel,
    coincident_policy: CoincidentPolicy,
}

impl<'w, W: WalletSigner> TransferSubmitter<'w, W> {
    pub fn new(wallet: &'w W) -> Self {
        Self {
            wallet,
            gas_limit: DEFAULT_GAS_LIMIT,
            fee: FeeModel::default(),
            coincident_policy: CoincidentPolicy::default(),
        }
    }

    #[must_use]
    pub const fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    #[must_use]
    pub const fn fee(mut self, fee: FeeModel) -> Self {
        self.fee = fee;
        self
    }

    #[must_use]
    pub const fn coincident_policy(mut self, policy: CoincidentPolicy) -> Self {
        self.coincident_policy = policy;
        self
    }

    fn request(&self, from: &str, to: &str, amount: NativeAmount) -> TransferRequest {
        TransferRequest::new(from, to, amount, self.gas_limit, self.fee)
    }

    fn sponsor_amount(&self, split: &SplitResult, parties: &TransferParties) -> NativeAmount {
        if parties.coincide() && self.coincident_policy == CoincidentPolicy::Combined {
            split.total_native
        } else {
            split.sponsor_native
        }
    }

    /// The transfers `submit` would send, in order, without sending anything
    #[must_use]
    pub fn plan(&self, split: &SplitResult, parties: &TransferParties) -> Vec<TransferRequest> {
        let mut requests = vec![self.request(
            &parties.from,
            &parties.sponsor,
            self.sponsor_amount(split, parties),
        )];
        if !parties.coincide() {
            requests.push(self.request(&parties.from, &parties.remainder, split.remainder_native));
        }
        requests
    }

    /// Submit the transfers sequentially
    ///
    /// # Errors
    /// - `TransferFailed { stage: Sponsor }` if transfer #1 is rejected; nothing was sent
    /// - `TransferFailed { stage: Remainder, sponsor_tx: Some(..) }` if transfer #2 is
    ///   rejected after transfer #1 went out
    pub async fn submit(
        &self,
        split: &SplitResult,
        parties: &TransferParties,
    ) -> Result<TransferOutcome> {
        let sponsor_request = self.request(
            &parties.from,
            &parties.sponsor,
            self.sponsor_amount(split, parties),
        );

        let sponsor_tx = self
            .wallet
            .send_transaction(&sponsor_request)
            .await
            .map_err(|e| {
                error!(
                    service = "dinsy-sdk",
                    component = "transfer_submitter",
                    event = "transfer_failed",
                    stage = %TransferStage::Sponsor,
                    to = %sponsor_request.to,
                    error = %e,
                    "Sponsor transfer was not submitted"
                );
                DinsyError::TransferFailed {
                    stage: TransferStage::Sponsor,
                    sponsor_tx: None,
                    reason: e.to_string(),
                }
            })?;

        info!(
            service = "dinsy-sdk",
            component = "transfer_submitter",
            event = "transfer_submitted",
            stage = %TransferStage::Sponsor,
            to = %sponsor_request.to,
            amount_native = %sponsor_request.amount_native,
            tx = %sponsor_tx,
            "Sponsor transfer submitted"
        );

        if parties.coincide() {
            let withheld_native = match self.coincident_policy {
                CoincidentPolicy::SponsorShareOnly => split.remainder_native,
                CoincidentPolicy::Combined => U256::ZERO,
            };
            if !withheld_native.is_zero() {
                warn!(
                    service = "dinsy-sdk",
                    component = "transfer_submitter",
                    event = "remainder_withheld",
                    address = %parties.sponsor,
                    withheld_native = %withheld_native,
                    "Sponsor and remainder addresses coincide; remainder was not sent"
                );
            }
            return Ok(TransferOutcome {
                sponsor_tx,
                remainder_tx: None,
                withheld_native,
            });
        }

        let remainder_request =
            self.request(&parties.from, &parties.remainder, split.remainder_native);

        let remainder_tx = match self.wallet.send_transaction(&remainder_request).await {
            Ok(tx) => tx,
            Err(e) => {
                error!(
                    service = "dinsy-sdk",
                    component = "transfer_submitter",
                    event = "transfer_failed",
                    stage = %TransferStage::Remainder,
                    to = %remainder_request.to,
                    sponsor_tx = %sponsor_tx,
                    error = %e,
                    "Remainder transfer failed after sponsor transfer was submitted"
                );
                return Err(DinsyError::TransferFailed {
                    stage: TransferStage::Remainder,
                    sponsor_tx: Some(sponsor_tx),
                    reason: e.to_string(),
                });
            }
        };

        info!(
            service = "dinsy-sdk",
            component = "transfer_submitter",
            event = "transfer_submitted",
            stage = %TransferStage::Remainder,
            to = %remainder_request.to,
            amount_native = %remainder_request.amount_native,
            tx = %remainder_tx,
            "Remainder transfer submitted"
        );

        Ok(TransferOutcome {
            sponsor_tx,
            remainder_tx: Some(remainder_tx),
            withheld_native: U256::ZERO,
        })
    }
}
