//! Wallet signer boundary
//!
//! The SDK never holds keys. Every transfer goes through a [`WalletSigner`],
//! an external wallet that owns the connected accounts and decides whether to
//! sign and submit. [`crate::rpc::JsonRpcWallet`] is the bundled implementation;
//! tests use in-process mocks.

use crate::{
    amount::{serialize_native, NativeAmount},
    error::Result,
};
use ruint::aliases::U256;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Default gas limit for a plain value transfer
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

/// Default fee cap per gas unit: 30 gwei
pub const DEFAULT_MAX_FEE_PER_GAS: u64 = 30_000_000_000;

/// Fee pricing attached to each transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeModel {
    /// Dynamic-fee transfer capped at this many smallest units per gas
    MaxFeePerGas(u64),
    /// Legacy fixed gas price in smallest units per gas
    GasPrice(u64),
}

impl FeeModel {
    /// Legacy pricing at the network's current gas price
    #[must_use]
    pub const fn live(gas_price: u64) -> Self {
        Self::GasPrice(gas_price)
    }

    /// Per-gas price used for worst-case cost estimates
    #[must_use]
    pub const fn per_gas(self) -> u64 {
        match self {
            Self::MaxFeePerGas(v) | Self::GasPrice(v) => v,
        }
    }
}

impl Default for FeeModel {
    fn default() -> Self {
        Self::MaxFeePerGas(DEFAULT_MAX_FEE_PER_GAS)
    }
}

/// One outbound value transfer, built immediately before submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    #[serde(serialize_with = "serialize_native")]
    pub amount_native: NativeAmount,
    pub gas_limit: u64,
    pub fee: FeeModel,
}

impl TransferRequest {
    #[must_use]
    pub fn new(from: &str, to: &str, amount_native: NativeAmount, gas_limit: u64, fee: FeeModel) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            amount_native,
            gas_limit,
            fee,
        }
    }

    /// Worst-case gas cost: `gas_limit * per_gas`
    #[must_use]
    pub fn max_gas_cost(&self) -> Option<NativeAmount> {
        U256::from(self.gas_limit).checked_mul(U256::from(self.fee.per_gas()))
    }

    /// Value plus worst-case gas
    #[must_use]
    pub fn max_total_cost(&self) -> Option<NativeAmount> {
        self.max_gas_cost()?.checked_add(self.amount_native)
    }
}

/// External wallet able to expose accounts and submit transfers
///
/// `send_transaction` resolves once the wallet has submitted (or rejected) the
/// transfer; it does not wait for on-chain confirmation.
pub trait WalletSigner: Send + Sync {
    /// Ask the wallet for its authorized accounts
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Chain the wallet is currently connected to
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Current network gas price in smallest units per gas
    fn gas_price(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Latest balance of `address` in smallest units
    fn balance(&self, address: &str) -> impl Future<Output = Result<NativeAmount>> + Send;

    /// Submit a transfer and return its transaction identifier
    fn send_transaction(
        &self,
        request: &TransferRequest,
    ) -> impl Future<Output = Result<String>> + Send;
}
