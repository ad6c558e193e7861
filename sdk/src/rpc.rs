//! JSON-RPC wallet signer
//!
//! Talks to a wallet (or signing node) that exposes the standard Ethereum
//! JSON-RPC methods over HTTP. Accounts are unlocked and signed for by the
//! endpoint; the SDK only asks.

use crate::{
    amount::NativeAmount,
    error::{DinsyError, Result},
    wallet::{FeeModel, TransferRequest, WalletSigner},
};
use reqwest::Client;
use ruint::aliases::U256;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// JSON-RPC code for an unsupported method
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// Encode an integer as a minimal `0x`-prefixed hex quantity
#[must_use]
pub fn encode_quantity(value: U256) -> String {
    let bytes = value.to_be_bytes::<32>();
    let encoded = hex::encode(bytes);
    let digits = encoded.trim_start_matches('0');
    if digits.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{digits}")
    }
}

/// Parse a `0x`-prefixed hex quantity
///
/// # Errors
/// Returns `InvalidAmount` for missing prefix, empty body, non-hex digits or overflow
pub fn parse_quantity(quantity: &str) -> Result<U256> {
    let invalid = || DinsyError::InvalidAmount(quantity.to_string());
    let body = quantity
        .strip_prefix("0x")
        .or_else(|| quantity.strip_prefix("0X"))
        .filter(|b| !b.is_empty() && b.bytes().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(invalid)?;
    U256::from_str_radix(body, 16).map_err(|_| invalid())
}

fn parse_u64_quantity(quantity: &str) -> Result<u64> {
    u64::try_from(parse_quantity(quantity)?)
        .map_err(|_| DinsyError::InvalidAmount(quantity.to_string()))
}

/// Wallet reached over HTTP JSON-RPC
pub struct JsonRpcWallet {
    client: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    /// Create a wallet client for `endpoint` with a request timeout
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(Url::parse(endpoint)?, client))
    }

    #[must_use]
    pub const fn with_client(endpoint: Url, client: Client) -> Self {
        Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            service = "dinsy-sdk",
            component = "rpc",
            event = "rpc_request",
            method = %method,
            id = id,
            "Sending JSON-RPC request"
        );

        let response: RpcResponse = self
            .client
            .post(self.endpoint.clone())
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(DinsyError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = response
            .result
            .ok_or_else(|| DinsyError::Generic(format!("{method} returned no result")))?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Build the `eth_sendTransaction` parameter object
#[must_use]
pub fn transaction_object(request: &TransferRequest) -> Value {
    let mut tx = json!({
        "from": request.from,
        "to": request.to,
        "value": encode_quantity(request.amount_native),
        "gas": encode_quantity(U256::from(request.gas_limit)),
    });
    let (key, per_gas) = match request.fee {
        FeeModel::MaxFeePerGas(v) => ("maxFeePerGas", v),
        FeeModel::GasPrice(v) => ("gasPrice", v),
    };
    if let Some(obj) = tx.as_object_mut() {
        obj.insert(key.to_string(), Value::String(encode_quantity(U256::from(per_gas))));
    }
    tx
}

impl WalletSigner for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<String>> {
        match self.call("eth_requestAccounts", json!([])).await {
            Err(DinsyError::Rpc { code, .. }) if code == METHOD_NOT_FOUND => {
                self.call("eth_accounts", json!([])).await
            }
            other => other,
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        let raw: String = self.call("eth_chainId", json!([])).await?;
        parse_u64_quantity(&raw)
    }

    async fn gas_price(&self) -> Result<u64> {
        let raw: String = self.call("eth_gasPrice", json!([])).await?;
        parse_u64_quantity(&raw)
    }

    async fn balance(&self, address: &str) -> Result<NativeAmount> {
        let raw: String = self
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    async fn send_transaction(&self, request: &TransferRequest) -> Result<String> {
        let tx_hash: String = self
            .call("eth_sendTransaction", json!([transaction_object(request)]))
            .await?;
        info!(
            service = "dinsy-sdk",
            component = "rpc",
            event = "transaction_sent",
            to = %request.to,
            tx = %tx_hash,
            "Wallet accepted transaction"
        );
        Ok(tx_hash)
    }
}
