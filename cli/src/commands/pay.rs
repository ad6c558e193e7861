//! Pay command implementation
//!
//! Connects to the wallet, resolves the sponsor and submits the sponsor and
//! remainder transfers for the selected level.

use crate::config::DinsyCliConfig;
use crate::utils::formatting::{format_receipt_human, to_json};
use crate::utils::OutputFormat;
use anyhow::{anyhow, Result};
use clap::ValueEnum;
use dinsy_sdk::{
    CoincidentPolicy, DinsyError, FundsPolicy, PaymentConfig, PaymentFlow, PaymentRequest,
    SponsorLookup, WalletSigner,
};
use tracing::{info, warn};

/// What to send when the sponsor wallet is the treasury itself
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CoincidentMode {
    /// Send only the sponsor share and report the withheld remainder
    SponsorShareOnly,
    /// Send the whole amount in one transfer
    Combined,
}

impl From<CoincidentMode> for CoincidentPolicy {
    fn from(mode: CoincidentMode) -> Self {
        match mode {
            CoincidentMode::SponsorShareOnly => Self::SponsorShareOnly,
            CoincidentMode::Combined => Self::Combined,
        }
    }
}

/// Parameters for a payment
#[derive(Debug, Clone, Default)]
pub struct PayRequest<'a> {
    pub level: u32,
    pub custom_amount_usd: Option<&'a str>,
    pub sponsor: Option<&'a str>,
    pub coincident: Option<CoincidentMode>,
    /// Submit even when the balance looks insufficient
    pub force: bool,
}

fn describe_failure(err: &DinsyError) -> String {
    match err.partial_transfer() {
        Some(tx) => format!(
            "Payment incomplete: {err}. The sponsor transfer {tx} was already submitted and cannot be reversed; settle the remainder manually instead of repeating the payment."
        ),
        None => format!("Payment failed: {err}"),
    }
}

/// Execute the pay command
///
/// # Errors
/// Returns error if the wallet is unavailable or on the wrong network, the sponsor
/// is unknown, the balance is insufficient, or a transfer is rejected
pub async fn execute<W: WalletSigner, L: SponsorLookup>(
    wallet: &W,
    sponsors: &L,
    payment_config: &PaymentConfig,
    config: &DinsyCliConfig,
    request: &PayRequest<'_>,
    output_format: OutputFormat,
) -> Result<String> {
    info!("Starting payment for level {}", request.level);

    let mut payment_config = payment_config.clone();
    if let Some(mode) = request.coincident {
        payment_config.coincident_policy = Some(mode.into());
    }
    if request.force {
        payment_config.funds_policy = FundsPolicy::Proceed;
    }

    let flow = PaymentFlow::new(wallet, sponsors, &payment_config);

    let context = flow
        .connect()
        .await
        .map_err(|e| anyhow!("Failed to connect wallet: {e}"))?;
    info!("Using account {} on chain {}", context.address, context.chain_id);

    let mut payment = PaymentRequest::level(request.level);
    if let Some(amount) = request.custom_amount_usd {
        payment = payment.custom_amount(amount);
    }
    if let Some(sponsor) = request.sponsor {
        payment = payment.sponsor(sponsor);
    }

    let receipt = flow.pay(&context, &payment).await.map_err(|e| {
        if let Some(tx) = e.partial_transfer() {
            warn!("Remainder transfer failed after sponsor transfer {}", tx);
        }
        anyhow!(describe_failure(&e))
    })?;

    info!("Payment submitted: {:?}", receipt.transaction_ids());

    match output_format {
        OutputFormat::Human => format_receipt_human(&receipt, &payment_config, &config.native_symbol),
        OutputFormat::Json => to_json(&receipt),
    }
}
