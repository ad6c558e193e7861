//! Output formatting utilities for the DINSY CLI

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use dinsy_sdk::{
    format_native, serialize_native_opt, CurrentPlan, NativeAmount, PaymentConfig,
    PaymentReceipt, PlanQuote, PlanReceipt, SplitResult, TierCatalog, WalletRegistration,
};
use serde::Serialize;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Parse output format from string
///
/// # Errors
/// Returns an error for anything other than `human` or `json`
pub fn parse_output_format(format_str: &str) -> Result<OutputFormat> {
    match format_str.trim().to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        _ => Err(anyhow!("Invalid output format: {format_str}")),
    }
}

/// Pretty JSON for any serializable value
///
/// # Errors
/// Returns an error if serialization fails
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| anyhow!("Failed to serialize output: {e}"))
}

fn native(amount: NativeAmount, decimals: u32, symbol: &str) -> String {
    format!("{} {symbol}", format_native(amount, decimals))
}

/// Tier row for display
#[derive(Debug, Serialize)]
pub struct TierInfo {
    pub level: u32,
    pub label: &'static str,
    pub amount_usd: String,
    /// Price in smallest native units at the configured rate; absent for the custom level
    #[serde(serialize_with = "serialize_native_opt")]
    pub price_native: Option<NativeAmount>,
}

/// Tier rows priced with the configured exchange rate
///
/// # Errors
/// Returns an error if a price cannot be converted
pub fn tier_infos(tiers: &TierCatalog, config: &PaymentConfig) -> Result<Vec<TierInfo>> {
    tiers
        .iter()
        .map(|tier| {
            let price_native = if tier.is_custom() {
                None
            } else {
                Some(
                    tier.amount_usd
                        .to_native_units(&config.exchange_rate, config.native_decimal_exponent)?,
                )
            };
            Ok(TierInfo {
                level: tier.level,
                label: tier.label,
                amount_usd: tier.amount_usd.to_string(),
                price_native,
            })
        })
        .collect::<dinsy_sdk::Result<Vec<_>>>()
        .map_err(|e| anyhow!("Failed to price tiers: {e}"))
}

/// Format the tier catalogue for human-readable output
///
/// # Errors
/// Returns an error if a price cannot be converted
pub fn format_tiers_human(
    tiers: &TierCatalog,
    config: &PaymentConfig,
    symbol: &str,
) -> Result<String> {
    let rows = tier_infos(tiers, config)?;
    let mut output = format!(
        "Membership tiers (1 {symbol} = {} USD)\n\n",
        config.exchange_rate
    );

    writeln!(
        &mut output,
        "{:<6} {:<28} {:>12} {:>26}",
        "Level", "Name", "Price (USD)", "Price"
    )?;
    output.push_str(&"-".repeat(75));
    output.push('\n');

    for row in &rows {
        let (amount, price) = match row.price_native {
            Some(price) => (
                row.amount_usd.as_str(),
                native(price, config.native_decimal_exponent, symbol),
            ),
            None => ("-", "custom amount".to_string()),
        };
        writeln!(
            &mut output,
            "{:<6} {:<28} {:>12} {:>26}",
            row.level, row.label, amount, price
        )?;
    }

    write!(&mut output, "\nTotal tiers: {}", rows.len())?;
    Ok(output)
}

/// Format a split quote for human-readable output
///
/// # Errors
/// Returns an error only if writing to the buffer fails
pub fn format_split_human(split: &SplitResult, config: &PaymentConfig, symbol: &str) -> Result<String> {
    let decimals = config.native_decimal_exponent;
    let mut output = String::new();
    writeln!(&mut output, "Payment split")?;
    writeln!(
        &mut output,
        "  Rate:            1 {symbol} = {} USD, sponsor share {}",
        config.exchange_rate, config.sponsor_share_pct
    )?;
    writeln!(
        &mut output,
        "  Total:           {} USD = {}",
        split.total_fiat,
        native(split.total_native, decimals, symbol)
    )?;
    writeln!(
        &mut output,
        "  Sponsor share:   {} USD = {}",
        split.sponsor_fiat,
        native(split.sponsor_native, decimals, symbol)
    )?;
    write!(
        &mut output,
        "  Remainder:       {} USD = {}",
        split.remainder_fiat,
        native(split.remainder_native, decimals, symbol)
    )?;
    Ok(output)
}

/// Format a payment receipt for human-readable output
///
/// # Errors
/// Returns an error only if writing to the buffer fails
pub fn format_receipt_human(
    receipt: &PaymentReceipt,
    config: &PaymentConfig,
    symbol: &str,
) -> Result<String> {
    let decimals = config.native_decimal_exponent;
    let mut output = format!("Payment submitted for level {}\n\n", receipt.level);
    output.push_str(&format_split_human(&receipt.split, config, symbol)?);
    output.push_str("\n\n");

    writeln!(&mut output, "  Payer:           {}", receipt.payer)?;
    match &receipt.sponsor.username {
        Some(username) => writeln!(
            &mut output,
            "  Sponsor:         {username} ({})",
            receipt.sponsor.address
        )?,
        None => writeln!(
            &mut output,
            "  Sponsor:         default ({})",
            receipt.sponsor.address
        )?,
    }
    writeln!(&mut output, "  Treasury:        {}", receipt.remainder_address)?;
    writeln!(&mut output, "  Sponsor tx:      {}", receipt.sponsor_tx)?;
    match &receipt.remainder_tx {
        Some(tx) => writeln!(&mut output, "  Remainder tx:    {tx}")?,
        None => writeln!(&mut output, "  Remainder tx:    none (single transfer)")?,
    }
    if !receipt.withheld_native.is_zero() {
        writeln!(
            &mut output,
            "  WARNING: sponsor and treasury coincide; {} was not sent",
            native(receipt.withheld_native, decimals, symbol)
        )?;
    }
    if !receipt.funds.is_sufficient() {
        writeln!(
            &mut output,
            "  WARNING: balance was short by {} at submission",
            native(receipt.funds.shortfall, decimals, symbol)
        )?;
    }
    write!(
        &mut output,
        "  Submitted at:    {}",
        receipt.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    Ok(output)
}

/// Format a plan price for human-readable output
///
/// # Errors
/// Returns an error only if writing to the buffer fails
pub fn format_plan_quote_human(quote: &PlanQuote, config: &PaymentConfig, symbol: &str) -> Result<String> {
    let mut output = String::new();
    writeln!(&mut output, "Plan {} ({})", quote.level, quote.label)?;
    write!(
        &mut output,
        "  Price:           {} USD = {}",
        quote.price_fiat,
        native(quote.price_native, config.native_decimal_exponent, symbol)
    )?;
    Ok(output)
}

/// Format a plan purchase receipt for human-readable output
///
/// # Errors
/// Returns an error only if writing to the buffer fails
pub fn format_plan_receipt_human(
    receipt: &PlanReceipt,
    config: &PaymentConfig,
    symbol: &str,
) -> Result<String> {
    let decimals = config.native_decimal_exponent;
    let mut output = String::from("Plan purchase submitted

");
    output.push_str(&format_plan_quote_human(&receipt.quote, config, symbol)?);
    output.push('\n');

    writeln!(&mut output, "  Payer:           {}", receipt.payer)?;
    writeln!(&mut output, "  Destination:     {}", receipt.destination)?;
    writeln!(&mut output, "  Gas price:       {} per gas", receipt.fee.per_gas())?;
    writeln!(&mut output, "  Transaction:     {}", receipt.tx)?;
    if !receipt.funds.is_sufficient() {
        writeln!(
            &mut output,
            "  WARNING: balance was short by {} at submission",
            native(receipt.funds.shortfall, decimals, symbol)
        )?;
    }
    write!(
        &mut output,
        "  Submitted at:    {}",
        receipt.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    Ok(output)
}

/// Format a member's current plan for human-readable output
#[must_use]
pub fn format_current_plan_human(wallet: &str, plan: &CurrentPlan) -> String {
    match plan.level {
        Some(level) => format!(
            "Current plan for {wallet}: {} (level {level}, {} USD)",
            plan.label, plan.price_usd
        ),
        None => format!(
            "Current plan for {wallet}: {} (no plan purchased)",
            plan.label
        ),
    }
}

/// Format a wallet login check for human-readable output
///
/// # Errors
/// Returns an error only if writing to the buffer fails
pub fn format_wallet_registration_human(wallet: &str, registration: &WalletRegistration) -> Result<String> {
    if !registration.is_registered {
        return Ok(format!("Wallet {wallet} is not registered"));
    }

    let mut output = format!("Wallet {wallet} is registered\n");
    if let Some(user) = &registration.user {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        writeln!(&mut output, "  Username:        {}", field(&user.username))?;
        writeln!(
            &mut output,
            "  Name:            {} {}",
            field(&user.first_name),
            field(&user.last_name)
        )?;
        writeln!(&mut output, "  Sponsor:         {}", field(&user.sponsor))?;
        writeln!(
            &mut output,
            "  Level:           {}",
            user.level.map_or_else(|| "-".to_string(), |l| l.to_string())
        )?;
        write!(&mut output, "  Referral link:   {}", field(&user.ref_link))?;
    }
    Ok(output.trim_end().to_string())
}
