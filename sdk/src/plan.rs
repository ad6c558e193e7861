//! Plan purchase
//!
//! A registered member upgrades by buying a plan: the full tier price goes to
//! the plan address in a single transfer, priced at the network's live gas
//! price. No sponsor share is taken.

use crate::{
    amount::{serialize_native, Decimal, NativeAmount},
    config::PaymentConfig,
    error::{DinsyError, Result, TransferStage},
    payment::{connect_wallet, FundsCheck, FundsPolicy, WalletContext},
    registry::WalletRegistration,
    split::SplitParams,
    tiers::{TierCatalog, DEFAULT_TIERS},
    validation::validate_chain_id,
    wallet::{FeeModel, TransferRequest, WalletSigner},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Label shown for members without a purchased plan
pub const FREE_PLAN_LABEL: &str = "Free";

/// Price of one plan in fiat and native units
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanQuote {
    pub level: u32,
    pub label: &'static str,
    pub price_fiat: Decimal,
    #[serde(serialize_with = "serialize_native")]
    pub price_native: NativeAmount,
}

/// Price a fixed-price tier as a plan
///
/// # Errors
/// - `UnknownLevel` if the catalogue has no such level
/// - `NotAPlan` for the custom level
/// - pricing parameter and conversion errors
pub fn quote_plan(tiers: &TierCatalog, level: u32, params: &SplitParams) -> Result<PlanQuote> {
    let tier = tiers.find(level).ok_or(DinsyError::UnknownLevel(level))?;
    if tier.is_custom() {
        return Err(DinsyError::NotAPlan(level));
    }
    params.validate()?;

    let price_native = tier
        .amount_usd
        .to_native_units(&params.exchange_rate, params.native_decimals)?;
    Ok(PlanQuote {
        level,
        label: tier.label,
        price_fiat: tier.amount_usd.clone(),
        price_native,
    })
}

/// Plan a member currently holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentPlan {
    /// `None` on the free plan
    pub level: Option<u32>,
    pub label: &'static str,
    pub price_usd: Decimal,
}

impl CurrentPlan {
    #[must_use]
    pub fn free() -> Self {
        Self {
            level: None,
            label: FREE_PLAN_LABEL,
            price_usd: Decimal::zero(),
        }
    }

    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.level.is_none()
    }
}

/// Map a wallet's registration to its plan.
///
/// Unregistered wallets, members without a level, level 0 and levels missing
/// from the catalogue all hold the free plan.
#[must_use]
pub fn current_plan(tiers: &TierCatalog, registration: &WalletRegistration) -> CurrentPlan {
    registration
        .user
        .as_ref()
        .and_then(|user| user.level)
        .and_then(|level| tiers.find(level))
        .filter(|tier| !tier.is_custom())
        .map_or_else(CurrentPlan::free, |tier| CurrentPlan {
            level: Some(tier.level),
            label: tier.label,
            price_usd: tier.amount_usd.clone(),
        })
}

/// Record of a submitted plan purchase
#[derive(Debug, Clone, Serialize)]
pub struct PlanReceipt {
    pub payer: String,
    pub destination: String,
    pub quote: PlanQuote,
    pub fee: FeeModel,
    pub funds: FundsCheck,
    pub tx: String,
    pub submitted_at: DateTime<Utc>,
}

/// Plan purchase over a wallet and the payment configuration
pub struct PlanPurchase<'a, W: WalletSigner> {
    wallet: &'a W,
    config: &'a PaymentConfig,
    tiers: &'a TierCatalog,
}

impl<'a, W: WalletSigner> PlanPurchase<'a, W> {
    pub fn new(wallet: &'a W, config: &'a PaymentConfig) -> Self {
        Self {
            wallet,
            config,
            tiers: &DEFAULT_TIERS,
        }
    }

    #[must_use]
    pub const fn with_tiers(mut self, tiers: &'a TierCatalog) -> Self {
        self.tiers = tiers;
        self
    }

    pub async fn connect(&self) -> Result<WalletContext> {
        connect_wallet(self.wallet).await
    }

    pub fn quote(&self, level: u32) -> Result<PlanQuote> {
        quote_plan(self.tiers, level, &self.config.split_params())
    }

    /// Legacy fee at the wallet's current gas price
    pub async fn live_fee(&self) -> Result<FeeModel> {
        Ok(FeeModel::live(self.wallet.gas_price().await?))
    }

    /// Buy the plan for `level`
    ///
    /// # Errors
    /// - `WrongNetwork` if the wallet is on another chain
    /// - `UnknownLevel` or `NotAPlan` for a level that cannot be bought
    /// - `InsufficientFunds` under [`FundsPolicy::Abort`]
    /// - `TransferFailed` at the plan stage if the wallet rejects the transfer
    pub async fn pay(&self, context: &WalletContext, level: u32) -> Result<PlanReceipt> {
        let actual = self.wallet.chain_id().await?;
        validate_chain_id(self.config.expected_chain_id, actual)?;

        let quote = self.quote(level)?;
        let fee = self.live_fee().await?;
        let request = TransferRequest::new(
            &context.address,
            &self.config.plan_address,
            quote.price_native,
            self.config.gas_limit,
            fee,
        );

        let required = request
            .max_total_cost()
            .ok_or(DinsyError::AmountOverflow("required balance"))?;
        let available = self.wallet.balance(&context.address).await?;
        let funds = FundsCheck::new(required, available);
        if !funds.is_sufficient() {
            warn!(
                service = "dinsy-sdk",
                component = "plan_purchase",
                event = "funds_shortfall",
                required = %funds.required,
                available = %funds.available,
                shortfall = %funds.shortfall,
                policy = ?self.config.funds_policy,
                "Balance does not cover plan price plus gas"
            );
            if self.config.funds_policy == FundsPolicy::Abort {
                return Err(DinsyError::InsufficientFunds {
                    required: funds.required.to_string(),
                    available: funds.available.to_string(),
                });
            }
        }

        let tx = self
            .wallet
            .send_transaction(&request)
            .await
            .map_err(|e| DinsyError::TransferFailed {
                stage: TransferStage::Plan,
                sponsor_tx: None,
                reason: e.to_string(),
            })?;

        info!(
            service = "dinsy-sdk",
            component = "plan_purchase",
            event = "plan_submitted",
            level = level,
            payer = %context.address,
            tx = %tx,
            gas_price = fee.per_gas(),
            "Plan purchase submitted"
        );

        Ok(PlanReceipt {
            payer: context.address.clone(),
            destination: request.to,
            quote,
            fee,
            funds,
            tx,
            submitted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegisteredUser;
    use ruint::aliases::U256;

    fn registration(level: Option<u32>) -> WalletRegistration {
        WalletRegistration {
            is_registered: true,
            user: Some(RegisteredUser {
                username: Some("ana".to_string()),
                level,
                ..RegisteredUser::default()
            }),
        }
    }

    #[test]
    fn test_quote_plan_prices_full_tier() {
        let params = PaymentConfig::default().split_params();
        let quote = quote_plan(&DEFAULT_TIERS, 1, &params).unwrap();
        assert_eq!(quote.label, "Basico");
        assert_eq!(quote.price_fiat.to_string(), "100");
        // 100 / 593 floored to 18 decimals
        assert_eq!(quote.price_native, U256::from(168_634_064_080_944_350_u64));
    }

    #[test]
    fn test_quote_plan_rejects_custom_and_unknown_levels() {
        let params = PaymentConfig::default().split_params();
        assert!(matches!(
            quote_plan(&DEFAULT_TIERS, 0, &params),
            Err(DinsyError::NotAPlan(0))
        ));
        assert!(matches!(
            quote_plan(&DEFAULT_TIERS, 9, &params),
            Err(DinsyError::UnknownLevel(9))
        ));
    }

    #[test]
    fn test_current_plan_from_level() {
        let plan = current_plan(&DEFAULT_TIERS, &registration(Some(3)));
        assert_eq!(plan.level, Some(3));
        assert_eq!(plan.label, "Corredor inmobiliario");
        assert_eq!(plan.price_usd.to_string(), "2000");
        assert!(!plan.is_free());
    }

    #[test]
    fn test_current_plan_falls_back_to_free() {
        for level in [None, Some(0), Some(42)] {
            let plan = current_plan(&DEFAULT_TIERS, &registration(level));
            assert!(plan.is_free(), "level {level:?}");
            assert_eq!(plan.label, FREE_PLAN_LABEL);
            assert!(plan.price_usd.is_zero());
        }

        let unregistered = WalletRegistration {
            is_registered: false,
            user: None,
        };
        assert_eq!(current_plan(&DEFAULT_TIERS, &unregistered), CurrentPlan::free());
    }

    #[test]
    fn test_current_plan_serializes() {
        let json = serde_json::to_value(CurrentPlan::free()).unwrap();
        assert_eq!(json["level"], serde_json::Value::Null);
        assert_eq!(json["label"], "Free");
        assert_eq!(json["price_usd"], "0");
    }
}
