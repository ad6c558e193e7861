//! Integration tests for the DINSY payment flow
//!
//! Runs complete payments against an in-process wallet that records every
//! transfer it is asked to submit, covering:
//! - Sponsor-then-remainder ordering and amounts
//! - Coincident sponsor/treasury destinations
//! - Rejection of the second transfer after the first went out
//! - Network, sponsor and balance pre-checks
//! - Single-transfer plan purchases at the live gas price

use dinsy_sdk::{
    CoincidentPolicy, DinsyError, FeeModel, FundsPolicy, NativeAmount, PaymentConfig,
    PaymentFlow, PaymentRequest, PlanPurchase, SponsorDirectory, TransferRequest, TransferStage,
    WalletContext, WalletSigner, U256,
};
use std::sync::Mutex;

const PAYER: &str = "0x1111111111111111111111111111111111111111";
const ALICE: &str = "0x2222222222222222222222222222222222222222";
const TREASURY: &str = "0xAFa5f9670b6809F7A200DBB4A3E8bfD056c855E8";
const MASTER: &str = "0x4444444444444444444444444444444444444444";

/// Wallet double: fixed chain and balance, optional rejection of the n-th send
struct MockWallet {
    accounts: Vec<String>,
    chain_id: u64,
    balance: NativeAmount,
    gas_price: u64,
    reject_send: Option<usize>,
    sent: Mutex<Vec<TransferRequest>>,
}

impl MockWallet {
    fn new() -> Self {
        Self {
            accounts: vec![PAYER.to_string()],
            chain_id: 56,
            // 10 whole native units
            balance: U256::from(10_000_000_000_000_000_000_u128),
            gas_price: 3_000_000_000,
            reject_send: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    fn with_balance(mut self, balance: NativeAmount) -> Self {
        self.balance = balance;
        self
    }

    fn rejecting_send(mut self, index: usize) -> Self {
        self.reject_send = Some(index);
        self
    }

    fn without_accounts(mut self) -> Self {
        self.accounts.clear();
        self
    }

    fn sent(&self) -> Vec<TransferRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl WalletSigner for MockWallet {
    async fn request_accounts(&self) -> dinsy_sdk::Result<Vec<String>> {
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> dinsy_sdk::Result<u64> {
        Ok(self.chain_id)
    }

    async fn gas_price(&self) -> dinsy_sdk::Result<u64> {
        Ok(self.gas_price)
    }

    async fn balance(&self, _address: &str) -> dinsy_sdk::Result<NativeAmount> {
        Ok(self.balance)
    }

    async fn send_transaction(&self, request: &TransferRequest) -> dinsy_sdk::Result<String> {
        let mut sent = self.sent.lock().unwrap();
        if self.reject_send == Some(sent.len()) {
            return Err(DinsyError::Rpc {
                code: 4001,
                message: "User denied transaction signature".to_string(),
            });
        }
        sent.push(request.clone());
        Ok(format!("0x{:064x}", sent.len()))
    }
}

fn sponsors() -> SponsorDirectory {
    SponsorDirectory::new()
        .with_sponsor("alice", ALICE)
        .with_sponsor("treasury", &TREASURY.to_lowercase())
        .with_sponsor("Master", MASTER)
}

fn tx_id(n: usize) -> String {
    format!("0x{n:064x}")
}

#[tokio::test]
async fn test_level_one_payment_with_sponsor() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);

    let context = flow.connect().await.unwrap();
    assert_eq!(context.address, PAYER);
    assert_eq!(context.chain_id, 56);

    let receipt = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("alice"))
        .await
        .unwrap();

    assert_eq!(receipt.transaction_ids(), vec![tx_id(1), tx_id(2)]);
    assert_eq!(receipt.sponsor.username.as_deref(), Some("alice"));
    assert_eq!(receipt.withheld_native, U256::ZERO);
    assert!(receipt.funds.is_sufficient());

    let sent = wallet.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, ALICE);
    assert_eq!(sent[0].amount_native, U256::from(15_177_065_767_284_991_u128));
    assert_eq!(sent[1].to, TREASURY);
    assert_eq!(sent[1].amount_native, U256::from(153_456_998_313_659_359_u128));
    assert_eq!(
        sent[0].amount_native.checked_add(sent[1].amount_native),
        Some(receipt.split.total_native)
    );
}

#[tokio::test]
async fn test_sponsor_equal_to_treasury_sends_once() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let receipt = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("treasury"))
        .await
        .unwrap();

    assert_eq!(receipt.transaction_ids(), vec![tx_id(1)]);
    assert_eq!(receipt.remainder_tx, None);
    assert_eq!(receipt.withheld_native, receipt.split.remainder_native);
    assert_eq!(wallet.sent().len(), 1);
}

#[tokio::test]
async fn test_combined_policy_sends_total_in_one_transfer() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig {
        coincident_policy: Some(CoincidentPolicy::Combined),
        ..PaymentConfig::default()
    };
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let receipt = flow
        .pay(&context, &PaymentRequest::level(2).sponsor("treasury"))
        .await
        .unwrap();

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].amount_native, receipt.split.total_native);
    assert_eq!(receipt.withheld_native, U256::ZERO);
}

#[tokio::test]
async fn test_rejected_remainder_reports_sponsor_transaction() {
    let wallet = MockWallet::new().rejecting_send(1);
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let err = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("alice"))
        .await
        .unwrap_err();

    match &err {
        DinsyError::TransferFailed {
            stage,
            sponsor_tx,
            reason,
        } => {
            assert_eq!(*stage, TransferStage::Remainder);
            assert_eq!(sponsor_tx.as_deref(), Some(tx_id(1).as_str()));
            assert!(reason.contains("User denied"));
        }
        other => panic!("expected TransferFailed, got {other:?}"),
    }
    assert_eq!(wallet.sent().len(), 1);
}

#[tokio::test]
async fn test_rejected_sponsor_transfer_sends_nothing() {
    let wallet = MockWallet::new().rejecting_send(0);
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let err = flow
        .pay(&context, &PaymentRequest::level(3).sponsor("alice"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DinsyError::TransferFailed {
            stage: TransferStage::Sponsor,
            sponsor_tx: None,
            ..
        }
    ));
    assert!(err.partial_transfer().is_none());
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_wrong_network_stops_before_any_transfer() {
    let wallet = MockWallet::new().on_chain(1);
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let err = flow
        .pay(&context, &PaymentRequest::level(1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DinsyError::WrongNetwork {
            expected: 56,
            actual: 1
        }
    ));
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_sponsor_is_rejected() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let err = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("mallory"))
        .await
        .unwrap_err();

    assert!(matches!(err, DinsyError::SponsorNotFound(ref u) if u == "mallory"));
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_no_sponsor_pays_default_sponsor_address() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig {
        default_sponsor_address: Some(ALICE.to_string()),
        ..PaymentConfig::default()
    };
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let receipt = flow.pay(&context, &PaymentRequest::level(1)).await.unwrap();

    assert_eq!(receipt.sponsor.username, None);
    assert_eq!(receipt.sponsor.address, ALICE);
    assert_eq!(wallet.sent()[0].to, ALICE);
}

#[tokio::test]
async fn test_default_config_without_sponsor_pays_master_and_treasury() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let receipt = flow.pay(&context, &PaymentRequest::level(1)).await.unwrap();

    assert_eq!(receipt.sponsor.username.as_deref(), Some("Master"));
    assert_eq!(receipt.sponsor.address, MASTER);
    assert_eq!(receipt.withheld_native, U256::ZERO);

    let sent = wallet.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, MASTER);
    assert_eq!(sent[1].to, TREASURY);
    assert_eq!(
        sent[0].amount_native.checked_add(sent[1].amount_native),
        Some(receipt.split.total_native)
    );
}

#[tokio::test]
async fn test_default_config_without_master_sends_nothing() {
    let wallet = MockWallet::new();
    let directory = SponsorDirectory::new();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let err = flow
        .pay(&context, &PaymentRequest::level(1))
        .await
        .unwrap_err();

    assert!(matches!(err, DinsyError::SponsorNotFound(ref u) if u == "Master"));
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_insufficient_funds_aborts_by_default() {
    let wallet = MockWallet::new().with_balance(U256::from(1_000_u64));
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let err = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, DinsyError::InsufficientFunds { ref available, .. } if available == "1000"));
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_insufficient_funds_proceeds_when_configured() {
    let wallet = MockWallet::new().with_balance(U256::ZERO);
    let directory = sponsors();
    let config = PaymentConfig {
        funds_policy: FundsPolicy::Proceed,
        ..PaymentConfig::default()
    };
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let receipt = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("alice"))
        .await
        .unwrap();

    assert!(!receipt.funds.is_sufficient());
    assert_eq!(receipt.funds.shortfall, receipt.funds.required);
    assert_eq!(wallet.sent().len(), 2);
}

#[tokio::test]
async fn test_funds_requirement_counts_gas_per_transfer() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let receipt = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("alice"))
        .await
        .unwrap();

    // two transfers at 21_000 gas * 30 gwei each
    let gas = U256::from(1_260_000_000_000_000_u64);
    assert_eq!(
        receipt.split.total_native.checked_add(gas),
        Some(receipt.funds.required)
    );
}

#[tokio::test]
async fn test_custom_level_and_invalid_inputs() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);

    let split = flow
        .quote(&PaymentRequest::level(0).custom_amount("250.50"))
        .unwrap();
    assert_eq!(split.total_fiat.to_string(), "250.5");
    assert_eq!(split.sponsor_fiat.to_string(), "22.545");

    assert!(matches!(
        flow.quote(&PaymentRequest::level(0).custom_amount("0")),
        Err(DinsyError::InvalidCustomAmount(_))
    ));
    assert!(matches!(
        flow.quote(&PaymentRequest::level(42)),
        Err(DinsyError::UnknownLevel(42))
    ));
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_connect_without_accounts() {
    let wallet = MockWallet::new().without_accounts();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);

    assert!(matches!(flow.connect().await, Err(DinsyError::NoAccounts)));
}

#[tokio::test]
async fn test_receipt_serializes_for_output() {
    let wallet = MockWallet::new();
    let directory = sponsors();
    let config = PaymentConfig::default();
    let flow = PaymentFlow::new(&wallet, &directory, &config);
    let context = flow.connect().await.unwrap();

    let receipt = flow
        .pay(&context, &PaymentRequest::level(1).sponsor("alice"))
        .await
        .unwrap();
    let json = serde_json::to_value(&receipt).unwrap();

    assert_eq!(json["level"], 1);
    assert_eq!(json["split"]["remainder_native"], "153456998313659359");
    assert_eq!(json["sponsor"]["username"], "alice");
    assert_eq!(json["withheld_native"], "0");
    assert!(json["submitted_at"].is_string());
}

#[tokio::test]
async fn test_plan_purchase_sends_full_price_once() {
    let wallet = MockWallet::new();
    let config = PaymentConfig::default();
    let purchase = PlanPurchase::new(&wallet, &config);
    let context = purchase.connect().await.unwrap();
    assert_eq!(context.address, PAYER);

    let receipt = purchase.pay(&context, 2).await.unwrap();

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, config.plan_address);
    assert_eq!(sent[0].to, "0xB54aD663bBcbcB0bFadc7f0cB6Df3E44caa25E0c");
    // 500 / 593 floored to 18 decimals
    assert_eq!(
        sent[0].amount_native,
        U256::from(843_170_320_404_721_753_u64)
    );
    assert_eq!(sent[0].fee, FeeModel::GasPrice(3_000_000_000));
    assert_eq!(sent[0].gas_limit, 21_000);

    assert_eq!(receipt.tx, tx_id(1));
    assert_eq!(receipt.quote.label, "Junior");
    // price plus 21000 gas at 3 gwei
    assert_eq!(
        receipt.funds.required,
        U256::from(843_233_320_404_721_753_u64)
    );
}

#[tokio::test]
async fn test_plan_purchase_checks_network_first() {
    let wallet = MockWallet::new().on_chain(1);
    let config = PaymentConfig::default();
    let purchase = PlanPurchase::new(&wallet, &config);
    let context = WalletContext {
        address: PAYER.to_string(),
        chain_id: 1,
    };

    let err = purchase.pay(&context, 1).await.unwrap_err();
    assert!(matches!(err, DinsyError::WrongNetwork { expected: 56, actual: 1 }));
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_plan_purchase_shortfall_needs_force() {
    let wallet = MockWallet::new().with_balance(U256::from(1_000_u64));
    let mut config = PaymentConfig::default();
    let context = WalletContext {
        address: PAYER.to_string(),
        chain_id: 56,
    };

    let err = PlanPurchase::new(&wallet, &config)
        .pay(&context, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, DinsyError::InsufficientFunds { .. }));
    assert!(wallet.sent().is_empty());

    config.funds_policy = FundsPolicy::Proceed;
    let receipt = PlanPurchase::new(&wallet, &config)
        .pay(&context, 1)
        .await
        .unwrap();
    assert!(!receipt.funds.is_sufficient());
    assert_eq!(wallet.sent().len(), 1);
}

#[tokio::test]
async fn test_plan_purchase_rejection_and_custom_level() {
    let wallet = MockWallet::new().rejecting_send(0);
    let config = PaymentConfig::default();
    let purchase = PlanPurchase::new(&wallet, &config);
    let context = WalletContext {
        address: PAYER.to_string(),
        chain_id: 56,
    };

    match purchase.pay(&context, 1).await.unwrap_err() {
        DinsyError::TransferFailed {
            stage, sponsor_tx, ..
        } => {
            assert_eq!(stage, TransferStage::Plan);
            assert!(sponsor_tx.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(matches!(
        purchase.pay(&context, 0).await,
        Err(DinsyError::NotAPlan(0))
    ));
}
