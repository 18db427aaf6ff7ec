use crate::core::{Currency, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Card gateway capability used by the payment engine
///
/// Every money-moving call carries an idempotency key built from stable ids,
/// so a retried job never charges or transfers twice.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Place a hold on the payer's saved payment method
    async fn authorize(&self, request: AuthorizeRequest) -> Result<Authorization>;

    /// Convert a hold into a charge
    async fn capture(&self, request: CaptureRequest) -> Result<Capture>;

    /// Release a hold
    async fn cancel_authorization(&self, external_id: &str) -> Result<()>;

    /// Move funds to a connected payout account
    async fn transfer(&self, request: TransferRequest) -> Result<Transfer>;

    /// Pay a connected account balance out immediately
    async fn payout(&self, request: PayoutRequest) -> Result<Payout>;

    /// Get gateway name
    fn name(&self) -> &str;
}

/// Alternate payout network for interpreters not paid through the card gateway
#[async_trait]
pub trait PayoutNetwork: Send + Sync {
    async fn payout(&self, request: PayoutRequest) -> Result<Payout>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub amount: Decimal,
    pub currency: Currency,
    pub customer_ref: Option<String>,
    pub payment_method_ref: String,
    pub description: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Gateway reference of the hold
    pub external_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub external_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub charge_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub amount: Decimal,
    pub currency: Currency,
    /// Connected account receiving the funds
    pub destination_ref: String,
    pub description: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub transfer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub amount: Decimal,
    pub currency: Currency,
    pub account_ref: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub payout_id: String,
}
