use async_trait::async_trait;

use crate::core::Result;
use crate::modules::collaborators::models::{PaymentNotification, RechargeRequest, ReceiptRequest};

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: PaymentNotification) -> Result<()>;
}

#[async_trait]
pub trait DepositRecharger: Send + Sync {
    /// Ask the company service to charge the company's card and top up its deposit
    async fn request_recharge(&self, request: RechargeRequest) -> Result<()>;
}

#[async_trait]
pub trait ReceiptGenerator: Send + Sync {
    /// Render a receipt and return its reference
    async fn generate(&self, request: ReceiptRequest) -> Result<String>;
}
