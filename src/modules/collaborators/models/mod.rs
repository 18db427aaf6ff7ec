use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Currency;

/// Outbound payment notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PaymentNotification {
    AuthorizationSucceeded {
        appointment_id: String,
        recipient_id: String,
        amount: Decimal,
        currency: Currency,
    },
    AuthorizationFailed {
        appointment_id: String,
        recipient_id: String,
        reason: String,
    },
    /// Deposit or credit line cannot cover an appointment; the appointment was cancelled
    InsufficientFunds {
        appointment_id: String,
        company_id: String,
        recipient_id: Option<String>,
        balance: Decimal,
        required: Decimal,
    },
    LowBalance {
        company_id: String,
        recipient_id: Option<String>,
        balance: Decimal,
        threshold: Decimal,
    },
    WaitListRedirected {
        appointment_id: String,
        recipient_id: String,
    },
}

/// Top-up of a corporate deposit by its default charge amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RechargeRequest {
    pub company_id: String,
    pub amount: Decimal,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRequest {
    pub appointment_id: String,
    pub payment_id: String,
    pub item_id: String,
    pub charge_ref: Option<String>,
    pub amount: Decimal,
    pub gst_amount: Decimal,
    pub currency: Currency,
}

/// Work dispatched after the ledger transaction commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Notify(PaymentNotification),
    Recharge(RechargeRequest),
}
