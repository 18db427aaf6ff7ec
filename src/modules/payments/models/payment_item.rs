use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};
use crate::modules::pricing::AppliedDiscounts;

/// Payment item status
///
/// Transitions only move forward; see [`PaymentItemStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentItemStatus {
    Created,
    Authorized,
    AuthorizationFailed,
    Captured,
    CaptureFailed,
    Canceled,
    CancelFailed,
    /// Hold superseded by a same-company settlement
    Success,
    /// Amount returned to the payer by a same-company settlement
    Refund,
    Transfered,
    TransferFailed,
    WaitingForPayout,
    PayoutSuccess,
    PayoutFailed,
}

impl PaymentItemStatus {
    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(self, next: PaymentItemStatus) -> bool {
        use PaymentItemStatus::*;

        match (self, next) {
            (
                Created,
                Authorized | AuthorizationFailed | Captured | Refund | Transfered | TransferFailed
                | WaitingForPayout | PayoutSuccess | PayoutFailed,
            ) => true,
            (AuthorizationFailed, Authorized | AuthorizationFailed) => true,
            (Authorized, Captured | CaptureFailed | Canceled | CancelFailed | Success) => true,
            (CaptureFailed, Captured | CaptureFailed) => true,
            (CancelFailed, Canceled | CancelFailed) => true,
            (TransferFailed, Transfered | TransferFailed | PayoutSuccess | PayoutFailed) => true,
            (Transfered, PayoutSuccess | PayoutFailed) => true,
            (PayoutFailed, PayoutSuccess | PayoutFailed) => true,
            (WaitingForPayout, Transfered | PayoutSuccess) => true,
            _ => false,
        }
    }

    /// No transition leaves these statuses
    pub fn is_terminal(self) -> bool {
        use PaymentItemStatus::*;
        matches!(self, Captured | Canceled | Success | Refund | PayoutSuccess)
    }

    pub fn as_str(&self) -> &'static str {
        use PaymentItemStatus::*;
        match self {
            Created => "created",
            Authorized => "authorized",
            AuthorizationFailed => "authorization-failed",
            Captured => "captured",
            CaptureFailed => "capture-failed",
            Canceled => "canceled",
            CancelFailed => "cancel-failed",
            Success => "success",
            Refund => "refund",
            Transfered => "transfered",
            TransferFailed => "transfer-failed",
            WaitingForPayout => "waiting-for-payout",
            PayoutSuccess => "payout-success",
            PayoutFailed => "payout-failed",
        }
    }
}

impl std::fmt::Display for PaymentItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentItemStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use PaymentItemStatus::*;
        let status = match s {
            "created" => Created,
            "authorized" => Authorized,
            "authorization-failed" => AuthorizationFailed,
            "captured" => Captured,
            "capture-failed" => CaptureFailed,
            "canceled" => Canceled,
            "cancel-failed" => CancelFailed,
            "success" => Success,
            "refund" => Refund,
            "transfered" => Transfered,
            "transfer-failed" => TransferFailed,
            "waiting-for-payout" => WaitingForPayout,
            "payout-success" => PayoutSuccess,
            "payout-failed" => PayoutFailed,
            _ => return Err(format!("Invalid payment item status: {}", s)),
        };
        Ok(status)
    }
}

/// One financial leg of a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    pub id: String,
    pub payment_id: String,
    /// Order within the payment; position 0 is the main item
    pub position: u32,
    pub amount: Decimal,
    pub gst_amount: Decimal,
    pub full_amount: Decimal,
    pub currency: Currency,
    pub(crate) status: PaymentItemStatus,
    /// Attempt counter of the item's current gateway leg, part of the
    /// idempotency key; raised after every failed call
    pub attempt: u32,
    /// Gateway authorization or charge reference
    pub external_id: Option<String>,
    pub transfer_id: Option<String>,
    pub payout_id: Option<String>,
    pub receipt: Option<String>,
    pub note: Option<String>,
    pub discounts: Option<AppliedDiscounts>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentItem {
    /// Create a new item in `Created` status
    pub fn new(
        payment_id: impl Into<String>,
        position: u32,
        currency: Currency,
        amount: Decimal,
        gst_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payment_id: payment_id.into(),
            position,
            amount,
            gst_amount,
            full_amount: amount + gst_amount,
            currency,
            status: PaymentItemStatus::Created,
            attempt: 1,
            external_id: None,
            transfer_id: None,
            payout_id: None,
            receipt: None,
            note: None,
            discounts: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> PaymentItemStatus {
        self.status
    }

    pub fn is_main(&self) -> bool {
        self.position == 0
    }

    /// Move to `next`, rejecting any backward or out-of-terminal transition
    pub fn transition(&mut self, next: PaymentItemStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Payment item {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Overwrite amounts; the full amount is always derived
    pub fn set_amounts(&mut self, amount: Decimal, gst_amount: Decimal) {
        self.amount = amount;
        self.gst_amount = gst_amount;
        self.full_amount = amount + gst_amount;
        self.updated_at = Utc::now();
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = Some(note.into());
        self.updated_at = Utc::now();
    }

    /// Gateway-backed items with a positive amount must carry an authorization reference
    pub fn missing_external_reference(&self) -> bool {
        self.full_amount > Decimal::ZERO
            && self
                .external_id
                .as_deref()
                .map_or(true, |id| id.trim().is_empty())
    }
}
