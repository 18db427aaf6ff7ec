use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payment_item::{PaymentItem, PaymentItemStatus};
use crate::core::Currency;
use crate::modules::companies::FundingSource;

/// Money flow direction relative to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentDirection {
    /// From the paying client
    Incoming,
    /// To the interpreter or interpreting provider
    Outcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CustomerType {
    Individual,
    Corporate,
}

/// Funding or payout system a payment moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentSystem {
    CardGateway,
    PayoutNetwork,
    Deposit,
    PostPayment,
    /// Settled by the periodic corporate payout run
    CorporatePayout,
}

impl From<FundingSource> for PaymentSystem {
    fn from(source: FundingSource) -> Self {
        match source {
            FundingSource::Deposit => PaymentSystem::Deposit,
            FundingSource::PostPayment => PaymentSystem::PostPayment,
        }
    }
}

macro_rules! str_enum {
    ($ty:ty { $($variant:path => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($ty), s)),
                }
            }
        }
    };
}

str_enum!(PaymentDirection {
    PaymentDirection::Incoming => "incoming",
    PaymentDirection::Outcoming => "outcoming",
});

str_enum!(CustomerType {
    CustomerType::Individual => "individual",
    CustomerType::Corporate => "corporate",
});

str_enum!(PaymentSystem {
    PaymentSystem::CardGateway => "card-gateway",
    PaymentSystem::PayoutNetwork => "payout-network",
    PaymentSystem::Deposit => "deposit",
    PaymentSystem::PostPayment => "post-payment",
    PaymentSystem::CorporatePayout => "corporate-payout",
});

/// Which items the payment totals are derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsBasis {
    /// Live holds of an incoming payment
    Authorized,
    /// Settled same-company commission
    Captured,
    /// Every item that is not a failed attempt (outgoing payments)
    Settled,
}

impl TotalsBasis {
    fn includes(&self, status: PaymentItemStatus) -> bool {
        use PaymentItemStatus::*;
        match self {
            TotalsBasis::Authorized => status == Authorized,
            TotalsBasis::Captured => status == Captured,
            TotalsBasis::Settled => !matches!(
                status,
                AuthorizationFailed | CaptureFailed | CancelFailed | TransferFailed | PayoutFailed
                    | Canceled
            ),
        }
    }
}

/// Parameters of a new payment record
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub platform_id: String,
    pub direction: PaymentDirection,
    pub currency: Currency,
    pub customer_type: CustomerType,
    pub system: PaymentSystem,
    pub appointment_id: Option<String>,
    pub company_id: Option<String>,
    pub from_client_id: Option<String>,
    pub to_interpreter_id: Option<String>,
}

/// Payment aggregate root
///
/// Totals are always derived from the items through
/// [`Payment::recalculate_totals`]; they are never assigned directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub platform_id: String,
    pub direction: PaymentDirection,
    pub currency: Currency,
    pub customer_type: CustomerType,
    pub system: PaymentSystem,
    pub(crate) total_amount: Decimal,
    pub(crate) total_gst_amount: Decimal,
    pub(crate) total_full_amount: Decimal,
    pub appointment_id: Option<String>,
    pub company_id: Option<String>,
    pub from_client_id: Option<String>,
    pub to_interpreter_id: Option<String>,
    pub note: Option<String>,
    pub items: Vec<PaymentItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(draft: NewPayment) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            platform_id: draft.platform_id,
            direction: draft.direction,
            currency: draft.currency,
            customer_type: draft.customer_type,
            system: draft.system,
            total_amount: Decimal::ZERO,
            total_gst_amount: Decimal::ZERO,
            total_full_amount: Decimal::ZERO,
            appointment_id: draft.appointment_id,
            company_id: draft.company_id,
            from_client_id: draft.from_client_id,
            to_interpreter_id: draft.to_interpreter_id,
            note: None,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn total_gst_amount(&self) -> Decimal {
        self.total_gst_amount
    }

    pub fn total_full_amount(&self) -> Decimal {
        self.total_full_amount
    }

    /// Append a new `Created` item at the next position
    pub fn add_item(&mut self, amount: Decimal, gst_amount: Decimal) -> &mut PaymentItem {
        let position = self.items.len() as u32;
        let item = PaymentItem::new(self.id.clone(), position, self.currency, amount, gst_amount);
        self.items.push(item);
        self.updated_at = Utc::now();
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    /// The first item; captured for the recalculated final price
    pub fn main_item(&self) -> Option<&PaymentItem> {
        self.items.first()
    }

    pub fn main_item_mut(&mut self) -> Option<&mut PaymentItem> {
        self.items.first_mut()
    }

    /// Derive totals from the items selected by `basis`
    pub fn recalculate_totals(&mut self, basis: TotalsBasis) {
        let (amount, gst) = self
            .items
            .iter()
            .filter(|item| basis.includes(item.status()))
            .fold((Decimal::ZERO, Decimal::ZERO), |(amount, gst), item| {
                (amount + item.amount, gst + item.gst_amount)
            });

        self.total_amount = amount;
        self.total_gst_amount = gst;
        self.total_full_amount = amount + gst;
        self.updated_at = Utc::now();
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = Some(note.into());
        self.updated_at = Utc::now();
    }

    pub fn has_item_in(&self, statuses: &[PaymentItemStatus]) -> bool {
        self.items.iter().any(|item| statuses.contains(&item.status()))
    }
}
