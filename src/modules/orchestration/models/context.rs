// Per-operation read projections assembled by the context loader. Built per
// call inside the operation's transaction and never persisted.

use crate::modules::appointments::{AppointmentProjection, PartyProjection, PayoutRail};
use crate::modules::companies::{CompanyLedger, FundingSource};
use crate::modules::payments::{CustomerType, Payment, PaymentSystem};
use crate::modules::pricing::PriceBreakdown;

/// Who pays for the appointment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payer {
    Individual(PartyProjection),
    /// Billed to a company; the ledger row is locked for the transaction
    Corporate {
        party: PartyProjection,
        company: CompanyLedger,
    },
}

impl Payer {
    pub fn party(&self) -> &PartyProjection {
        match self {
            Payer::Individual(party) | Payer::Corporate { party, .. } => party,
        }
    }

    pub fn is_corporate(&self) -> bool {
        matches!(self, Payer::Corporate { .. })
    }

    pub fn company(&self) -> Option<&CompanyLedger> {
        match self {
            Payer::Corporate { company, .. } => Some(company),
            Payer::Individual(_) => None,
        }
    }

    pub fn company_mut(&mut self) -> Option<&mut CompanyLedger> {
        match self {
            Payer::Corporate { company, .. } => Some(company),
            Payer::Individual(_) => None,
        }
    }

    pub fn funding_source(&self) -> Option<FundingSource> {
        self.company().map(|company| company.funding_source)
    }

    pub fn customer_type(&self) -> CustomerType {
        if self.is_corporate() {
            CustomerType::Corporate
        } else {
            CustomerType::Individual
        }
    }

    pub fn payment_system(&self) -> PaymentSystem {
        match self.funding_source() {
            Some(source) => source.into(),
            None => PaymentSystem::CardGateway,
        }
    }
}

/// Who is paid for the appointment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payee {
    Individual {
        party: PartyProjection,
        payout_account_ref: Option<String>,
        rail: PayoutRail,
    },
    Corporate {
        party: PartyProjection,
        company_id: String,
    },
}

impl Payee {
    pub fn party(&self) -> &PartyProjection {
        match self {
            Payee::Individual { party, .. } | Payee::Corporate { party, .. } => party,
        }
    }

    pub fn is_corporate(&self) -> bool {
        matches!(self, Payee::Corporate { .. })
    }
}

/// Which hold an authorization places
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationKind {
    Main,
    AdditionalBlock { minutes: u32 },
}

#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    pub appointment: AppointmentProjection,
    pub payer: Payer,
    pub kind: AuthorizationKind,
    /// Start price, or the extension price for an additional block
    pub price: PriceBreakdown,
    pub existing_payment: Option<Payment>,
}

#[derive(Debug, Clone)]
pub struct CancelContext {
    pub appointment: AppointmentProjection,
    pub payer: Payer,
    pub payment: Payment,
    pub is_cancelled_by_client: bool,
    /// Client cancelled inside the minimum-notice window
    pub is_restricted_by_time_limit: bool,
}

#[derive(Debug, Clone)]
pub struct RecreateContext {
    pub appointment: AppointmentProjection,
    pub old_appointment_id: String,
    pub payer: Payer,
    pub old_payment: Option<Payment>,
    pub price: PriceBreakdown,
    pub has_price_changed: bool,
}

#[derive(Debug, Clone)]
pub struct CaptureContext {
    pub appointment: AppointmentProjection,
    pub payer: Payer,
    pub payee: Option<Payee>,
    pub payment: Payment,
    /// Price of the actual business window, or the estimate when it is unknown
    pub final_price: PriceBreakdown,
    pub is_same_company: bool,
    pub is_second_attempt: bool,
}

#[derive(Debug, Clone)]
pub struct TransferContext {
    pub appointment: AppointmentProjection,
    pub payee: Option<Payee>,
    pub price: PriceBreakdown,
    pub existing_payment: Option<Payment>,
}

/// Borrowed context handed to the strategy resolver
#[derive(Debug, Clone, Copy)]
pub enum OperationContext<'a> {
    Authorize(&'a AuthorizationContext),
    AuthorizationRecreate(&'a RecreateContext),
    AuthorizationCancel(&'a CancelContext),
    Capture(&'a CaptureContext),
    Transfer(&'a TransferContext),
}
