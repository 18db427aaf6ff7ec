use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::Result;
use crate::modules::companies::CompanyLedger;
use crate::modules::payments::models::{Payment, PaymentDirection};

/// Source of ledger transactions
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a transaction; every ledger mutation of one operation runs inside it
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;
}

/// One ledger transaction
///
/// Dropping the transaction without calling [`LedgerTransaction::commit`]
/// rolls every write back.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Latest payment of an appointment in the given direction, items ordered by position
    async fn find_payment_by_appointment(
        &mut self,
        appointment_id: &str,
        direction: PaymentDirection,
    ) -> Result<Option<Payment>>;

    /// Company ledger fields, locked until the transaction ends
    async fn find_company_for_update(&mut self, company_id: &str) -> Result<Option<CompanyLedger>>;

    /// Persist a new deposit balance (or used credit)
    async fn update_company_balance(&mut self, company_id: &str, deposit_amount: Decimal)
        -> Result<()>;

    /// Insert or update a payment together with all of its items
    async fn save_payment(&mut self, payment: &Payment) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
