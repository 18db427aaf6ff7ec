use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::core::Result;
use crate::modules::companies::CompanyLedger;
use crate::modules::payments::models::{Payment, TotalsBasis};
use crate::modules::payments::repositories::LedgerTransaction;

/// Writes payment records and company balances inside the caller's transaction
#[derive(Debug, Clone, Default)]
pub struct RecordService;

impl RecordService {
    pub fn new() -> Self {
        Self
    }

    /// Draw `amount` from the company and persist the new balance
    ///
    /// Returns the balance after the charge.
    pub async fn charge_company(
        &self,
        tx: &mut dyn LedgerTransaction,
        company: &mut CompanyLedger,
        amount: Decimal,
    ) -> Result<Decimal> {
        let balance = company.balance_after_charge(amount);
        self.write_balance(tx, company, balance).await?;
        Ok(balance)
    }

    /// Return `amount` to the company and persist the new balance
    pub async fn refund_company(
        &self,
        tx: &mut dyn LedgerTransaction,
        company: &mut CompanyLedger,
        amount: Decimal,
    ) -> Result<Decimal> {
        let balance = company.balance_after_refund(amount);
        self.write_balance(tx, company, balance).await?;
        Ok(balance)
    }

    async fn write_balance(
        &self,
        tx: &mut dyn LedgerTransaction,
        company: &mut CompanyLedger,
        balance: Decimal,
    ) -> Result<()> {
        tx.update_company_balance(&company.id, balance).await?;

        info!(
            company_id = %company.id,
            funding_source = %company.funding_source,
            previous = %company.deposit_amount,
            balance = %balance,
            "Company balance updated"
        );

        company.deposit_amount = balance;
        Ok(())
    }

    /// Persist the payment, deriving totals first when a basis is given
    pub async fn save(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
        basis: Option<TotalsBasis>,
    ) -> Result<()> {
        if let Some(basis) = basis {
            payment.recalculate_totals(basis);
        }

        tx.save_payment(payment).await?;

        debug!(
            payment_id = %payment.id,
            appointment_id = ?payment.appointment_id,
            total_full_amount = %payment.total_full_amount(),
            items = payment.items.len(),
            "Payment record saved"
        );

        Ok(())
    }
}
