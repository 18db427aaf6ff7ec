use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core::Result;
use crate::modules::companies::CompanyLedger;
use crate::modules::gateways::PaymentGateway;
use crate::modules::orchestration::models::{Execution, ValidationOutcome};
use crate::modules::payments::{
    LedgerTransaction, Payment, PaymentItem, PaymentItemStatus, RecordService, TotalsBasis,
};

/// Releases holds item by item
///
/// Each item is validated on its own. The operation succeeds only when every
/// item that held funds ends CANCELED; items already cancelled are skipped,
/// so a repeated cancel is a successful no-op.
pub struct CancellationExecutor {
    gateway: Arc<dyn PaymentGateway>,
    records: RecordService,
    notice_hours: i64,
}

impl CancellationExecutor {
    pub fn new(gateway: Arc<dyn PaymentGateway>, records: RecordService, notice_hours: i64) -> Self {
        Self {
            gateway,
            records,
            notice_hours,
        }
    }

    pub async fn validation_failed(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
        validation: &ValidationOutcome,
    ) -> Result<Execution> {
        let message = validation.message_or_default().to_string();
        payment.set_note(&message);
        self.records.save(tx, payment, None).await?;

        warn!(payment_id = %payment.id, reason = %message, "Cancellation rejected by validation");

        Ok(Execution::failed(Some(payment.id.clone()), message))
    }

    /// Late client cancellation: keep the hold for a later capture
    pub async fn not_allowed(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
    ) -> Result<Execution> {
        let note = format!(
            "Cancelled by the client less than {} hours before the start; authorization kept for capture",
            self.notice_hours
        );
        payment.set_note(&note);
        self.records.save(tx, payment, None).await?;

        info!(payment_id = %payment.id, "Late cancellation, authorization kept");

        Ok(Execution::succeeded(Some(payment.id.clone())).with_note(Some(note)))
    }

    /// Return deposit or credit for every valid item
    pub async fn corporate(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
        company: &mut CompanyLedger,
    ) -> Result<Execution> {
        let mut failures = Vec::new();

        for item in payment.items.iter_mut() {
            if !needs_release(item, &mut failures) {
                continue;
            }

            if item.full_amount > Decimal::ZERO {
                self.records
                    .refund_company(tx, company, item.full_amount)
                    .await?;
            }
            item.transition(PaymentItemStatus::Canceled)?;
        }

        self.finish(tx, payment, failures).await
    }

    /// Release every valid hold at the card gateway
    pub async fn individual(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
    ) -> Result<Execution> {
        let mut failures = Vec::new();

        for item in payment.items.iter_mut() {
            if !needs_release(item, &mut failures) {
                continue;
            }

            if item.full_amount.is_zero() {
                item.transition(PaymentItemStatus::Canceled)?;
                continue;
            }

            if item.missing_external_reference() {
                let note = format!(
                    "Item {} has no authorization reference for {}",
                    item.position, item.full_amount
                );
                item.transition(PaymentItemStatus::CancelFailed)?;
                item.set_note(&note);
                failures.push(note);
                continue;
            }

            let external_id = item.external_id.clone().unwrap_or_default();
            match self.gateway.cancel_authorization(&external_id).await {
                Ok(()) => {
                    item.note = None;
                    item.transition(PaymentItemStatus::Canceled)?;
                }
                Err(e) => {
                    let note = e.to_string();
                    warn!(
                        item_id = %item.id,
                        external_id = %external_id,
                        error = %note,
                        "Gateway cancellation failed"
                    );
                    item.transition(PaymentItemStatus::CancelFailed)?;
                    item.set_note(&note);
                    failures.push(note);
                }
            }
        }

        self.finish(tx, payment, failures).await
    }

    async fn finish(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
        failures: Vec<String>,
    ) -> Result<Execution> {
        self.records
            .save(tx, payment, Some(TotalsBasis::Authorized))
            .await?;

        if failures.is_empty() {
            info!(payment_id = %payment.id, "Authorization cancelled");
            Ok(Execution::succeeded(Some(payment.id.clone())))
        } else {
            warn!(
                payment_id = %payment.id,
                failed_items = failures.len(),
                "Authorization cancel incomplete"
            );
            Ok(Execution::failed(Some(payment.id.clone()), failures.join("; ")))
        }
    }
}

/// Whether `item` still holds funds that this cancel must release.
///
/// Only AUTHORIZED items (and retries of CANCEL_FAILED) are released.
/// CANCELED, CREATED and AUTHORIZATION_FAILED items never held funds or
/// already gave them back, so they are skipped without a failure and keep
/// their note. Any other status is invalid: it is noted on the item and
/// recorded in `failures`.
fn needs_release(item: &mut PaymentItem, failures: &mut Vec<String>) -> bool {
    match item.status() {
        PaymentItemStatus::Canceled
        | PaymentItemStatus::Created
        | PaymentItemStatus::AuthorizationFailed => false,
        PaymentItemStatus::Authorized | PaymentItemStatus::CancelFailed => true,
        other => {
            let note = format!("Item {} is {} and cannot be cancelled", item.position, other);
            item.set_note(&note);
            failures.push(note);
            false
        }
    }
}
