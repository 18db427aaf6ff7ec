use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::orchestration::models::{Execution, RecreateContext};
use crate::modules::payments::{LedgerTransaction, RecordService};

/// Moves an unchanged authorization to a re-created appointment
pub struct RecreateExecutor {
    records: RecordService,
}

impl RecreateExecutor {
    pub fn new(records: RecordService) -> Self {
        Self { records }
    }

    /// Link the previous payment to the new appointment; no money moves
    pub async fn reattach(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut RecreateContext,
    ) -> Result<Execution> {
        let payment = ctx.old_payment.as_mut().ok_or_else(|| {
            AppError::internal("Reattach requested without a previous payment")
        })?;

        payment.appointment_id = Some(ctx.appointment.id.clone());
        payment.platform_id = ctx.appointment.platform_id.clone();
        payment.set_note(format!(
            "Reattached from appointment {}",
            ctx.old_appointment_id
        ));
        self.records.save(tx, payment, None).await?;

        info!(
            appointment_id = %ctx.appointment.id,
            old_appointment_id = %ctx.old_appointment_id,
            payment_id = %payment.id,
            "Existing authorization reattached"
        );

        Ok(Execution::succeeded(Some(payment.id.clone())))
    }
}
