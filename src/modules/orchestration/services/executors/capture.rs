use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core::{round_money, AppError, Result};
use crate::modules::appointments::AppointmentRepository;
use crate::modules::collaborators::{ReceiptGenerator, ReceiptRequest};
use crate::modules::gateways::{idempotency, CaptureRequest, PaymentGateway};
use crate::modules::orchestration::models::{CaptureContext, Execution, ValidationOutcome};
use crate::modules::payments::{
    LedgerTransaction, Payment, PaymentItemStatus, RecordService, TotalsBasis,
};

/// Split of a same-company settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSplit {
    pub commission_amount: Decimal,
    pub commission_gst_amount: Decimal,
    pub refund_amount: Decimal,
    pub refund_gst_amount: Decimal,
}

impl CommissionSplit {
    /// Platform keeps `rate` percent of the full amount, the rest goes back.
    ///
    /// The commission GST is whatever remains after the rounded commission
    /// amount, so the two always add up to the rounded full commission.
    pub fn compute(amount: Decimal, gst_amount: Decimal, rate: Decimal) -> Self {
        let commission_full_amount =
            round_money((amount + gst_amount) * rate / Decimal::ONE_HUNDRED);
        let commission_amount = round_money(amount * rate / Decimal::ONE_HUNDRED);
        let commission_gst_amount = commission_full_amount - commission_amount;

        Self {
            commission_amount,
            commission_gst_amount,
            refund_amount: amount - commission_amount,
            refund_gst_amount: gst_amount - commission_gst_amount,
        }
    }

    pub fn refund_full_amount(&self) -> Decimal {
        self.refund_amount + self.refund_gst_amount
    }

    pub fn commission_full_amount(&self) -> Decimal {
        self.commission_amount + self.commission_gst_amount
    }
}

/// Turns holds into charges
pub struct CaptureExecutor {
    gateway: Arc<dyn PaymentGateway>,
    appointments: Arc<dyn AppointmentRepository>,
    receipts: Arc<dyn ReceiptGenerator>,
    records: RecordService,
}

impl CaptureExecutor {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        appointments: Arc<dyn AppointmentRepository>,
        receipts: Arc<dyn ReceiptGenerator>,
        records: RecordService,
    ) -> Self {
        Self {
            gateway,
            appointments,
            receipts,
            records,
        }
    }

    pub async fn validation_failed(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut CaptureContext,
        validation: &ValidationOutcome,
    ) -> Result<Execution> {
        let message = validation.message_or_default().to_string();
        ctx.payment.set_note(&message);
        self.records.save(tx, &mut ctx.payment, None).await?;

        warn!(payment_id = %ctx.payment.id, reason = %message, "Capture rejected by validation");

        Ok(Execution::failed(Some(ctx.payment.id.clone()), message))
    }

    /// Capture card holds through the gateway
    pub async fn individual(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut CaptureContext,
    ) -> Result<Execution> {
        self.capture_items(tx, ctx, true).await
    }

    /// Corporate funds were reserved at authorization; capture is a status change
    pub async fn corporate(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut CaptureContext,
    ) -> Result<Execution> {
        self.capture_items(tx, ctx, false).await
    }

    /// Client and interpreter belong to the same company: keep only the
    /// platform commission and return the rest to the company.
    pub async fn same_company(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut CaptureContext,
    ) -> Result<Execution> {
        let payment = &mut ctx.payment;
        let company = ctx
            .payer
            .company_mut()
            .ok_or_else(|| AppError::internal("Same-company settlement without a company ledger"))?;

        let (amount, gst_amount) = payment
            .items
            .iter()
            .filter(|item| item.status() == PaymentItemStatus::Authorized)
            .fold((Decimal::ZERO, Decimal::ZERO), |(amount, gst), item| {
                (amount + item.amount, gst + item.gst_amount)
            });

        if !payment.has_item_in(&[PaymentItemStatus::Authorized]) {
            let settled = payment.has_item_in(&[PaymentItemStatus::Refund])
                && payment.has_item_in(&[PaymentItemStatus::Captured]);
            if settled {
                return Ok(Execution::succeeded(Some(payment.id.clone()))
                    .with_note(Some("Commission already settled".to_string())));
            }

            let note = "No authorized items to settle".to_string();
            payment.set_note(&note);
            self.records.save(tx, payment, None).await?;
            return Ok(Execution::failed(Some(payment.id.clone()), note));
        }

        let split = CommissionSplit::compute(amount, gst_amount, company.platform_commission_rate);

        for item in payment
            .items
            .iter_mut()
            .filter(|item| item.status() == PaymentItemStatus::Authorized)
        {
            item.transition(PaymentItemStatus::Success)?;
        }

        payment
            .add_item(-split.refund_amount, -split.refund_gst_amount)
            .transition(PaymentItemStatus::Refund)?;
        payment
            .add_item(split.commission_amount, split.commission_gst_amount)
            .transition(PaymentItemStatus::Captured)?;

        self.records
            .refund_company(tx, company, split.refund_full_amount())
            .await?;
        self.records
            .save(tx, payment, Some(TotalsBasis::Captured))
            .await?;

        self.appointments
            .update_paid_by_client(
                &ctx.appointment.id,
                split.commission_full_amount(),
                payment.currency,
            )
            .await?;

        info!(
            appointment_id = %ctx.appointment.id,
            payment_id = %payment.id,
            company_id = %company.id,
            commission = %split.commission_full_amount(),
            refund = %split.refund_full_amount(),
            "Same-company commission settled"
        );

        Ok(Execution::succeeded(Some(payment.id.clone())))
    }

    /// Attach receipts to captured items that have none
    pub async fn generate_missing_receipts(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
        appointment_id: &str,
    ) -> Result<Execution> {
        let pending: Vec<usize> = payment
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.status() == PaymentItemStatus::Captured && item.receipt.is_none()
            })
            .map(|(index, _)| index)
            .collect();

        let mut failures = Vec::new();
        for index in pending {
            if let Some(note) = self
                .attach_receipt(payment, index, appointment_id, None)
                .await
            {
                failures.push(note);
            }
        }

        self.records.save(tx, payment, None).await?;

        if failures.is_empty() {
            Ok(Execution::succeeded(Some(payment.id.clone())))
        } else {
            Ok(Execution::failed(Some(payment.id.clone()), failures.join("; ")))
        }
    }

    /// All items must end CAPTURED for the capture to succeed
    async fn capture_items(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut CaptureContext,
        via_gateway: bool,
    ) -> Result<Execution> {
        let is_second_attempt = ctx.is_second_attempt;
        let mut failures = Vec::new();
        let mut captured = Vec::new();

        for (index, item) in ctx.payment.items.iter_mut().enumerate() {
            let status = item.status();
            if status == PaymentItemStatus::Captured {
                continue;
            }

            let accepted = status == PaymentItemStatus::Authorized
                || (is_second_attempt && status == PaymentItemStatus::CaptureFailed);
            if !accepted {
                let note = format!("Item {} is {} and cannot be captured", item.position, status);
                if status.can_transition_to(PaymentItemStatus::CaptureFailed) {
                    item.transition(PaymentItemStatus::CaptureFailed)?;
                }
                item.set_note(&note);
                failures.push(note);
                continue;
            }

            if !via_gateway || item.full_amount.is_zero() {
                item.transition(PaymentItemStatus::Captured)?;
                captured.push((index, None));
                continue;
            }

            if item.missing_external_reference() {
                let note = format!(
                    "Item {} has no authorization reference for {}",
                    item.position, item.full_amount
                );
                item.transition(PaymentItemStatus::CaptureFailed)?;
                item.set_note(&note);
                failures.push(note);
                continue;
            }

            let key = idempotency::capture(&item.id, is_second_attempt);
            let request = CaptureRequest {
                external_id: item.external_id.clone().unwrap_or_default(),
                amount: item.full_amount,
                currency: item.currency,
                idempotency_key: key.clone(),
            };

            match self.gateway.capture(request).await {
                Ok(capture) => {
                    item.note = None;
                    item.transition(PaymentItemStatus::Captured)?;
                    captured.push((index, Some(capture.charge_ref)));
                }
                Err(e) => {
                    let note = e.to_string();
                    warn!(
                        item_id = %item.id,
                        idempotency_key = %key,
                        error = %note,
                        "Gateway capture failed"
                    );
                    item.transition(PaymentItemStatus::CaptureFailed)?;
                    item.set_note(&note);
                    failures.push(note);
                }
            }
        }

        for (index, charge_ref) in captured {
            self.attach_receipt(&mut ctx.payment, index, &ctx.appointment.id, charge_ref)
                .await;
        }

        self.records.save(tx, &mut ctx.payment, None).await?;

        let payment = &ctx.payment;
        if !failures.is_empty() {
            warn!(
                appointment_id = %ctx.appointment.id,
                payment_id = %payment.id,
                failed_items = failures.len(),
                "Capture incomplete"
            );
            return Ok(Execution::failed(Some(payment.id.clone()), failures.join("; ")));
        }

        let paid: Decimal = payment
            .items
            .iter()
            .filter(|item| item.status() == PaymentItemStatus::Captured)
            .map(|item| item.full_amount)
            .sum();
        self.appointments
            .update_paid_by_client(&ctx.appointment.id, paid, payment.currency)
            .await?;

        info!(
            appointment_id = %ctx.appointment.id,
            payment_id = %payment.id,
            paid = %paid,
            "Payment captured"
        );

        Ok(Execution::succeeded(Some(payment.id.clone())))
    }

    /// Fetch a receipt for one item; a failure only leaves a note
    async fn attach_receipt(
        &self,
        payment: &mut Payment,
        index: usize,
        appointment_id: &str,
        charge_ref: Option<String>,
    ) -> Option<String> {
        let item = &payment.items[index];
        let request = ReceiptRequest {
            appointment_id: appointment_id.to_string(),
            payment_id: payment.id.clone(),
            item_id: item.id.clone(),
            charge_ref: charge_ref.or_else(|| item.external_id.clone()),
            amount: item.amount,
            gst_amount: item.gst_amount,
            currency: item.currency,
        };

        let result = self.receipts.generate(request).await;
        let item = &mut payment.items[index];
        match result {
            Ok(receipt) => {
                item.receipt = Some(receipt);
                None
            }
            Err(e) => {
                let note = format!("Receipt unavailable: {}", e);
                warn!(item_id = %item.id, error = %e, "Receipt generation failed");
                item.set_note(&note);
                Some(note)
            }
        }
    }
}
