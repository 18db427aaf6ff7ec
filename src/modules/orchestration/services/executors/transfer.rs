use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::appointments::{AppointmentRepository, PayoutRail};
use crate::modules::gateways::{
    idempotency, PaymentGateway, PayoutNetwork, PayoutRequest, TransferRequest,
};
use crate::modules::orchestration::models::{Execution, Payee, TransferContext, ValidationOutcome};
use crate::modules::payments::{
    CustomerType, LedgerTransaction, NewPayment, Payment, PaymentDirection, PaymentItem,
    PaymentItemStatus, PaymentSystem, RecordService, TotalsBasis,
};

/// Result of one money-moving leg of an individual payout
enum Leg {
    Done,
    Failed(String),
    /// The item's status does not allow this leg to run
    NotApplicable,
}

/// Pays the interpreter
pub struct TransferExecutor {
    gateway: Arc<dyn PaymentGateway>,
    payout_network: Arc<dyn PayoutNetwork>,
    appointments: Arc<dyn AppointmentRepository>,
    records: RecordService,
}

impl TransferExecutor {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        payout_network: Arc<dyn PayoutNetwork>,
        appointments: Arc<dyn AppointmentRepository>,
        records: RecordService,
    ) -> Self {
        Self {
            gateway,
            payout_network,
            appointments,
            records,
        }
    }

    pub async fn validation_failed(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut TransferContext,
        validation: &ValidationOutcome,
    ) -> Result<Execution> {
        let message = validation.message_or_default().to_string();

        let payment_id = match ctx.existing_payment.as_mut() {
            Some(payment) => {
                payment.set_note(&message);
                self.records.save(tx, payment, None).await?;
                Some(payment.id.clone())
            }
            None => None,
        };

        warn!(appointment_id = %ctx.appointment.id, reason = %message, "Transfer rejected by validation");

        Ok(Execution::failed(payment_id, message))
    }

    /// Corporate providers are settled by the periodic payout run; only the
    /// amount owed is recorded here
    pub async fn corporate(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut TransferContext,
    ) -> Result<Execution> {
        if let Some(payment) = ctx.existing_payment.as_ref() {
            if payment.main_item().is_some_and(|item| {
                matches!(
                    item.status(),
                    PaymentItemStatus::WaitingForPayout
                        | PaymentItemStatus::Transfered
                        | PaymentItemStatus::PayoutSuccess
                )
            }) {
                return Ok(Execution::succeeded(Some(payment.id.clone()))
                    .with_note(Some("Payout already recorded".to_string())));
            }
        }

        let company_id = match ctx.payee.as_ref() {
            Some(Payee::Corporate { company_id, .. }) => company_id.clone(),
            _ => return Err(AppError::internal("Corporate transfer without a corporate payee")),
        };

        let mut payment = match ctx.existing_payment.take() {
            Some(payment) => payment,
            None => new_outgoing_payment(
                ctx,
                CustomerType::Corporate,
                PaymentSystem::CorporatePayout,
                Some(company_id.clone()),
            ),
        };
        if payment.items.is_empty() {
            payment.add_item(ctx.price.interpreter_amount, ctx.price.interpreter_gst_amount);
        }
        payment.items[0].transition(PaymentItemStatus::WaitingForPayout)?;

        self.records
            .save(tx, &mut payment, Some(TotalsBasis::Settled))
            .await?;

        info!(
            appointment_id = %ctx.appointment.id,
            payment_id = %payment.id,
            company_id = %company_id,
            amount = %payment.total_full_amount(),
            "Corporate payout recorded"
        );

        Ok(Execution::succeeded(Some(payment.id)))
    }

    /// Transfer to the interpreter's connected account, with an immediate
    /// payout on the instant rail, or a single payout on the alternate network.
    ///
    /// A re-run only repeats the leg that has not succeeded yet. The run fails
    /// unless the item ends in the paid status of the payee's current rail.
    pub async fn individual(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut TransferContext,
    ) -> Result<Execution> {
        let (account_ref, rail) = match ctx.payee.as_ref() {
            Some(Payee::Individual {
                payout_account_ref: Some(account),
                rail,
                ..
            }) => (account.clone(), *rail),
            _ => {
                return Err(AppError::internal(
                    "Individual transfer without a payout account",
                ))
            }
        };

        let system = match rail {
            PayoutRail::PayoutNetwork => PaymentSystem::PayoutNetwork,
            PayoutRail::CardGateway | PayoutRail::CardGatewayInstant => PaymentSystem::CardGateway,
        };
        let mut payment = match ctx.existing_payment.take() {
            Some(payment) => payment,
            None => new_outgoing_payment(ctx, CustomerType::Individual, system, None),
        };
        if payment.items.is_empty() {
            payment.add_item(ctx.price.interpreter_amount, ctx.price.interpreter_gst_amount);
        }

        let appointment_id = ctx.appointment.id.clone();
        let platform_id = ctx.appointment.platform_id.clone();
        let leg = match rail {
            PayoutRail::PayoutNetwork => {
                self.network_payout(&mut payment, &appointment_id, &account_ref)
                    .await?
            }
            PayoutRail::CardGateway => {
                self.gateway_transfer(&mut payment, &platform_id, &appointment_id, &account_ref)
                    .await?
            }
            PayoutRail::CardGatewayInstant => {
                match self
                    .gateway_transfer(&mut payment, &platform_id, &appointment_id, &account_ref)
                    .await?
                {
                    Leg::Failed(note) => Leg::Failed(note),
                    Leg::Done | Leg::NotApplicable => {
                        self.instant_payout(&mut payment, &appointment_id, &account_ref)
                            .await?
                    }
                }
            }
        };

        let failure = match leg {
            Leg::Failed(note) => Some(note),
            Leg::Done | Leg::NotApplicable => unpaid_note(&mut payment.items[0], rail),
        };

        self.records
            .save(tx, &mut payment, Some(TotalsBasis::Settled))
            .await?;

        if let Some(note) = failure {
            return Ok(Execution::failed(Some(payment.id), note));
        }

        let item = &payment.items[0];
        self.appointments
            .update_received_by_interpreter(
                &appointment_id,
                item.amount,
                item.gst_amount,
                payment.currency,
            )
            .await?;

        info!(
            appointment_id = %appointment_id,
            payment_id = %payment.id,
            status = %item.status(),
            amount = %item.full_amount,
            "Interpreter paid"
        );

        Ok(Execution::succeeded(Some(payment.id)))
    }

    async fn gateway_transfer(
        &self,
        payment: &mut Payment,
        platform_id: &str,
        appointment_id: &str,
        account_ref: &str,
    ) -> Result<Leg> {
        let currency = payment.currency;
        let item = &mut payment.items[0];
        if !matches!(
            item.status(),
            PaymentItemStatus::Created | PaymentItemStatus::TransferFailed
        ) {
            return Ok(Leg::NotApplicable);
        }

        let request = TransferRequest {
            amount: item.full_amount,
            currency,
            destination_ref: account_ref.to_string(),
            description: format!("Appointment {}", platform_id),
            idempotency_key: idempotency::transfer(appointment_id, item.attempt),
        };

        match self.gateway.transfer(request).await {
            Ok(transfer) => {
                item.transfer_id = Some(transfer.transfer_id);
                item.note = None;
                item.transition(PaymentItemStatus::Transfered)?;
                Ok(Leg::Done)
            }
            Err(e) => {
                let note = e.to_string();
                warn!(appointment_id = %appointment_id, error = %note, "Transfer failed");
                item.transition(PaymentItemStatus::TransferFailed)?;
                item.attempt += 1;
                item.set_note(&note);
                Ok(Leg::Failed(note))
            }
        }
    }

    /// Only funds already transferred to the connected account can be paid out
    async fn instant_payout(
        &self,
        payment: &mut Payment,
        appointment_id: &str,
        account_ref: &str,
    ) -> Result<Leg> {
        let currency = payment.currency;
        let item = &mut payment.items[0];
        let transferred = item.transfer_id.is_some();
        let accepted = match item.status() {
            PaymentItemStatus::Transfered => true,
            PaymentItemStatus::PayoutFailed => transferred,
            _ => false,
        };
        if !accepted {
            return Ok(Leg::NotApplicable);
        }

        let request = PayoutRequest {
            amount: item.full_amount,
            currency,
            account_ref: account_ref.to_string(),
            idempotency_key: idempotency::payout(appointment_id, item.attempt),
        };

        match self.gateway.payout(request).await {
            Ok(payout) => {
                item.payout_id = Some(payout.payout_id);
                item.note = None;
                item.transition(PaymentItemStatus::PayoutSuccess)?;
                Ok(Leg::Done)
            }
            Err(e) => {
                let note = e.to_string();
                warn!(appointment_id = %appointment_id, error = %note, "Instant payout failed");
                item.transition(PaymentItemStatus::PayoutFailed)?;
                item.attempt += 1;
                item.set_note(&note);
                Ok(Leg::Failed(note))
            }
        }
    }

    /// Funds still held by the platform: never transferred, or a failed transfer
    async fn network_payout(
        &self,
        payment: &mut Payment,
        appointment_id: &str,
        account_ref: &str,
    ) -> Result<Leg> {
        let currency = payment.currency;
        let item = &mut payment.items[0];
        let transferred = item.transfer_id.is_some();
        let accepted = match item.status() {
            PaymentItemStatus::Created | PaymentItemStatus::TransferFailed => true,
            PaymentItemStatus::PayoutFailed => !transferred,
            _ => false,
        };
        if !accepted {
            return Ok(Leg::NotApplicable);
        }

        let request = PayoutRequest {
            amount: item.full_amount,
            currency,
            account_ref: account_ref.to_string(),
            idempotency_key: idempotency::payout(appointment_id, item.attempt),
        };

        match self.payout_network.payout(request).await {
            Ok(payout) => {
                item.payout_id = Some(payout.payout_id);
                item.note = None;
                item.transition(PaymentItemStatus::PayoutSuccess)?;
                Ok(Leg::Done)
            }
            Err(e) => {
                let note = e.to_string();
                warn!(
                    appointment_id = %appointment_id,
                    network = self.payout_network.name(),
                    error = %note,
                    "Payout network payout failed"
                );
                item.transition(PaymentItemStatus::PayoutFailed)?;
                item.attempt += 1;
                item.set_note(&note);
                Ok(Leg::Failed(note))
            }
        }
    }
}

/// Note for an item that has not reached the paid status of `rail`
fn unpaid_note(item: &mut PaymentItem, rail: PayoutRail) -> Option<String> {
    let status = item.status();
    let paid = match rail {
        PayoutRail::CardGateway => matches!(
            status,
            PaymentItemStatus::Transfered | PaymentItemStatus::PayoutSuccess
        ),
        PayoutRail::CardGatewayInstant | PayoutRail::PayoutNetwork => {
            status == PaymentItemStatus::PayoutSuccess
        }
    };
    if paid {
        return None;
    }

    let note = format!(
        "Item {} is {} and cannot be paid out through the {} rail",
        item.position,
        status,
        rail.as_str()
    );
    item.set_note(&note);
    Some(note)
}

fn new_outgoing_payment(
    ctx: &TransferContext,
    customer_type: CustomerType,
    system: PaymentSystem,
    company_id: Option<String>,
) -> Payment {
    let appointment = &ctx.appointment;

    Payment::new(NewPayment {
        platform_id: appointment.platform_id.clone(),
        direction: PaymentDirection::Outcoming,
        currency: appointment.currency,
        customer_type,
        system,
        appointment_id: Some(appointment.id.clone()),
        company_id,
        from_client_id: Some(appointment.client.user_role_id.clone()),
        to_interpreter_id: ctx
            .payee
            .as_ref()
            .map(|payee| payee.party().user_role_id.clone()),
    })
}
