use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::PaymentSettings;
use crate::core::{round_money, AppError, Currency, Result};
use crate::modules::collaborators::{PaymentNotification, RechargeRequest, SideEffect};
use crate::modules::companies::{CompanyLedger, FundingSource};
use crate::modules::gateways::{idempotency, AuthorizeRequest, PaymentGateway};
use crate::modules::orchestration::models::{
    AuthorizationContext, AuthorizationKind, Execution, ValidationOutcome,
};
use crate::modules::payments::{
    LedgerTransaction, NewPayment, Payment, PaymentDirection, PaymentItemStatus, RecordService,
    TotalsBasis,
};

/// Item an authorization attempt works on
enum Staged {
    /// The hold is already in place; nothing to do
    AlreadyAuthorized(Payment),
    Pending { payment: Payment, index: usize },
}

/// Places holds: card gateway, corporate deposit or corporate credit line
pub struct AuthorizationExecutor {
    gateway: Arc<dyn PaymentGateway>,
    records: RecordService,
    settings: Arc<PaymentSettings>,
}

impl AuthorizationExecutor {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        records: RecordService,
        settings: Arc<PaymentSettings>,
    ) -> Self {
        Self {
            gateway,
            records,
            settings,
        }
    }

    /// Record the failed precondition as an AUTHORIZATION_FAILED item
    pub async fn validation_failed(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut AuthorizationContext,
        validation: &ValidationOutcome,
    ) -> Result<Execution> {
        let message = validation.message_or_default().to_string();

        let payment_id = match ctx.kind {
            AuthorizationKind::Main => match self.stage(ctx) {
                Staged::Pending { mut payment, index } => {
                    let item = &mut payment.items[index];
                    item.transition(PaymentItemStatus::AuthorizationFailed)?;
                    item.set_note(&message);
                    payment.set_note(&message);
                    self.records
                        .save(tx, &mut payment, Some(TotalsBasis::Authorized))
                        .await?;
                    Some(payment.id)
                }
                Staged::AlreadyAuthorized(mut payment) => {
                    payment.set_note(&message);
                    self.records.save(tx, &mut payment, None).await?;
                    Some(payment.id)
                }
            },
            AuthorizationKind::AdditionalBlock { .. } => match ctx.existing_payment.take() {
                Some(mut payment) => {
                    payment.set_note(&message);
                    self.records.save(tx, &mut payment, None).await?;
                    Some(payment.id)
                }
                None => None,
            },
        };

        warn!(
            appointment_id = %ctx.appointment.id,
            reason = %message,
            "Authorization rejected by validation"
        );

        let notification = PaymentNotification::AuthorizationFailed {
            appointment_id: ctx.appointment.id.clone(),
            recipient_id: ctx.payer.party().user_role_id.clone(),
            reason: message.clone(),
        };

        Ok(Execution::failed(payment_id, message).with_effect(SideEffect::Notify(notification)))
    }

    /// No interpreter capacity: nothing is held, the client is told about the wait list
    pub fn wait_list_redirect(&self, ctx: &AuthorizationContext) -> Execution {
        info!(appointment_id = %ctx.appointment.id, "Appointment redirected to wait list");

        Execution::succeeded(None)
            .with_note(Some("Appointment redirected to the wait list".to_string()))
            .with_effect(SideEffect::Notify(PaymentNotification::WaitListRedirected {
                appointment_id: ctx.appointment.id.clone(),
                recipient_id: ctx.payer.party().user_role_id.clone(),
            }))
    }

    /// Hold the price on the client's saved card
    pub async fn individual_card(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut AuthorizationContext,
    ) -> Result<Execution> {
        let (mut payment, index) = match self.stage(ctx) {
            Staged::AlreadyAuthorized(payment) => return Ok(already_authorized(payment)),
            Staged::Pending { payment, index } => (payment, index),
        };

        let party = ctx.payer.party();
        let item = &payment.items[index];
        let key = authorization_key(&ctx.appointment.id, ctx.kind, item.position, item.attempt);
        let amount = item.full_amount;

        let outcome = if amount.is_zero() {
            Ok(None)
        } else {
            let payment_method_ref = party
                .payment_info
                .payment_method_ref
                .clone()
                .unwrap_or_default();
            self.gateway
                .authorize(AuthorizeRequest {
                    amount,
                    currency: payment.currency,
                    customer_ref: party.payment_info.customer_ref.clone(),
                    payment_method_ref,
                    description: format!("Appointment {}", ctx.appointment.platform_id),
                    idempotency_key: key.clone(),
                })
                .await
                .map(Some)
        };

        let item = &mut payment.items[index];
        let execution = match outcome {
            Ok(authorization) => {
                item.external_id = authorization.map(|a| a.external_id);
                item.note = None;
                item.transition(PaymentItemStatus::Authorized)?;

                info!(
                    appointment_id = %ctx.appointment.id,
                    payment_id = %payment.id,
                    amount = %amount,
                    idempotency_key = %key,
                    "Card authorization placed"
                );

                Execution::succeeded(Some(payment.id.clone())).with_effect(SideEffect::Notify(
                    PaymentNotification::AuthorizationSucceeded {
                        appointment_id: ctx.appointment.id.clone(),
                        recipient_id: party.user_role_id.clone(),
                        amount,
                        currency: payment.currency,
                    },
                ))
            }
            Err(e) => {
                let reason = e.to_string();
                item.transition(PaymentItemStatus::AuthorizationFailed)?;
                item.set_note(&reason);

                warn!(
                    appointment_id = %ctx.appointment.id,
                    payment_id = %payment.id,
                    idempotency_key = %key,
                    error = %reason,
                    "Card authorization failed"
                );

                Execution::failed(Some(payment.id.clone()), reason.clone()).with_effect(
                    SideEffect::Notify(PaymentNotification::AuthorizationFailed {
                        appointment_id: ctx.appointment.id.clone(),
                        recipient_id: party.user_role_id.clone(),
                        reason,
                    }),
                )
            }
        };

        self.records
            .save(tx, &mut payment, Some(TotalsBasis::Authorized))
            .await?;

        Ok(execution)
    }

    /// Draw the price from a deposit or credit line.
    ///
    /// The ledger write is the authorization itself. When funds are short the
    /// balance is left untouched and the appointment is cancelled after commit.
    pub async fn corporate_charge(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut AuthorizationContext,
    ) -> Result<Execution> {
        let (mut payment, index) = match self.stage(ctx) {
            Staged::AlreadyAuthorized(payment) => return Ok(already_authorized(payment)),
            Staged::Pending { payment, index } => (payment, index),
        };

        let appointment_id = ctx.appointment.id.clone();
        let client_id = ctx.payer.party().user_role_id.clone();
        let currency = payment.currency;
        let amount = payment.items[index].full_amount;

        let company = ctx
            .payer
            .company_mut()
            .ok_or_else(|| AppError::internal("Corporate charge without a company ledger"))?;

        if let Some(reason) = shortfall(company, amount) {
            let item = &mut payment.items[index];
            item.transition(PaymentItemStatus::AuthorizationFailed)?;
            item.set_note(&reason);
            payment.set_note(&reason);
            self.records
                .save(tx, &mut payment, Some(TotalsBasis::Authorized))
                .await?;

            warn!(
                appointment_id = %appointment_id,
                company_id = %company.id,
                balance = %company.deposit_amount,
                required = %amount,
                "Corporate funds insufficient, appointment cancelled"
            );

            let notification = PaymentNotification::InsufficientFunds {
                appointment_id: appointment_id.clone(),
                company_id: company.id.clone(),
                recipient_id: company.super_admin_id.clone(),
                balance: company.deposit_amount,
                required: amount,
            };

            return Ok(Execution::failed(Some(payment.id), reason)
                .cancelling_appointment(appointment_id)
                .with_effect(SideEffect::Notify(notification)));
        }

        let balance = self.records.charge_company(tx, company, amount).await?;

        let item = &mut payment.items[index];
        item.note = None;
        item.transition(PaymentItemStatus::Authorized)?;
        self.records
            .save(tx, &mut payment, Some(TotalsBasis::Authorized))
            .await?;

        info!(
            appointment_id = %appointment_id,
            payment_id = %payment.id,
            company_id = %company.id,
            amount = %amount,
            balance = %balance,
            "Corporate funds reserved"
        );

        let mut execution = Execution::succeeded(Some(payment.id.clone())).with_effect(
            SideEffect::Notify(PaymentNotification::AuthorizationSucceeded {
                appointment_id,
                recipient_id: client_id,
                amount,
                currency,
            }),
        );
        if let Some(effect) = self.balance_effect(company, currency) {
            execution = execution.with_effect(effect);
        }

        Ok(execution)
    }

    /// Auto-recharge below the recharge ratio, warning below the low-balance ratio
    fn balance_effect(&self, company: &CompanyLedger, currency: Currency) -> Option<SideEffect> {
        if company.funding_source != FundingSource::Deposit {
            return None;
        }

        let default_charge = company
            .deposit_default_charge_amount
            .filter(|amount| *amount > Decimal::ZERO)?;
        let recharge_threshold = round_money(default_charge * self.settings.auto_recharge_ratio);
        let warning_threshold = round_money(default_charge * self.settings.low_balance_ratio);

        if company.deposit_amount < recharge_threshold {
            Some(SideEffect::Recharge(RechargeRequest {
                company_id: company.id.clone(),
                amount: default_charge,
                currency,
            }))
        } else if company.deposit_amount < warning_threshold {
            Some(SideEffect::Notify(PaymentNotification::LowBalance {
                company_id: company.id.clone(),
                recipient_id: company.super_admin_id.clone(),
                balance: company.deposit_amount,
                threshold: warning_threshold,
            }))
        } else {
            None
        }
    }

    /// Pick the item to authorize, reusing a failed attempt when there is one
    fn stage(&self, ctx: &mut AuthorizationContext) -> Staged {
        let mut payment = match ctx.existing_payment.take() {
            Some(payment) => payment,
            None => new_incoming_payment(ctx),
        };
        let amount = ctx.price.client_amount;
        let gst_amount = ctx.price.client_gst_amount;

        let retry_index = match ctx.kind {
            AuthorizationKind::Main => match payment.main_item().map(|main| main.status()) {
                Some(status) if is_retryable(status) => Some(0),
                Some(_) => return Staged::AlreadyAuthorized(payment),
                None => None,
            },
            AuthorizationKind::AdditionalBlock { .. } => payment
                .items
                .last()
                .filter(|item| !item.is_main() && is_retryable(item.status()))
                .map(|item| item.position as usize),
        };

        let index = match retry_index {
            Some(index) => {
                let item = &mut payment.items[index];
                if item.status() == PaymentItemStatus::AuthorizationFailed {
                    item.attempt += 1;
                }
                item.set_amounts(amount, gst_amount);
                index
            }
            None => {
                payment.add_item(amount, gst_amount);
                payment.items.len() - 1
            }
        };

        if index == 0 {
            payment.items[0].discounts = ctx.price.applied_discounts.clone();
        }

        Staged::Pending { payment, index }
    }
}

fn is_retryable(status: PaymentItemStatus) -> bool {
    matches!(
        status,
        PaymentItemStatus::Created | PaymentItemStatus::AuthorizationFailed
    )
}

fn authorization_key(appointment_id: &str, kind: AuthorizationKind, position: u32, attempt: u32) -> String {
    match kind {
        AuthorizationKind::Main => idempotency::authorization(appointment_id, attempt),
        AuthorizationKind::AdditionalBlock { .. } => {
            idempotency::additional_block(appointment_id, position, attempt)
        }
    }
}

fn already_authorized(payment: Payment) -> Execution {
    Execution::succeeded(Some(payment.id))
        .with_note(Some("Authorization already in place".to_string()))
}

/// Reason the company cannot cover `amount`, if any
fn shortfall(company: &CompanyLedger, amount: Decimal) -> Option<String> {
    let after = company.balance_after_charge(amount);

    match company.funding_source {
        FundingSource::Deposit if after < Decimal::ZERO => Some(format!(
            "Insufficient deposit balance: {} available, {} required",
            company.deposit_amount, amount
        )),
        FundingSource::PostPayment => {
            let limit = company.credit_limit.unwrap_or(Decimal::ZERO);
            (after > limit).then(|| {
                format!(
                    "Credit limit exceeded: {} used of {}, {} required",
                    company.deposit_amount, limit, amount
                )
            })
        }
        FundingSource::Deposit => None,
    }
}

fn new_incoming_payment(ctx: &AuthorizationContext) -> Payment {
    let appointment = &ctx.appointment;

    Payment::new(NewPayment {
        platform_id: appointment.platform_id.clone(),
        direction: PaymentDirection::Incoming,
        currency: appointment.currency,
        customer_type: ctx.payer.customer_type(),
        system: ctx.payer.payment_system(),
        appointment_id: Some(appointment.id.clone()),
        company_id: ctx.payer.company().map(|company| company.id.clone()),
        from_client_id: Some(ctx.payer.party().user_role_id.clone()),
        to_interpreter_id: appointment
            .interpreter
            .as_ref()
            .map(|interpreter| interpreter.user_role_id.clone()),
    })
}
