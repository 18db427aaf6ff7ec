use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::context_loader::ContextLoader;
use super::executors::{
    AuthorizationExecutor, CancellationExecutor, CaptureExecutor, RecreateExecutor,
    TransferExecutor,
};
use super::strategy_resolver::resolve_strategy;
use super::validator::OperationValidator;
use crate::config::PaymentSettings;
use crate::core::{AppError, Result};
use crate::modules::appointments::{AppointmentRepository, AppointmentStatus};
use crate::modules::collaborators::{
    DepositRecharger, NotificationSender, Notifier, ReceiptGenerator,
};
use crate::modules::gateways::{PaymentGateway, PayoutNetwork};
use crate::modules::jobs::{JobHandler, PaymentJob};
use crate::modules::orchestration::models::{
    AuthorizationContext, AuthorizationKind, Execution, OperationContext, OperationKind,
    OperationReport, PaymentStrategy, ValidationOutcome,
};
use crate::modules::payments::{
    LedgerStore, LedgerTransaction, PaymentDirection, RecalculationService, RecordService,
};
use crate::modules::pricing::PriceCalculator;

/// Collaborators the engine is wired with
pub struct EngineDependencies {
    pub ledger: Arc<dyn LedgerStore>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub payout_network: Arc<dyn PayoutNetwork>,
    pub notifications: Arc<dyn NotificationSender>,
    pub recharger: Arc<dyn DepositRecharger>,
    pub receipts: Arc<dyn ReceiptGenerator>,
    pub settings: PaymentSettings,
}

/// Payment orchestration engine
///
/// Every operation runs in one ledger transaction: load context, validate,
/// resolve the strategy, execute, commit, then apply appointment cancellation
/// and dispatch notifications.
/// Business failures are reported in the [`OperationReport`]; `Err` is
/// returned only for missing data and infrastructure faults, in which case
/// the transaction is rolled back.
pub struct PaymentEngine {
    ledger: Arc<dyn LedgerStore>,
    loader: ContextLoader,
    authorization: AuthorizationExecutor,
    cancellation: CancellationExecutor,
    capture: CaptureExecutor,
    transfer: TransferExecutor,
    recreate: RecreateExecutor,
    recalculation: RecalculationService,
    appointments: Arc<dyn AppointmentRepository>,
    notifier: Notifier,
}

impl PaymentEngine {
    pub fn new(deps: EngineDependencies) -> Self {
        let settings = Arc::new(deps.settings);
        let records = RecordService::new();
        let calculator = PriceCalculator::new(settings.rate_card.clone(), settings.gst_rate);

        Self {
            loader: ContextLoader::new(
                Arc::clone(&deps.appointments),
                calculator,
                Arc::clone(&settings),
            ),
            authorization: AuthorizationExecutor::new(
                Arc::clone(&deps.gateway),
                records.clone(),
                Arc::clone(&settings),
            ),
            cancellation: CancellationExecutor::new(
                Arc::clone(&deps.gateway),
                records.clone(),
                settings.cancellation_notice_hours,
            ),
            capture: CaptureExecutor::new(
                Arc::clone(&deps.gateway),
                Arc::clone(&deps.appointments),
                deps.receipts,
                records.clone(),
            ),
            transfer: TransferExecutor::new(
                deps.gateway,
                deps.payout_network,
                Arc::clone(&deps.appointments),
                records.clone(),
            ),
            recreate: RecreateExecutor::new(records.clone()),
            recalculation: RecalculationService::new(records),
            notifier: Notifier::new(deps.notifications, deps.recharger),
            appointments: deps.appointments,
            ledger: deps.ledger,
        }
    }

    /// Place the hold for the booked appointment
    #[tracing::instrument(skip(self))]
    pub async fn authorize(&self, appointment_id: &str) -> Result<OperationReport> {
        self.authorize_kind(appointment_id, AuthorizationKind::Main, OperationKind::Authorize)
            .await
    }

    /// Place an extra hold for an extension of a running appointment
    #[tracing::instrument(skip(self))]
    pub async fn authorize_additional_block(
        &self,
        appointment_id: &str,
        minutes: u32,
    ) -> Result<OperationReport> {
        self.authorize_kind(
            appointment_id,
            AuthorizationKind::AdditionalBlock { minutes },
            OperationKind::AuthorizeAdditionalBlock,
        )
        .await
    }

    /// Carry the authorization of `old_appointment_id` over to a re-created appointment
    #[tracing::instrument(skip(self))]
    pub async fn recreate_authorization(
        &self,
        appointment_id: &str,
        old_appointment_id: &str,
    ) -> Result<OperationReport> {
        let mut tx = self.ledger.begin().await?;
        let mut ctx = self
            .loader
            .recreate(tx.as_mut(), appointment_id, old_appointment_id)
            .await?;

        let strategy = resolve_strategy(
            OperationContext::AuthorizationRecreate(&ctx),
            &ValidationOutcome::passed(),
        );
        log_strategy(appointment_id, OperationKind::AuthorizationRecreate, strategy);

        let execution = match strategy {
            PaymentStrategy::ReattachExistingPayment => {
                self.recreate.reattach(tx.as_mut(), &mut ctx).await?
            }
            PaymentStrategy::CorporateCancelAndReauthorize
            | PaymentStrategy::IndividualCancelAndReauthorize => {
                let mut released = Vec::new();
                if let Some(mut old_payment) = ctx.old_payment.take() {
                    let cancelled = match ctx.payer.company_mut() {
                        Some(company) => {
                            self.cancellation
                                .corporate(tx.as_mut(), &mut old_payment, company)
                                .await?
                        }
                        None => {
                            self.cancellation
                                .individual(tx.as_mut(), &mut old_payment)
                                .await?
                        }
                    };

                    if !cancelled.success {
                        let note = format!(
                            "Previous authorization could not be released: {}",
                            cancelled.note.unwrap_or_default()
                        );
                        let execution = Execution::failed(Some(old_payment.id), note);
                        return self
                            .finish(tx, OperationKind::AuthorizationRecreate, Some(strategy), execution)
                            .await;
                    }
                    released = cancelled.effects;
                }

                let mut auth_ctx = self
                    .loader
                    .authorization(tx.as_mut(), appointment_id, AuthorizationKind::Main)
                    .await?;
                let (auth_strategy, mut execution) =
                    self.run_authorization(tx.as_mut(), &mut auth_ctx).await?;
                debug!(strategy = %auth_strategy, "Re-authorized recreated appointment");

                execution.effects.extend(released);
                execution
            }
            other => return Err(unexpected(other, OperationKind::AuthorizationRecreate)),
        };

        self.finish(tx, OperationKind::AuthorizationRecreate, Some(strategy), execution)
            .await
    }

    /// Release the holds of a cancelled appointment
    #[tracing::instrument(skip(self))]
    pub async fn cancel_authorization(
        &self,
        appointment_id: &str,
        is_cancelled_by_client: bool,
    ) -> Result<OperationReport> {
        let mut tx = self.ledger.begin().await?;
        let mut ctx = self
            .loader
            .cancellation(tx.as_mut(), appointment_id, is_cancelled_by_client)
            .await?;

        let validation = OperationValidator::cancellation(&ctx);
        let strategy = resolve_strategy(OperationContext::AuthorizationCancel(&ctx), &validation);
        log_strategy(appointment_id, OperationKind::AuthorizationCancel, strategy);

        let execution = match strategy {
            PaymentStrategy::ValidationFailed => {
                self.cancellation
                    .validation_failed(tx.as_mut(), &mut ctx.payment, &validation)
                    .await?
            }
            PaymentStrategy::AuthorizationCancelNotAllowed => {
                self.cancellation
                    .not_allowed(tx.as_mut(), &mut ctx.payment)
                    .await?
            }
            PaymentStrategy::CorporateAuthorizationCancel => {
                let company = ctx.payer.company_mut().ok_or_else(|| {
                    AppError::internal("Corporate cancel without a company ledger")
                })?;
                self.cancellation
                    .corporate(tx.as_mut(), &mut ctx.payment, company)
                    .await?
            }
            PaymentStrategy::IndividualAuthorizationCancel => {
                self.cancellation
                    .individual(tx.as_mut(), &mut ctx.payment)
                    .await?
            }
            other => return Err(unexpected(other, OperationKind::AuthorizationCancel)),
        };

        self.finish(tx, OperationKind::AuthorizationCancel, Some(strategy), execution)
            .await
    }

    /// Charge the final price; a completed appointment is recalculated first
    #[tracing::instrument(skip(self))]
    pub async fn capture(
        &self,
        appointment_id: &str,
        is_second_attempt: bool,
    ) -> Result<OperationReport> {
        let mut tx = self.ledger.begin().await?;
        let mut ctx = self
            .loader
            .capture(tx.as_mut(), appointment_id, is_second_attempt)
            .await?;

        let mut recalculation_note = None;
        if ctx.appointment.status == AppointmentStatus::Completed {
            let outcome = self
                .recalculation
                .apply(
                    tx.as_mut(),
                    &mut ctx.payment,
                    ctx.payer.company_mut(),
                    &ctx.final_price,
                )
                .await?;
            recalculation_note = outcome.note;
        }

        let validation = OperationValidator::capture(&ctx);
        let strategy = resolve_strategy(OperationContext::Capture(&ctx), &validation);
        log_strategy(appointment_id, OperationKind::Capture, strategy);

        let execution = match strategy {
            PaymentStrategy::ValidationFailed => {
                self.capture
                    .validation_failed(tx.as_mut(), &mut ctx, &validation)
                    .await?
            }
            PaymentStrategy::SameCompanyCommission => {
                self.capture.same_company(tx.as_mut(), &mut ctx).await?
            }
            PaymentStrategy::CorporateCapture => {
                self.capture.corporate(tx.as_mut(), &mut ctx).await?
            }
            PaymentStrategy::IndividualCapture => {
                self.capture.individual(tx.as_mut(), &mut ctx).await?
            }
            other => return Err(unexpected(other, OperationKind::Capture)),
        };

        let execution = if execution.note.is_none() {
            execution.with_note(recalculation_note)
        } else {
            execution
        };

        self.finish(tx, OperationKind::Capture, Some(strategy), execution)
            .await
    }

    /// Pay the interpreter
    #[tracing::instrument(skip(self))]
    pub async fn transfer(&self, appointment_id: &str) -> Result<OperationReport> {
        let mut tx = self.ledger.begin().await?;
        let mut ctx = self.loader.transfer(tx.as_mut(), appointment_id).await?;

        let validation = OperationValidator::transfer(&ctx);
        let strategy = resolve_strategy(OperationContext::Transfer(&ctx), &validation);
        log_strategy(appointment_id, OperationKind::Transfer, strategy);

        let execution = match strategy {
            PaymentStrategy::ValidationFailed => {
                self.transfer
                    .validation_failed(tx.as_mut(), &mut ctx, &validation)
                    .await?
            }
            PaymentStrategy::CorporateTransfer => {
                self.transfer.corporate(tx.as_mut(), &mut ctx).await?
            }
            PaymentStrategy::IndividualTransfer => {
                self.transfer.individual(tx.as_mut(), &mut ctx).await?
            }
            other => return Err(unexpected(other, OperationKind::Transfer)),
        };

        self.finish(tx, OperationKind::Transfer, Some(strategy), execution)
            .await
    }

    /// Re-price the main item from the actual business window
    #[tracing::instrument(skip(self))]
    pub async fn recalculate(&self, appointment_id: &str) -> Result<OperationReport> {
        let mut tx = self.ledger.begin().await?;
        let mut ctx = self.loader.capture(tx.as_mut(), appointment_id, false).await?;

        let outcome = self
            .recalculation
            .apply(
                tx.as_mut(),
                &mut ctx.payment,
                ctx.payer.company_mut(),
                &ctx.final_price,
            )
            .await?;

        let execution = Execution {
            success: outcome.note.is_none(),
            payment_id: Some(ctx.payment.id.clone()),
            note: outcome.note,
            ..Execution::default()
        };

        self.finish(tx, OperationKind::Recalculate, None, execution)
            .await
    }

    /// Attach receipts to captured items that lack one
    #[tracing::instrument(skip(self))]
    pub async fn generate_receipts(&self, appointment_id: &str) -> Result<OperationReport> {
        let mut tx = self.ledger.begin().await?;
        let mut payment = tx
            .find_payment_by_appointment(appointment_id, PaymentDirection::Incoming)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Payment of appointment '{}'", appointment_id))
            })?;

        let execution = self
            .capture
            .generate_missing_receipts(tx.as_mut(), &mut payment, appointment_id)
            .await?;

        self.finish(tx, OperationKind::GenerateReceipts, None, execution)
            .await
    }

    /// Run a queued job through its entry point
    pub async fn execute(&self, job: PaymentJob) -> Result<OperationReport> {
        job.validate()?;
        let data = &job.additional_data;
        let appointment_id = job.appointment_id.as_str();

        match job.operation {
            OperationKind::Authorize => self.authorize(appointment_id).await,
            OperationKind::AuthorizeAdditionalBlock => {
                let minutes = data.minutes.unwrap_or_default();
                self.authorize_additional_block(appointment_id, minutes)
                    .await
            }
            OperationKind::AuthorizationRecreate => {
                let old_appointment_id = data.old_appointment_id.as_deref().unwrap_or_default();
                self.recreate_authorization(appointment_id, old_appointment_id)
                    .await
            }
            OperationKind::AuthorizationCancel => {
                self.cancel_authorization(
                    appointment_id,
                    data.is_cancelled_by_client.unwrap_or(false),
                )
                .await
            }
            OperationKind::Capture => {
                self.capture(appointment_id, data.is_second_attempt.unwrap_or(false))
                    .await
            }
            OperationKind::Transfer => self.transfer(appointment_id).await,
            OperationKind::Recalculate => self.recalculate(appointment_id).await,
            OperationKind::GenerateReceipts => self.generate_receipts(appointment_id).await,
        }
    }

    async fn authorize_kind(
        &self,
        appointment_id: &str,
        kind: AuthorizationKind,
        operation: OperationKind,
    ) -> Result<OperationReport> {
        let mut tx = self.ledger.begin().await?;
        let mut ctx = self
            .loader
            .authorization(tx.as_mut(), appointment_id, kind)
            .await?;

        let (strategy, execution) = self.run_authorization(tx.as_mut(), &mut ctx).await?;

        self.finish(tx, operation, Some(strategy), execution).await
    }

    async fn run_authorization(
        &self,
        tx: &mut dyn LedgerTransaction,
        ctx: &mut AuthorizationContext,
    ) -> Result<(PaymentStrategy, Execution)> {
        let validation = OperationValidator::authorization(ctx);
        let strategy = resolve_strategy(OperationContext::Authorize(ctx), &validation);
        log_strategy(&ctx.appointment.id, OperationKind::Authorize, strategy);

        let execution = match strategy {
            PaymentStrategy::ValidationFailed => {
                self.authorization
                    .validation_failed(tx, ctx, &validation)
                    .await?
            }
            PaymentStrategy::WaitListRedirect => self.authorization.wait_list_redirect(ctx),
            PaymentStrategy::CorporateDepositCharge | PaymentStrategy::CorporatePostPayment => {
                self.authorization.corporate_charge(tx, ctx).await?
            }
            PaymentStrategy::IndividualStripeAuth => {
                self.authorization.individual_card(tx, ctx).await?
            }
            other => return Err(unexpected(other, OperationKind::Authorize)),
        };

        Ok((strategy, execution))
    }

    /// Commit, then cancel the appointment if asked and hand post-commit
    /// effects to the notifier
    async fn finish(
        &self,
        tx: Box<dyn LedgerTransaction>,
        operation: OperationKind,
        strategy: Option<PaymentStrategy>,
        execution: Execution,
    ) -> Result<OperationReport> {
        tx.commit().await?;

        if let Some(appointment_id) = execution.cancel_appointment.as_deref() {
            self.appointments
                .cancel_appointment_payment_failed(appointment_id)
                .await?;
            info!(appointment_id = %appointment_id, "Appointment cancelled for failed payment");
        }
        self.notifier.dispatch(execution.effects);

        let report = OperationReport {
            operation,
            strategy,
            success: execution.success,
            payment_id: execution.payment_id,
            note: execution.note,
        };

        if report.success {
            info!(
                operation = %operation,
                strategy = ?strategy,
                payment_id = ?report.payment_id,
                "Payment operation succeeded"
            );
        } else {
            warn!(
                operation = %operation,
                strategy = ?strategy,
                payment_id = ?report.payment_id,
                note = ?report.note,
                "Payment operation failed"
            );
        }

        Ok(report)
    }
}

#[async_trait]
impl JobHandler for PaymentEngine {
    async fn handle(&self, job: PaymentJob) -> Result<OperationReport> {
        self.execute(job).await
    }
}

fn log_strategy(appointment_id: &str, operation: OperationKind, strategy: PaymentStrategy) {
    info!(
        appointment_id = %appointment_id,
        operation = %operation,
        strategy = %strategy,
        "Payment strategy resolved"
    );
}

fn unexpected(strategy: PaymentStrategy, operation: OperationKind) -> AppError {
    AppError::internal(format!(
        "Strategy {} is not valid for operation {}",
        strategy, operation
    ))
}
