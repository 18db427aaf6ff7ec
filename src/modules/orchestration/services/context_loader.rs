use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::config::PaymentSettings;
use crate::core::{round_money, AppError, Result};
use crate::modules::appointments::{
    AppointmentProjection, AppointmentRepository, PartyProjection, PayoutRail,
};
use crate::modules::orchestration::models::{
    AuthorizationContext, AuthorizationKind, CancelContext, CaptureContext, Payee, Payer,
    RecreateContext, TransferContext,
};
use crate::modules::payments::{LedgerTransaction, Payment, PaymentDirection};
use crate::modules::pricing::{PriceBreakdown, PriceCalculator, PriceWindow, PricingInput};

/// Loads the projection each operation needs and derives its routing facts.
///
/// Company rows are read through the operation's transaction with a row lock,
/// so balances cannot move under the executor.
pub struct ContextLoader {
    appointments: Arc<dyn AppointmentRepository>,
    calculator: PriceCalculator,
    settings: Arc<PaymentSettings>,
}

impl ContextLoader {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        calculator: PriceCalculator,
        settings: Arc<PaymentSettings>,
    ) -> Self {
        Self {
            appointments,
            calculator,
            settings,
        }
    }

    pub async fn authorization(
        &self,
        tx: &mut dyn LedgerTransaction,
        appointment_id: &str,
        kind: AuthorizationKind,
    ) -> Result<AuthorizationContext> {
        let appointment = self.appointment(appointment_id).await?;
        let payer = self.payer(tx, &appointment.client).await?;

        let window = match kind {
            AuthorizationKind::Main => PriceWindow::Estimated {
                minutes: appointment.scheduling_duration_min,
            },
            AuthorizationKind::AdditionalBlock { minutes } => {
                PriceWindow::AdditionalBlock { minutes }
            }
        };
        let price = self.price(&appointment, &payer, window)?;

        let existing_payment = tx
            .find_payment_by_appointment(appointment_id, PaymentDirection::Incoming)
            .await?;

        Ok(AuthorizationContext {
            appointment,
            payer,
            kind,
            price,
            existing_payment,
        })
    }

    pub async fn cancellation(
        &self,
        tx: &mut dyn LedgerTransaction,
        appointment_id: &str,
        is_cancelled_by_client: bool,
    ) -> Result<CancelContext> {
        let appointment = self.appointment(appointment_id).await?;
        let payer = self.payer(tx, &appointment.client).await?;
        let payment = self.incoming_payment(tx, appointment_id).await?;

        let notice = Duration::hours(self.settings.cancellation_notice_hours);
        let is_restricted_by_time_limit =
            is_cancelled_by_client && Utc::now() >= appointment.scheduled_start_time - notice;

        Ok(CancelContext {
            appointment,
            payer,
            payment,
            is_cancelled_by_client,
            is_restricted_by_time_limit,
        })
    }

    pub async fn recreate(
        &self,
        tx: &mut dyn LedgerTransaction,
        appointment_id: &str,
        old_appointment_id: &str,
    ) -> Result<RecreateContext> {
        let appointment = self.appointment(appointment_id).await?;
        let payer = self.payer(tx, &appointment.client).await?;
        let price = self.price(
            &appointment,
            &payer,
            PriceWindow::Estimated {
                minutes: appointment.scheduling_duration_min,
            },
        )?;

        let old_payment = tx
            .find_payment_by_appointment(old_appointment_id, PaymentDirection::Incoming)
            .await?;

        let has_price_changed = match &old_payment {
            None => true,
            Some(payment) => {
                round_money(price.client_amount) != round_money(payment.total_amount())
                    || round_money(price.client_gst_amount)
                        != round_money(payment.total_gst_amount())
            }
        };

        Ok(RecreateContext {
            appointment,
            old_appointment_id: old_appointment_id.to_string(),
            payer,
            old_payment,
            price,
            has_price_changed,
        })
    }

    pub async fn capture(
        &self,
        tx: &mut dyn LedgerTransaction,
        appointment_id: &str,
        is_second_attempt: bool,
    ) -> Result<CaptureContext> {
        let appointment = self.appointment(appointment_id).await?;
        let payer = self.payer(tx, &appointment.client).await?;
        let payee = appointment.interpreter.as_ref().map(|party| self.payee(party));
        let payment = self.incoming_payment(tx, appointment_id).await?;
        let final_price = self.price(&appointment, &payer, final_window(&appointment))?;

        let is_same_company = match (payer.company(), appointment.interpreter.as_ref()) {
            (Some(company), Some(interpreter)) => {
                company.id == interpreter.operated_by_company_id
            }
            _ => false,
        };

        Ok(CaptureContext {
            appointment,
            payer,
            payee,
            payment,
            final_price,
            is_same_company,
            is_second_attempt,
        })
    }

    pub async fn transfer(
        &self,
        tx: &mut dyn LedgerTransaction,
        appointment_id: &str,
    ) -> Result<TransferContext> {
        let appointment = self.appointment(appointment_id).await?;
        let payee = appointment.interpreter.as_ref().map(|party| self.payee(party));
        let price = self.calculator.calculate(&self.pricing_input(
            &appointment,
            appointment.client.role.is_corporate_client(),
            final_window(&appointment),
        ))?;

        let existing_payment = tx
            .find_payment_by_appointment(appointment_id, PaymentDirection::Outcoming)
            .await?;

        Ok(TransferContext {
            appointment,
            payee,
            price,
            existing_payment,
        })
    }

    async fn appointment(&self, appointment_id: &str) -> Result<AppointmentProjection> {
        self.appointments
            .find_projection(appointment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Appointment '{}'", appointment_id)))
    }

    async fn incoming_payment(
        &self,
        tx: &mut dyn LedgerTransaction,
        appointment_id: &str,
    ) -> Result<Payment> {
        tx.find_payment_by_appointment(appointment_id, PaymentDirection::Incoming)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Payment of appointment '{}'", appointment_id))
            })
    }

    async fn payer(
        &self,
        tx: &mut dyn LedgerTransaction,
        client: &PartyProjection,
    ) -> Result<Payer> {
        if !client.role.is_corporate_client() {
            return Ok(Payer::Individual(client.clone()));
        }

        let company_id = client.billing_company_id(&self.settings.platform_company_id);
        let company = tx
            .find_company_for_update(company_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Company '{}'", company_id)))?;

        Ok(Payer::Corporate {
            party: client.clone(),
            company,
        })
    }

    fn payee(&self, interpreter: &PartyProjection) -> Payee {
        if interpreter.role.is_corporate_interpreting_provider() {
            Payee::Corporate {
                party: interpreter.clone(),
                company_id: interpreter
                    .billing_company_id(&self.settings.platform_company_id)
                    .to_string(),
            }
        } else {
            Payee::Individual {
                party: interpreter.clone(),
                payout_account_ref: interpreter.payment_info.payout_account_ref.clone(),
                rail: interpreter
                    .payment_info
                    .payout_rail
                    .unwrap_or(PayoutRail::CardGateway),
            }
        }
    }

    fn price(
        &self,
        appointment: &AppointmentProjection,
        payer: &Payer,
        window: PriceWindow,
    ) -> Result<PriceBreakdown> {
        self.calculator
            .calculate(&self.pricing_input(appointment, payer.is_corporate(), window))
    }

    fn pricing_input(
        &self,
        appointment: &AppointmentProjection,
        client_is_corporate: bool,
        window: PriceWindow,
    ) -> PricingInput {
        PricingInput {
            scheduling_type: appointment.scheduling_type,
            communication_type: appointment.communication_type,
            window,
            client_is_corporate,
            client_pays_gst: appointment
                .client
                .country
                .eq_ignore_ascii_case(&self.settings.gst_country),
            interpreter_pays_gst: appointment
                .interpreter
                .as_ref()
                .is_some_and(|interpreter| interpreter.is_gst_payer),
            discount: appointment.discount.clone(),
        }
    }
}

/// Actual business window when both ends are known, else the booked estimate
fn final_window(appointment: &AppointmentProjection) -> PriceWindow {
    match (appointment.business_start_time, appointment.business_end_time) {
        (Some(start), Some(end)) => PriceWindow::Actual { start, end },
        _ => PriceWindow::Estimated {
            minutes: appointment.scheduling_duration_min,
        },
    }
}
