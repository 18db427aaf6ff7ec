use crate::modules::appointments::AppointmentStatus;
use crate::modules::orchestration::models::{
    AuthorizationContext, AuthorizationKind, CancelContext, CaptureContext, Payee, Payer,
    TransferContext, ValidationOutcome,
};
use crate::modules::payments::PaymentItemStatus;

/// Upstream checks run before strategy resolution
pub struct OperationValidator;

impl OperationValidator {
    pub fn authorization(ctx: &AuthorizationContext) -> ValidationOutcome {
        let appointment = &ctx.appointment;

        if appointment.status.is_terminal() {
            return ValidationOutcome::failed(format!(
                "Appointment {} is {:?} and cannot be authorized",
                appointment.platform_id, appointment.status
            ));
        }

        if let Payer::Individual(party) = &ctx.payer {
            let has_method = party
                .payment_info
                .payment_method_ref
                .as_deref()
                .is_some_and(|method| !method.trim().is_empty());
            if !has_method {
                return ValidationOutcome::failed(format!(
                    "Client {} has no saved payment method",
                    party.user_role_id
                ));
            }
        }

        if let AuthorizationKind::AdditionalBlock { .. } = ctx.kind {
            let main_authorized = ctx
                .existing_payment
                .as_ref()
                .and_then(|payment| payment.main_item())
                .is_some_and(|main| main.status() == PaymentItemStatus::Authorized);
            if !main_authorized {
                return ValidationOutcome::failed(format!(
                    "Appointment {} has no authorized main payment to extend",
                    appointment.platform_id
                ));
            }
        }

        ValidationOutcome::passed()
    }

    pub fn cancellation(ctx: &CancelContext) -> ValidationOutcome {
        if ctx.appointment.status == AppointmentStatus::Completed {
            return ValidationOutcome::failed(format!(
                "Appointment {} is completed; its authorization cannot be cancelled",
                ctx.appointment.platform_id
            ));
        }

        ValidationOutcome::passed()
    }

    pub fn capture(ctx: &CaptureContext) -> ValidationOutcome {
        if !is_billable(ctx.appointment.status) {
            return ValidationOutcome::failed(format!(
                "Appointment {} is {:?} and cannot be captured",
                ctx.appointment.platform_id, ctx.appointment.status
            ));
        }

        ValidationOutcome::passed()
    }

    pub fn transfer(ctx: &TransferContext) -> ValidationOutcome {
        if !is_billable(ctx.appointment.status) {
            return ValidationOutcome::failed(format!(
                "Appointment {} is {:?}; interpreter cannot be paid yet",
                ctx.appointment.platform_id, ctx.appointment.status
            ));
        }

        match &ctx.payee {
            None => ValidationOutcome::failed(format!(
                "Appointment {} has no interpreter assigned",
                ctx.appointment.platform_id
            )),
            Some(Payee::Individual {
                party,
                payout_account_ref,
                ..
            }) if payout_account_ref
                .as_deref()
                .map_or(true, |account| account.trim().is_empty()) =>
            {
                ValidationOutcome::failed(format!(
                    "Interpreter {} has no payout account",
                    party.user_role_id
                ))
            }
            Some(_) => ValidationOutcome::passed(),
        }
    }
}

fn is_billable(status: AppointmentStatus) -> bool {
    matches!(
        status,
        AppointmentStatus::Completed | AppointmentStatus::CancelledOrdered
    )
}
