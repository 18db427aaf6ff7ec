use crate::modules::companies::FundingSource;
use crate::modules::orchestration::models::{
    AuthorizationContext, OperationContext, Payer, PaymentStrategy, ValidationOutcome,
};

/// Pick the processing strategy for an operation.
///
/// Pure and exhaustive. Checks run in a fixed priority: validation failure,
/// then wait-list or restriction, then funding-source branching.
pub fn resolve_strategy(
    context: OperationContext<'_>,
    validation: &ValidationOutcome,
) -> PaymentStrategy {
    match context {
        OperationContext::Authorize(ctx) => {
            if !validation.success {
                PaymentStrategy::ValidationFailed
            } else if ctx.appointment.is_wait_list {
                PaymentStrategy::WaitListRedirect
            } else {
                authorization_strategy(ctx)
            }
        }
        OperationContext::AuthorizationRecreate(ctx) => {
            if !ctx.has_price_changed {
                PaymentStrategy::ReattachExistingPayment
            } else if ctx.payer.is_corporate() {
                PaymentStrategy::CorporateCancelAndReauthorize
            } else {
                PaymentStrategy::IndividualCancelAndReauthorize
            }
        }
        OperationContext::AuthorizationCancel(ctx) => {
            if !validation.success {
                PaymentStrategy::ValidationFailed
            } else if ctx.is_restricted_by_time_limit {
                PaymentStrategy::AuthorizationCancelNotAllowed
            } else if ctx.payer.is_corporate() {
                PaymentStrategy::CorporateAuthorizationCancel
            } else {
                PaymentStrategy::IndividualAuthorizationCancel
            }
        }
        OperationContext::Capture(ctx) => {
            if !validation.success {
                PaymentStrategy::ValidationFailed
            } else if ctx.is_same_company {
                PaymentStrategy::SameCompanyCommission
            } else if ctx.payer.is_corporate() {
                PaymentStrategy::CorporateCapture
            } else {
                PaymentStrategy::IndividualCapture
            }
        }
        OperationContext::Transfer(ctx) => {
            if !validation.success {
                PaymentStrategy::ValidationFailed
            } else if ctx.payee.as_ref().is_some_and(|payee| payee.is_corporate()) {
                PaymentStrategy::CorporateTransfer
            } else {
                PaymentStrategy::IndividualTransfer
            }
        }
    }
}

fn authorization_strategy(ctx: &AuthorizationContext) -> PaymentStrategy {
    match &ctx.payer {
        Payer::Corporate { company, .. } => match company.funding_source {
            FundingSource::Deposit => PaymentStrategy::CorporateDepositCharge,
            FundingSource::PostPayment => PaymentStrategy::CorporatePostPayment,
        },
        Payer::Individual(_) => PaymentStrategy::IndividualStripeAuth,
    }
}
