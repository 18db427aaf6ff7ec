// Strategy resolution for every operation and payer/payee shape

#[path = "../helpers/mod.rs"]
mod helpers;

use appointpay::modules::appointments::PayoutRail;
use appointpay::modules::orchestration::{
    resolve_strategy, AuthorizationContext, AuthorizationKind, CancelContext, CaptureContext,
    OperationContext, Payee, Payer, PaymentStrategy, RecreateContext, TransferContext,
    ValidationOutcome,
};
use appointpay::modules::payments::{
    CustomerType, NewPayment, Payment, PaymentDirection, PaymentSystem,
};
use appointpay::modules::pricing::{
    CommunicationType, PriceBreakdown, PriceCalculator, PriceWindow, PricingInput, RateCard,
    SchedulingType,
};
use helpers::*;
use rust_decimal::Decimal;

fn price() -> PriceBreakdown {
    PriceCalculator::new(RateCard::default(), Decimal::new(10, 2))
        .calculate(&PricingInput {
            scheduling_type: SchedulingType::PreBooked,
            communication_type: CommunicationType::Video,
            window: PriceWindow::Estimated { minutes: 30 },
            client_is_corporate: false,
            client_pays_gst: true,
            interpreter_pays_gst: false,
            discount: None,
        })
        .unwrap()
}

fn payment() -> Payment {
    Payment::new(NewPayment {
        platform_id: "APT-a-1".to_string(),
        direction: PaymentDirection::Incoming,
        currency: appointpay::core::Currency::AUD,
        customer_type: CustomerType::Individual,
        system: PaymentSystem::CardGateway,
        appointment_id: Some("a-1".to_string()),
        company_id: None,
        from_client_id: Some("client-1".to_string()),
        to_interpreter_id: None,
    })
}

fn individual() -> Payer {
    Payer::Individual(individual_client())
}

fn deposit_payer() -> Payer {
    Payer::Corporate {
        party: corporate_client("acme"),
        company: deposit_company("acme", Decimal::from(500)),
    }
}

fn credit_payer() -> Payer {
    Payer::Corporate {
        party: corporate_client("acme"),
        company: credit_company("acme", Decimal::ZERO, Decimal::from(1000)),
    }
}

fn authorization(payer: Payer, wait_list: bool) -> AuthorizationContext {
    let mut appointment = appointment("a-1", payer.party().clone(), None);
    appointment.is_wait_list = wait_list;
    AuthorizationContext {
        appointment,
        payer,
        kind: AuthorizationKind::Main,
        price: price(),
        existing_payment: None,
    }
}

fn failed() -> ValidationOutcome {
    ValidationOutcome::failed("Appointment APT-a-1 is Cancelled and cannot be authorized")
}

#[test]
fn test_authorization_strategies() {
    let passed = ValidationOutcome::passed();
    let cases = [
        (individual(), false, PaymentStrategy::IndividualStripeAuth),
        (deposit_payer(), false, PaymentStrategy::CorporateDepositCharge),
        (credit_payer(), false, PaymentStrategy::CorporatePostPayment),
        (deposit_payer(), true, PaymentStrategy::WaitListRedirect),
        (individual(), true, PaymentStrategy::WaitListRedirect),
    ];

    for (payer, wait_list, expected) in cases {
        let ctx = authorization(payer, wait_list);
        assert_eq!(
            resolve_strategy(OperationContext::Authorize(&ctx), &passed),
            expected
        );
    }
}

#[test]
fn test_validation_failure_wins_over_wait_list() {
    let ctx = authorization(individual(), true);
    assert_eq!(
        resolve_strategy(OperationContext::Authorize(&ctx), &failed()),
        PaymentStrategy::ValidationFailed
    );
}

#[test]
fn test_recreate_strategies() {
    let passed = ValidationOutcome::passed();
    let recreate = |payer: Payer, changed: bool| RecreateContext {
        appointment: appointment("a-2", payer.party().clone(), None),
        old_appointment_id: "a-1".to_string(),
        payer,
        old_payment: Some(payment()),
        price: price(),
        has_price_changed: changed,
    };

    let unchanged = recreate(deposit_payer(), false);
    assert_eq!(
        resolve_strategy(OperationContext::AuthorizationRecreate(&unchanged), &passed),
        PaymentStrategy::ReattachExistingPayment
    );

    let corporate = recreate(deposit_payer(), true);
    assert_eq!(
        resolve_strategy(OperationContext::AuthorizationRecreate(&corporate), &passed),
        PaymentStrategy::CorporateCancelAndReauthorize
    );

    let individual = recreate(individual(), true);
    assert_eq!(
        resolve_strategy(OperationContext::AuthorizationRecreate(&individual), &passed),
        PaymentStrategy::IndividualCancelAndReauthorize
    );
}

#[test]
fn test_cancel_strategies() {
    let passed = ValidationOutcome::passed();
    let cancel = |payer: Payer, restricted: bool| CancelContext {
        appointment: appointment("a-1", payer.party().clone(), None),
        payer,
        payment: payment(),
        is_cancelled_by_client: restricted,
        is_restricted_by_time_limit: restricted,
    };

    let late = cancel(individual(), true);
    assert_eq!(
        resolve_strategy(OperationContext::AuthorizationCancel(&late), &passed),
        PaymentStrategy::AuthorizationCancelNotAllowed
    );
    assert_eq!(
        resolve_strategy(OperationContext::AuthorizationCancel(&late), &failed()),
        PaymentStrategy::ValidationFailed
    );

    let corporate = cancel(credit_payer(), false);
    assert_eq!(
        resolve_strategy(OperationContext::AuthorizationCancel(&corporate), &passed),
        PaymentStrategy::CorporateAuthorizationCancel
    );

    let individual = cancel(individual(), false);
    assert_eq!(
        resolve_strategy(OperationContext::AuthorizationCancel(&individual), &passed),
        PaymentStrategy::IndividualAuthorizationCancel
    );
}

#[test]
fn test_capture_strategies() {
    let passed = ValidationOutcome::passed();
    let capture = |payer: Payer, same_company: bool| CaptureContext {
        appointment: appointment("a-1", payer.party().clone(), None),
        payer,
        payee: None,
        payment: payment(),
        final_price: price(),
        is_same_company: same_company,
        is_second_attempt: false,
    };

    let same = capture(deposit_payer(), true);
    assert_eq!(
        resolve_strategy(OperationContext::Capture(&same), &passed),
        PaymentStrategy::SameCompanyCommission
    );
    assert_eq!(
        resolve_strategy(OperationContext::Capture(&same), &failed()),
        PaymentStrategy::ValidationFailed
    );

    let corporate = capture(deposit_payer(), false);
    assert_eq!(
        resolve_strategy(OperationContext::Capture(&corporate), &passed),
        PaymentStrategy::CorporateCapture
    );

    let individual = capture(individual(), false);
    assert_eq!(
        resolve_strategy(OperationContext::Capture(&individual), &passed),
        PaymentStrategy::IndividualCapture
    );
}

#[test]
fn test_transfer_strategies() {
    let passed = ValidationOutcome::passed();
    let transfer = |payee: Option<Payee>| TransferContext {
        appointment: appointment("a-1", individual_client(), None),
        payee,
        price: price(),
        existing_payment: None,
    };

    let corporate = transfer(Some(Payee::Corporate {
        party: corporate_interpreter("lingua"),
        company_id: "lingua".to_string(),
    }));
    assert_eq!(
        resolve_strategy(OperationContext::Transfer(&corporate), &passed),
        PaymentStrategy::CorporateTransfer
    );

    let individual = transfer(Some(Payee::Individual {
        party: individual_interpreter(PayoutRail::CardGateway),
        payout_account_ref: Some("acct_1".to_string()),
        rail: PayoutRail::CardGateway,
    }));
    assert_eq!(
        resolve_strategy(OperationContext::Transfer(&individual), &passed),
        PaymentStrategy::IndividualTransfer
    );

    let unassigned = transfer(None);
    assert_eq!(
        resolve_strategy(OperationContext::Transfer(&unassigned), &failed()),
        PaymentStrategy::ValidationFailed
    );
}

#[test]
fn test_strategy_names() {
    assert_eq!(
        PaymentStrategy::IndividualStripeAuth.to_string(),
        "INDIVIDUAL_STRIPE_AUTH"
    );
    assert_eq!(
        serde_json::to_string(&PaymentStrategy::SameCompanyCommission).unwrap(),
        "\"SAME_COMPANY_COMMISSION\""
    );
}
