// Authorization cancel: releasing card holds and corporate reservations

#[path = "../helpers/mod.rs"]
mod helpers;

use appointpay::core::{AppError, Currency};
use appointpay::modules::appointments::AppointmentStatus;
use appointpay::modules::payments::{
    CustomerType, NewPayment, Payment, PaymentDirection, PaymentItemStatus, PaymentSystem,
};
use appointpay::PaymentStrategy;
use chrono::{Duration, Utc};
use helpers::*;
use rust_decimal_macros::dec;

async fn authorized_individual() -> TestHarness {
    let harness = TestHarness::new();
    harness
        .appointments
        .insert(appointment("a-1", individual_client(), None));
    assert!(harness.engine.authorize("a-1").await.unwrap().success);
    harness
}

#[tokio::test]
async fn test_individual_cancel_releases_hold() {
    let harness = authorized_individual().await;

    let report = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(report.success);
    assert_eq!(
        report.strategy,
        Some(PaymentStrategy::IndividualAuthorizationCancel)
    );
    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.items[0].status(), PaymentItemStatus::Canceled);
    assert_eq!(payment.total_full_amount(), dec!(0));
    assert_eq!(harness.gateway.keys_of(GatewayOp::Cancel), vec!["auth_1"]);
}

#[tokio::test]
async fn test_repeated_cancel_is_a_no_op() {
    let harness = authorized_individual().await;
    harness.engine.cancel_authorization("a-1", false).await.unwrap();

    let again = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(again.success);
    assert_eq!(harness.gateway.calls_of(GatewayOp::Cancel).len(), 1);
}

#[tokio::test]
async fn test_cancel_after_declined_authorization_has_nothing_to_release() {
    let harness = TestHarness::new();
    harness
        .appointments
        .insert(appointment("a-1", individual_client(), None));
    harness.gateway.fail(GatewayOp::Authorize);
    assert!(!harness.engine.authorize("a-1").await.unwrap().success);

    let report = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(report.success);
    let item = harness.ledger.incoming("a-1").items[0].clone();
    assert_eq!(item.status(), PaymentItemStatus::AuthorizationFailed);
    assert!(item.note.as_deref().unwrap().contains("card declined"));
    assert!(harness.gateway.calls_of(GatewayOp::Cancel).is_empty());
}

#[tokio::test]
async fn test_failed_cancel_can_be_retried() {
    let harness = authorized_individual().await;
    harness.gateway.fail(GatewayOp::Cancel);

    let report = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(!report.success);
    assert!(report.note.as_deref().unwrap().contains("already captured"));
    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.items[0].status(), PaymentItemStatus::CancelFailed);
    assert_eq!(payment.total_full_amount(), dec!(0));

    harness.gateway.recover(GatewayOp::Cancel);
    let retry = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(retry.success);
    assert_eq!(
        harness.ledger.incoming("a-1").items[0].status(),
        PaymentItemStatus::Canceled
    );
    assert_eq!(harness.gateway.calls_of(GatewayOp::Cancel).len(), 2);
}

#[tokio::test]
async fn test_corporate_cancel_refunds_deposit() {
    let harness = TestHarness::new();
    harness
        .ledger
        .insert_company(deposit_company("acme", dec!(500)));
    harness
        .appointments
        .insert(appointment("a-1", corporate_client("acme"), None));
    harness.engine.authorize("a-1").await.unwrap();
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(447.20));

    let report = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(report.success);
    assert_eq!(
        report.strategy,
        Some(PaymentStrategy::CorporateAuthorizationCancel)
    );
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(500.00));
    assert_eq!(
        harness.ledger.incoming("a-1").items[0].status(),
        PaymentItemStatus::Canceled
    );

    // a second cancel must not refund twice
    harness.engine.cancel_authorization("a-1", false).await.unwrap();
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(500.00));
}

#[tokio::test]
async fn test_late_client_cancel_keeps_hold() {
    let harness = authorized_individual().await;
    harness.appointments.update("a-1", |appointment| {
        appointment.scheduled_start_time = Utc::now() + Duration::hours(2);
    });

    let report = harness.engine.cancel_authorization("a-1", true).await.unwrap();

    assert!(report.success);
    assert_eq!(
        report.strategy,
        Some(PaymentStrategy::AuthorizationCancelNotAllowed)
    );
    assert!(report
        .note
        .as_deref()
        .unwrap()
        .starts_with("Cancelled by the client less than 24 hours"));
    assert_eq!(
        harness.ledger.incoming("a-1").items[0].status(),
        PaymentItemStatus::Authorized
    );
    assert!(harness.gateway.calls_of(GatewayOp::Cancel).is_empty());
}

#[tokio::test]
async fn test_early_client_cancel_releases_hold() {
    let harness = authorized_individual().await;

    let report = harness.engine.cancel_authorization("a-1", true).await.unwrap();

    assert!(report.success);
    assert_eq!(
        report.strategy,
        Some(PaymentStrategy::IndividualAuthorizationCancel)
    );
}

#[tokio::test]
async fn test_missing_authorization_reference_fails_item() {
    let harness = TestHarness::new();
    harness
        .appointments
        .insert(appointment("a-1", individual_client(), None));

    let mut payment = Payment::new(NewPayment {
        platform_id: "APT-a-1".to_string(),
        direction: PaymentDirection::Incoming,
        currency: Currency::AUD,
        customer_type: CustomerType::Individual,
        system: PaymentSystem::CardGateway,
        appointment_id: Some("a-1".to_string()),
        company_id: None,
        from_client_id: Some("client-1".to_string()),
        to_interpreter_id: None,
    });
    payment
        .add_item(dec!(48.00), dec!(4.80))
        .transition(PaymentItemStatus::Authorized)
        .unwrap();
    harness.ledger.insert_payment(payment);

    let report = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(!report.success);
    assert!(report
        .note
        .as_deref()
        .unwrap()
        .contains("has no authorization reference"));
    assert_eq!(
        harness.ledger.incoming("a-1").items[0].status(),
        PaymentItemStatus::CancelFailed
    );
    assert!(harness.gateway.calls_of(GatewayOp::Cancel).is_empty());
}

#[tokio::test]
async fn test_completed_appointment_cannot_be_cancelled() {
    let harness = authorized_individual().await;
    harness
        .appointments
        .set_status("a-1", AppointmentStatus::Completed);

    let report = harness.engine.cancel_authorization("a-1", false).await.unwrap();

    assert!(!report.success);
    assert_eq!(report.strategy, Some(PaymentStrategy::ValidationFailed));
    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.items[0].status(), PaymentItemStatus::Authorized);
    assert!(payment.note.as_deref().unwrap().contains("is completed"));
}

#[tokio::test]
async fn test_cancel_without_payment_is_not_found() {
    let harness = TestHarness::new();
    harness
        .appointments
        .insert(appointment("a-1", individual_client(), None));

    let result = harness.engine.cancel_authorization("a-1", false).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
