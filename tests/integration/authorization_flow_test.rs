// Authorization: card holds, corporate deposit and credit reservations,
// wait-list redirects and additional blocks

#[path = "../helpers/mod.rs"]
mod helpers;

use appointpay::core::{AppError, Currency};
use appointpay::modules::collaborators::{PaymentNotification, RechargeRequest};
use appointpay::modules::payments::{PaymentItemStatus, PaymentSystem};
use appointpay::PaymentStrategy;
use helpers::*;
use rust_decimal_macros::dec;

fn individual_harness() -> TestHarness {
    let harness = TestHarness::new();
    harness
        .appointments
        .insert(appointment("a-1", individual_client(), None));
    harness
}

fn corporate_harness(company: appointpay::modules::companies::CompanyLedger) -> TestHarness {
    let harness = TestHarness::new();
    let company_id = company.id.clone();
    harness.ledger.insert_company(company);
    harness
        .appointments
        .insert(appointment("a-1", corporate_client(&company_id), None));
    harness
}

#[tokio::test]
async fn test_individual_card_authorization() {
    let harness = individual_harness();

    let report = harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(report.success);
    assert_eq!(report.strategy, Some(PaymentStrategy::IndividualStripeAuth));

    let payment = harness.ledger.incoming("a-1");
    assert_eq!(report.payment_id.as_deref(), Some(payment.id.as_str()));
    assert_eq!(payment.system, PaymentSystem::CardGateway);
    assert_eq!(payment.total_amount(), dec!(48.00));
    assert_eq!(payment.total_gst_amount(), dec!(4.80));
    assert_eq!(payment.total_full_amount(), dec!(52.80));
    assert_eq!(payment.items.len(), 1);
    assert_eq!(payment.items[0].status(), PaymentItemStatus::Authorized);
    assert_eq!(payment.items[0].external_id.as_deref(), Some("auth_1"));

    assert_eq!(harness.gateway.keys_of(GatewayOp::Authorize), vec!["auth-a-1-1"]);
    assert_eq!(
        harness.notifications.sent(),
        vec![PaymentNotification::AuthorizationSucceeded {
            appointment_id: "a-1".to_string(),
            recipient_id: "client-1".to_string(),
            amount: dec!(52.80),
            currency: Currency::AUD,
        }]
    );
}

#[tokio::test]
async fn test_declined_card_is_retried_with_next_attempt_key() {
    let harness = individual_harness();
    harness.gateway.fail(GatewayOp::Authorize);

    let report = harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(!report.success);
    assert!(report.note.as_deref().unwrap().contains("card declined"));
    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.items[0].status(), PaymentItemStatus::AuthorizationFailed);
    assert_eq!(payment.total_full_amount(), dec!(0));
    assert!(matches!(
        harness.notifications.sent().as_slice(),
        [PaymentNotification::AuthorizationFailed { .. }]
    ));

    harness.gateway.recover(GatewayOp::Authorize);
    let retry = harness.engine.authorize("a-1").await.unwrap();

    assert!(retry.success);
    assert_eq!(
        harness.gateway.keys_of(GatewayOp::Authorize),
        vec!["auth-a-1-1", "auth-a-1-2"]
    );
    let payment = harness.ledger.incoming("a-1");
    assert_eq!(harness.ledger.payment_count(), 1);
    assert_eq!(payment.items.len(), 1);
    assert_eq!(payment.items[0].attempt, 2);
    assert_eq!(payment.items[0].status(), PaymentItemStatus::Authorized);
    assert_eq!(payment.items[0].note, None);
    assert_eq!(payment.total_full_amount(), dec!(52.80));
}

#[tokio::test]
async fn test_repeated_authorization_is_a_no_op() {
    let harness = individual_harness();

    harness.engine.authorize("a-1").await.unwrap();
    let again = harness.engine.authorize("a-1").await.unwrap();

    assert!(again.success);
    assert_eq!(again.note.as_deref(), Some("Authorization already in place"));
    assert_eq!(harness.gateway.calls_of(GatewayOp::Authorize).len(), 1);
    assert_eq!(harness.ledger.incoming("a-1").items.len(), 1);
}

#[tokio::test]
async fn test_deposit_charge_reserves_funds() {
    let harness = corporate_harness(deposit_company("acme", dec!(500)));

    let report = harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(report.success);
    assert_eq!(report.strategy, Some(PaymentStrategy::CorporateDepositCharge));
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(447.20));

    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.system, PaymentSystem::Deposit);
    assert_eq!(payment.company_id.as_deref(), Some("acme"));
    assert_eq!(payment.items[0].status(), PaymentItemStatus::Authorized);
    assert_eq!(payment.total_full_amount(), dec!(52.80));

    assert!(harness.gateway.calls().is_empty());
    assert!(harness.notifications.recharges().is_empty());
    assert!(matches!(
        harness.notifications.sent().as_slice(),
        [PaymentNotification::AuthorizationSucceeded { recipient_id, .. }] if recipient_id == "corp-client-1"
    ));
}

#[tokio::test]
async fn test_insufficient_deposit_cancels_appointment() {
    let harness = corporate_harness(deposit_company("acme", dec!(20)));

    let report = harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(!report.success);
    assert!(report
        .note
        .as_deref()
        .unwrap()
        .starts_with("Insufficient deposit balance"));
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(20));
    assert_eq!(
        harness.ledger.incoming("a-1").items[0].status(),
        PaymentItemStatus::AuthorizationFailed
    );
    assert_eq!(
        harness.appointments.calls(),
        vec![AppointmentCall::CancelledPaymentFailed("a-1".to_string())]
    );
    assert_eq!(
        harness.notifications.sent(),
        vec![PaymentNotification::InsufficientFunds {
            appointment_id: "a-1".to_string(),
            company_id: "acme".to_string(),
            recipient_id: Some("admin-1".to_string()),
            balance: dec!(20),
            required: dec!(52.80),
        }]
    );
}

#[tokio::test]
async fn test_deposit_below_recharge_threshold_requests_recharge() {
    let harness = corporate_harness(deposit_company("acme", dec!(150)));

    let report = harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(report.success);
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(97.20));
    assert_eq!(
        harness.notifications.recharges(),
        vec![RechargeRequest {
            company_id: "acme".to_string(),
            amount: dec!(1000),
            currency: Currency::AUD,
        }]
    );
}

#[tokio::test]
async fn test_deposit_below_warning_threshold_warns_admin() {
    let harness = corporate_harness(deposit_company("acme", dec!(200)));

    harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(harness.notifications.recharges().is_empty());
    let warnings: Vec<_> = harness
        .notifications
        .sent()
        .into_iter()
        .filter(|n| matches!(n, PaymentNotification::LowBalance { .. }))
        .collect();
    assert_eq!(
        warnings,
        vec![PaymentNotification::LowBalance {
            company_id: "acme".to_string(),
            recipient_id: Some("admin-1".to_string()),
            balance: dec!(147.20),
            threshold: dec!(150),
        }]
    );
}

#[tokio::test]
async fn test_post_payment_uses_credit_line() {
    let harness = corporate_harness(credit_company("acme", dec!(900), dec!(1000)));

    let report = harness.engine.authorize("a-1").await.unwrap();

    assert!(report.success);
    assert_eq!(report.strategy, Some(PaymentStrategy::CorporatePostPayment));
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(952.80));
    assert_eq!(
        harness.ledger.incoming("a-1").system,
        PaymentSystem::PostPayment
    );
}

#[tokio::test]
async fn test_post_payment_over_limit_fails() {
    let harness = corporate_harness(credit_company("acme", dec!(960), dec!(1000)));

    let report = harness.engine.authorize("a-1").await.unwrap();

    assert!(!report.success);
    assert!(report.note.as_deref().unwrap().starts_with("Credit limit exceeded"));
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(960));
    assert_eq!(
        harness.appointments.calls(),
        vec![AppointmentCall::CancelledPaymentFailed("a-1".to_string())]
    );
}

#[tokio::test]
async fn test_wait_list_appointment_is_redirected() {
    let harness = individual_harness();
    harness
        .appointments
        .update("a-1", |appointment| appointment.is_wait_list = true);

    let report = harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(report.success);
    assert_eq!(report.strategy, Some(PaymentStrategy::WaitListRedirect));
    assert_eq!(report.payment_id, None);
    assert_eq!(harness.ledger.payment_count(), 0);
    assert!(harness.gateway.calls().is_empty());
    assert_eq!(
        harness.notifications.sent(),
        vec![PaymentNotification::WaitListRedirected {
            appointment_id: "a-1".to_string(),
            recipient_id: "client-1".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_missing_payment_method_fails_validation() {
    let harness = individual_harness();
    harness.appointments.update("a-1", |appointment| {
        appointment.client.payment_info.payment_method_ref = None;
    });

    let report = harness.engine.authorize("a-1").await.unwrap();
    settle().await;

    assert!(!report.success);
    assert_eq!(report.strategy, Some(PaymentStrategy::ValidationFailed));
    assert!(report
        .note
        .as_deref()
        .unwrap()
        .contains("no saved payment method"));

    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.items[0].status(), PaymentItemStatus::AuthorizationFailed);
    assert!(harness.gateway.calls().is_empty());
    assert!(matches!(
        harness.notifications.sent().as_slice(),
        [PaymentNotification::AuthorizationFailed { .. }]
    ));
}

#[tokio::test]
async fn test_additional_block_adds_item() {
    let harness = individual_harness();
    harness.engine.authorize("a-1").await.unwrap();

    let report = harness
        .engine
        .authorize_additional_block("a-1", 15)
        .await
        .unwrap();

    assert!(report.success);
    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.items.len(), 2);
    assert_eq!(payment.items[1].full_amount, dec!(26.40));
    assert_eq!(payment.items[1].status(), PaymentItemStatus::Authorized);
    assert_eq!(payment.total_full_amount(), dec!(79.20));
    assert_eq!(
        harness.gateway.keys_of(GatewayOp::Authorize),
        vec!["auth-a-1-1", "auth-a-1-block1-1"]
    );
}

#[tokio::test]
async fn test_additional_block_requires_authorized_main_item() {
    let harness = individual_harness();

    let report = harness
        .engine
        .authorize_additional_block("a-1", 15)
        .await
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.strategy, Some(PaymentStrategy::ValidationFailed));
    assert_eq!(harness.ledger.payment_count(), 0);
    assert!(harness.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_appointment_is_not_found() {
    let harness = TestHarness::new();

    let result = harness.engine.authorize("missing").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(harness.ledger.commits(), 0);
}

#[tokio::test]
async fn test_appointment_is_kept_when_insufficient_funds_are_not_committed() {
    let harness = corporate_harness(deposit_company("acme", dec!(20)));
    harness.ledger.fail_commits(true);

    let result = harness.engine.authorize("a-1").await;
    settle().await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(harness.appointments.calls().is_empty());
    assert!(harness.notifications.sent().is_empty());
    assert_eq!(harness.ledger.payment_count(), 0);
    assert_eq!(harness.ledger.company("acme").deposit_amount, dec!(20));
}

#[tokio::test]
async fn test_insufficient_funds_record_survives_failed_appointment_cancel() {
    let harness = corporate_harness(deposit_company("acme", dec!(20)));
    harness.appointments.fail_writes(true);

    let result = harness.engine.authorize("a-1").await;

    assert!(result.is_err());
    assert_eq!(harness.ledger.commits(), 1);
    assert_eq!(
        harness.ledger.incoming("a-1").items[0].status(),
        PaymentItemStatus::AuthorizationFailed
    );
}
