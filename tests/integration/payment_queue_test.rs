// Payments queue: bounded enqueue, in-order processing and job dispatch

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::{Arc, Mutex};

use appointpay::core::{AppError, Result};
use appointpay::modules::jobs::{AdditionalData, JobHandler, PaymentJob, PaymentQueue};
use appointpay::modules::payments::PaymentItemStatus;
use appointpay::{OperationKind, OperationReport};
use async_trait::async_trait;
use helpers::*;

#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl JobHandler for RecordingHandler {
    async fn handle(&self, job: PaymentJob) -> Result<OperationReport> {
        self.seen.lock().unwrap().push(job.appointment_id.clone());
        Ok(OperationReport {
            operation: job.operation,
            strategy: None,
            success: true,
            payment_id: None,
            note: None,
        })
    }
}

#[tokio::test]
async fn test_invalid_job_is_rejected() {
    let (queue, _receiver) = PaymentQueue::new(8);

    let result = queue.enqueue(PaymentJob::new("a-1", OperationKind::AuthorizationRecreate));

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_full_queue_is_a_conflict() {
    let (queue, _receiver) = PaymentQueue::new(1);

    queue
        .enqueue(PaymentJob::new("a-1", OperationKind::Authorize))
        .unwrap();
    let result = queue.enqueue(PaymentJob::new("a-2", OperationKind::Authorize));

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_closed_queue_is_reported() {
    let (queue, receiver) = PaymentQueue::new(8);
    assert!(queue.is_open());
    drop(receiver);

    let result = queue.enqueue(PaymentJob::new("a-1", OperationKind::Capture));

    assert!(!queue.is_open());
    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn test_jobs_are_processed_in_order() {
    let (queue, receiver) = PaymentQueue::new(8);
    for id in ["a-1", "a-2", "a-3"] {
        queue
            .enqueue(PaymentJob::new(id, OperationKind::Transfer))
            .unwrap();
    }
    drop(queue);

    let handler = Arc::new(RecordingHandler::default());
    receiver.run(handler.clone(), 1).await;

    assert_eq!(*handler.seen.lock().unwrap(), vec!["a-1", "a-2", "a-3"]);
}

#[tokio::test]
async fn test_worker_runs_engine_jobs() {
    let harness = TestHarness::new();
    harness
        .appointments
        .insert(appointment("a-1", individual_client(), None));

    let (queue, receiver) = PaymentQueue::new(8);
    queue
        .enqueue(PaymentJob::new("a-1", OperationKind::Authorize))
        .unwrap();
    queue
        .enqueue(
            PaymentJob::new("a-1", OperationKind::AuthorizationCancel).with_data(AdditionalData {
                is_cancelled_by_client: Some(true),
                ..AdditionalData::default()
            }),
        )
        .unwrap();
    // an unknown appointment fails without stopping the worker
    queue
        .enqueue(PaymentJob::new("missing", OperationKind::Capture))
        .unwrap();
    drop(queue);

    let handler: Arc<dyn JobHandler> = harness.engine.clone();
    receiver.run(handler, 1).await;

    let payment = harness.ledger.incoming("a-1");
    assert_eq!(payment.items[0].status(), PaymentItemStatus::Canceled);
    assert_eq!(harness.gateway.calls().len(), 2);
}

#[tokio::test]
async fn test_execute_checks_job_arguments() {
    let harness = TestHarness::new();

    let result = harness
        .engine
        .execute(PaymentJob::new("a-1", OperationKind::AuthorizeAdditionalBlock))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_execute_dispatches_additional_block() {
    let harness = TestHarness::new();
    harness
        .appointments
        .insert(appointment("a-1", individual_client(), None));
    harness.engine.authorize("a-1").await.unwrap();

    let report = harness
        .engine
        .execute(
            PaymentJob::new("a-1", OperationKind::AuthorizeAdditionalBlock).with_data(
                AdditionalData {
                    minutes: Some(15),
                    ..AdditionalData::default()
                },
            ),
        )
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.operation, OperationKind::AuthorizeAdditionalBlock);
    assert_eq!(harness.ledger.incoming("a-1").items.len(), 2);
}
