use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};

use crate::core::{AppError, Result};
use crate::modules::jobs::models::PaymentJob;
use crate::modules::orchestration::models::OperationReport;

/// Runs one dequeued job
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: PaymentJob) -> Result<OperationReport>;
}

/// Producer side of the bounded payments queue
#[derive(Clone)]
pub struct PaymentQueue {
    sender: mpsc::Sender<PaymentJob>,
}

/// Consumer side; owned by exactly one worker
pub struct QueueReceiver {
    receiver: mpsc::Receiver<PaymentJob>,
}

impl PaymentQueue {
    pub fn new(capacity: usize) -> (Self, QueueReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, QueueReceiver { receiver })
    }

    /// Whether the worker still holds the receiving end
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Validate and enqueue without waiting for room
    pub fn enqueue(&self, job: PaymentJob) -> Result<()> {
        job.validate()?;

        let appointment_id = job.appointment_id.clone();
        let operation = job.operation;

        self.sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => AppError::conflict("Payments queue is full"),
            TrySendError::Closed(_) => AppError::internal("Payments queue is closed"),
        })?;

        info!(
            appointment_id = %appointment_id,
            operation = %operation,
            "Payment job enqueued"
        );

        Ok(())
    }
}

impl QueueReceiver {
    /// Process jobs until every producer is dropped.
    ///
    /// At most `concurrency` jobs run at once; the payments queue runs at 1
    /// so balance reads and writes of one company never interleave.
    pub async fn run(self, handler: Arc<dyn JobHandler>, concurrency: usize) {
        info!(concurrency, "Payments worker started");

        let jobs = stream::unfold(self.receiver, |mut receiver| async move {
            receiver.recv().await.map(|job| (job, receiver))
        });

        jobs.for_each_concurrent(concurrency.max(1), |job| {
            let handler = Arc::clone(&handler);
            async move { process(handler.as_ref(), job).await }
        })
        .await;

        info!("Payments queue closed, worker exiting");
    }
}

async fn process(handler: &dyn JobHandler, job: PaymentJob) {
    let appointment_id = job.appointment_id.clone();
    let operation = job.operation;
    let start = Instant::now();

    match handler.handle(job).await {
        Ok(report) if report.success => info!(
            appointment_id = %appointment_id,
            operation = %operation,
            duration_ms = start.elapsed().as_millis() as u64,
            "Payment job completed"
        ),
        Ok(report) => warn!(
            appointment_id = %appointment_id,
            operation = %operation,
            note = ?report.note,
            duration_ms = start.elapsed().as_millis() as u64,
            "Payment job finished with a business failure"
        ),
        Err(e) => error!(
            appointment_id = %appointment_id,
            operation = %operation,
            transient = e.is_transient(),
            error = %e,
            "Payment job failed"
        ),
    }
}
