use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::core::error::AppError;
use crate::modules::jobs::models::PaymentJob;
use crate::modules::jobs::services::PaymentQueue;
use crate::modules::orchestration::models::OperationKind;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedResponse {
    pub appointment_id: String,
    pub operation: OperationKind,
    pub status: &'static str,
}

/// Enqueue a payment job
/// POST /api/payment-jobs
pub async fn enqueue_job(
    queue: web::Data<PaymentQueue>,
    request: web::Json<PaymentJob>,
) -> Result<HttpResponse, AppError> {
    let job = request.into_inner();
    let response = EnqueuedResponse {
        appointment_id: job.appointment_id.clone(),
        operation: job.operation,
        status: "queued",
    };

    queue.enqueue(job)?;

    Ok(HttpResponse::Accepted().json(response))
}

/// Configure job routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/payment-jobs").route("", web::post().to(enqueue_job)));
}
