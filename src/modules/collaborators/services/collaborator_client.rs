use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ports::{DepositRecharger, NotificationSender, ReceiptGenerator};
use crate::config::CollaboratorConfig;
use crate::core::{AppError, Result};
use crate::modules::collaborators::models::{PaymentNotification, RechargeRequest, ReceiptRequest};

/// HTTP client for the notification, company and receipt services
pub struct CollaboratorClient {
    client: Client,
    base_url: String,
}

impl CollaboratorClient {
    pub fn new(config: &CollaboratorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Invalid collaborator client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "Collaborator {} responded {}: {}",
                path,
                status.as_u16(),
                error_body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl NotificationSender for CollaboratorClient {
    async fn send(&self, notification: PaymentNotification) -> Result<()> {
        self.post("/internal/notifications/payments", &notification)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl DepositRecharger for CollaboratorClient {
    async fn request_recharge(&self, request: RechargeRequest) -> Result<()> {
        let path = format!("/internal/companies/{}/deposit-recharge", request.company_id);
        self.post(&path, &request).await.map(|_| ())
    }
}

#[async_trait]
impl ReceiptGenerator for CollaboratorClient {
    async fn generate(&self, request: ReceiptRequest) -> Result<String> {
        #[derive(Deserialize)]
        struct Response {
            receipt: String,
        }

        let response: Response = self
            .post("/internal/receipts", &request)
            .await?
            .json()
            .await?;

        Ok(response.receipt)
    }
}
