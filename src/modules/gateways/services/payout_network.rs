use super::gateway_trait::{Payout, PayoutNetwork, PayoutRequest};
use crate::config::GatewayConfig;
use crate::core::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Alternate payout network client
///
/// Unlike the card gateway this network takes decimal amounts as strings.
pub struct PayoutNetworkClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PayoutNetworkClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Invalid payout network client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PayoutNetwork for PayoutNetworkClient {
    async fn payout(&self, request: PayoutRequest) -> Result<Payout> {
        #[derive(Serialize)]
        struct Body<'a> {
            amount: String,
            currency: String,
            recipient: &'a str,
            reference: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            payout_id: String,
            status: String,
            #[serde(default)]
            reason: Option<String>,
        }

        request
            .currency
            .validate_amount(request.amount)
            .map_err(AppError::Validation)?;

        let url = format!("{}/v1/payouts", self.base_url);
        let body = Body {
            amount: request.currency.round(request.amount).to_string(),
            currency: request.currency.to_string(),
            recipient: &request.account_ref,
            reference: &request.idempotency_key,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Payout network request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::gateway(format!(
                "Payout network error {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let payout: Response = response
            .json()
            .await
            .map_err(|e| AppError::gateway(format!("Failed to parse payout network response: {}", e)))?;

        if payout.status == "failed" || payout.status == "rejected" {
            return Err(AppError::gateway(format!(
                "Payout {} {}: {}",
                payout.payout_id,
                payout.status,
                payout.reason.unwrap_or_default()
            )));
        }

        Ok(Payout {
            payout_id: payout.payout_id,
        })
    }

    fn name(&self) -> &str {
        "payout-network"
    }
}
