use super::gateway_trait::{
    Authorization, AuthorizeRequest, Capture, CaptureRequest, PaymentGateway, Payout,
    PayoutRequest, Transfer, TransferRequest,
};
use crate::config::GatewayConfig;
use crate::core::{AppError, Currency, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Card gateway REST client
///
/// Amounts travel in integer minor units. Holds are placed with manual
/// capture and captured later for the final price.
pub struct CardGatewayClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ObjectResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    failure_message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl CardGatewayClient {
    /// Create a client with the configured request timeout
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Invalid card gateway client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        idempotency_key: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", idempotency_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::gateway(format!("Card gateway timeout: {}", e))
                } else {
                    AppError::gateway(format!("Card gateway request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::gateway(format!("Failed to read card gateway response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err(AppError::gateway(format!(
                "Card gateway error {}: {}",
                status.as_u16(),
                message
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| AppError::gateway(format!("Failed to parse card gateway response: {}", e)))
    }

    fn minor_units(currency: Currency, amount: rust_decimal::Decimal) -> Result<i64> {
        currency.validate_amount(amount).map_err(AppError::Validation)?;
        currency.to_minor_units(amount).map_err(AppError::Validation)
    }

    fn ensure_not_failed(object: &ObjectResponse, action: &str) -> Result<()> {
        match object.status.as_deref() {
            Some("failed") | Some("canceled") => Err(AppError::gateway(format!(
                "Card gateway {} {} failed: {}",
                action,
                object.id,
                object
                    .failure_message
                    .as_deref()
                    .unwrap_or("no reason given")
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for CardGatewayClient {
    async fn authorize(&self, request: AuthorizeRequest) -> Result<Authorization> {
        #[derive(Serialize)]
        struct Body<'a> {
            amount: i64,
            currency: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            customer: Option<&'a str>,
            payment_method: &'a str,
            capture_method: &'static str,
            confirm: bool,
            description: &'a str,
        }

        let body = Body {
            amount: Self::minor_units(request.currency, request.amount)?,
            currency: request.currency.to_string().to_lowercase(),
            customer: request.customer_ref.as_deref(),
            payment_method: &request.payment_method_ref,
            capture_method: "manual",
            confirm: true,
            description: &request.description,
        };

        let object: ObjectResponse = self
            .post("/v1/authorizations", &request.idempotency_key, &body)
            .await?;
        Self::ensure_not_failed(&object, "authorization")?;

        tracing::debug!(external_id = %object.id, "Card gateway authorization placed");

        Ok(Authorization {
            external_id: object.id,
        })
    }

    async fn capture(&self, request: CaptureRequest) -> Result<Capture> {
        #[derive(Serialize)]
        struct Body {
            amount_to_capture: i64,
        }

        let body = Body {
            amount_to_capture: Self::minor_units(request.currency, request.amount)?,
        };
        let path = format!("/v1/authorizations/{}/capture", request.external_id);

        let object: ObjectResponse = self.post(&path, &request.idempotency_key, &body).await?;
        Self::ensure_not_failed(&object, "capture")?;

        Ok(Capture {
            charge_ref: object.id,
        })
    }

    async fn cancel_authorization(&self, external_id: &str) -> Result<()> {
        let path = format!("/v1/authorizations/{}/cancel", external_id);
        let key = super::idempotency::cancel(external_id);

        let object: ObjectResponse = self
            .post(&path, &key, &serde_json::json!({}))
            .await?;

        match object.status.as_deref() {
            Some("failed") => Err(AppError::gateway(format!(
                "Card gateway cancellation of {} failed: {}",
                external_id,
                object
                    .failure_message
                    .as_deref()
                    .unwrap_or("no reason given")
            ))),
            _ => Ok(()),
        }
    }

    async fn transfer(&self, request: TransferRequest) -> Result<Transfer> {
        #[derive(Serialize)]
        struct Body<'a> {
            amount: i64,
            currency: String,
            destination: &'a str,
            description: &'a str,
        }

        let body = Body {
            amount: Self::minor_units(request.currency, request.amount)?,
            currency: request.currency.to_string().to_lowercase(),
            destination: &request.destination_ref,
            description: &request.description,
        };

        let object: ObjectResponse = self
            .post("/v1/transfers", &request.idempotency_key, &body)
            .await?;
        Self::ensure_not_failed(&object, "transfer")?;

        Ok(Transfer {
            transfer_id: object.id,
        })
    }

    async fn payout(&self, request: PayoutRequest) -> Result<Payout> {
        #[derive(Serialize)]
        struct Body<'a> {
            amount: i64,
            currency: String,
            destination: &'a str,
            method: &'static str,
        }

        let body = Body {
            amount: Self::minor_units(request.currency, request.amount)?,
            currency: request.currency.to_string().to_lowercase(),
            destination: &request.account_ref,
            method: "instant",
        };

        let object: ObjectResponse = self
            .post("/v1/payouts", &request.idempotency_key, &body)
            .await?;
        Self::ensure_not_failed(&object, "payout")?;

        Ok(Payout {
            payout_id: object.id,
        })
    }

    fn name(&self) -> &str {
        "card-gateway"
    }
}
