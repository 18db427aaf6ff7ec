use crate::core::{AppError, Currency, Result};
use std::env;

pub mod database;
pub mod payments;
pub mod server;

pub use database::DatabaseConfig;
pub use payments::{PaymentSettings, QueueSettings};
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub card_gateway: GatewayConfig,
    pub payout_network: GatewayConfig,
    pub collaborators: CollaboratorConfig,
    pub payments: PaymentSettings,
    pub queue: QueueSettings,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Endpoint of the services owning notifications, deposit recharge and receipts
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let timeout_secs = parse_var("GATEWAY_TIMEOUT_SECS", 30)?;

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: match env::var("LOG_FORMAT").as_deref() {
                    Ok("json") => LogFormat::Json,
                    _ => LogFormat::Pretty,
                },
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            card_gateway: GatewayConfig {
                api_key: env::var("CARD_GATEWAY_API_KEY").map_err(|_| {
                    AppError::Configuration("CARD_GATEWAY_API_KEY not set".to_string())
                })?,
                base_url: env::var("CARD_GATEWAY_BASE_URL")
                    .map_err(|_| {
                        AppError::Configuration("CARD_GATEWAY_BASE_URL not set".to_string())
                    })?,
                timeout_secs,
            },
            payout_network: GatewayConfig {
                api_key: env::var("PAYOUT_NETWORK_API_KEY").map_err(|_| {
                    AppError::Configuration("PAYOUT_NETWORK_API_KEY not set".to_string())
                })?,
                base_url: env::var("PAYOUT_NETWORK_BASE_URL").map_err(|_| {
                    AppError::Configuration("PAYOUT_NETWORK_BASE_URL not set".to_string())
                })?,
                timeout_secs,
            },
            collaborators: CollaboratorConfig {
                base_url: env::var("COLLABORATOR_BASE_URL").map_err(|_| {
                    AppError::Configuration("COLLABORATOR_BASE_URL not set".to_string())
                })?,
                timeout_secs,
            },
            payments: PaymentSettings::from_env()?,
            queue: QueueSettings::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.card_gateway.timeout_secs == 0 {
            return Err(AppError::Configuration(
                "Gateway timeout must be greater than 0".to_string(),
            ));
        }

        self.payments.validate()?;
        self.queue.validate()?;

        Ok(())
    }
}

/// Parse an optional environment variable, falling back to `default`
pub(crate) fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        Err(_) => Ok(default),
    }
}

/// Currency used when an appointment projection carries none
pub fn default_currency() -> Result<Currency> {
    parse_var("DEFAULT_CURRENCY", Currency::AUD)
}
