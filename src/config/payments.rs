use super::parse_var;
use crate::core::{AppError, Currency, Result};
use crate::modules::pricing::RateCard;
use rust_decimal::Decimal;
use std::env;

/// Business settings of the payment engine
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// The platform's own root company; never billed as a corporate client
    pub platform_company_id: String,
    /// Client cancellations inside this window keep the authorization for capture
    pub cancellation_notice_hours: i64,
    /// Deposit below this share of the default charge amount triggers auto-recharge
    pub auto_recharge_ratio: Decimal,
    /// Deposit below this share of the default charge amount triggers a warning
    pub low_balance_ratio: Decimal,
    pub gst_rate: Decimal,
    /// Country whose residents are charged GST
    pub gst_country: String,
    pub default_currency: Currency,
    pub rate_card: RateCard,
}

impl PaymentSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            platform_company_id: env::var("PLATFORM_COMPANY_ID").map_err(|_| {
                AppError::Configuration("PLATFORM_COMPANY_ID not set".to_string())
            })?,
            cancellation_notice_hours: parse_var("CANCELLATION_NOTICE_HOURS", 24)?,
            auto_recharge_ratio: parse_var("AUTO_RECHARGE_RATIO", Decimal::new(10, 2))?,
            low_balance_ratio: parse_var("LOW_BALANCE_RATIO", Decimal::new(15, 2))?,
            gst_rate: parse_var("GST_RATE", Decimal::new(10, 2))?,
            gst_country: env::var("GST_COUNTRY").unwrap_or_else(|_| "AU".to_string()),
            default_currency: super::default_currency()?,
            rate_card: RateCard::default(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.cancellation_notice_hours < 0 {
            return Err(AppError::Configuration(
                "Cancellation notice hours cannot be negative".to_string(),
            ));
        }

        if self.auto_recharge_ratio >= self.low_balance_ratio {
            return Err(AppError::Configuration(
                "Auto-recharge ratio must be below the low balance ratio".to_string(),
            ));
        }

        if self.gst_rate < Decimal::ZERO || self.gst_rate > Decimal::ONE {
            return Err(AppError::Configuration(
                "GST rate must be between 0 and 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            platform_company_id: "platform".to_string(),
            cancellation_notice_hours: 24,
            auto_recharge_ratio: Decimal::new(10, 2),
            low_balance_ratio: Decimal::new(15, 2),
            gst_rate: Decimal::new(10, 2),
            gst_country: "AU".to_string(),
            default_currency: Currency::AUD,
            rate_card: RateCard::default(),
        }
    }
}

/// Worker settings of the payments queue
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub concurrency: usize,
    pub capacity: usize,
}

impl QueueSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            concurrency: parse_var("PAYMENTS_QUEUE_CONCURRENCY", 1)?,
            capacity: parse_var("PAYMENTS_QUEUE_CAPACITY", 1024)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 || self.capacity == 0 {
            return Err(AppError::Configuration(
                "Queue concurrency and capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            capacity: 1024,
        }
    }
}
