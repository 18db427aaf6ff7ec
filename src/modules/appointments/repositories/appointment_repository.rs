use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::core::{AppError, Currency, Result};
use crate::modules::appointments::models::{
    AppointmentProjection, PartyProjection, PaymentInfo,
};
use crate::modules::pricing::DiscountInput;

/// Read projection and write-back contract of the appointment service
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_projection(&self, appointment_id: &str) -> Result<Option<AppointmentProjection>>;

    /// Cancel an appointment whose payer could not be charged
    async fn cancel_appointment_payment_failed(&self, appointment_id: &str) -> Result<()>;

    async fn update_paid_by_client(
        &self,
        appointment_id: &str,
        amount: Decimal,
        currency: Currency,
    ) -> Result<()>;

    async fn update_received_by_interpreter(
        &self,
        appointment_id: &str,
        amount: Decimal,
        gst_amount: Decimal,
        currency: Currency,
    ) -> Result<()>;
}

/// MySQL reader over the appointment service tables
pub struct MySqlAppointmentRepository {
    pool: MySqlPool,
    default_currency: Currency,
}

impl MySqlAppointmentRepository {
    pub fn new(pool: MySqlPool, default_currency: Currency) -> Self {
        Self {
            pool,
            default_currency,
        }
    }

    async fn find_party(&self, user_role_id: &str) -> Result<Option<PartyProjection>> {
        let row = sqlx::query_as::<_, PartyRow>(
            r#"
            SELECT
                id, role_name, operated_by_company_id, operated_by_main_corporate_company_id,
                country, is_gst_payer, customer_ref, payment_method_ref,
                payout_account_ref, payout_rail
            FROM user_roles
            WHERE id = ?
            "#,
        )
        .bind(user_role_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PartyProjection::try_from).transpose()
    }
}

#[derive(FromRow)]
struct AppointmentRow {
    id: String,
    platform_id: String,
    status: String,
    scheduling_type: String,
    communication_type: String,
    currency: Option<String>,
    scheduled_start_time: DateTime<Utc>,
    scheduling_duration_min: i32,
    business_start_time: Option<DateTime<Utc>>,
    business_end_time: Option<DateTime<Utc>>,
    is_wait_list: bool,
    client_id: String,
    interpreter_id: Option<String>,
    promo_code: Option<String>,
    promo_discount_percent: Option<Decimal>,
    membership_type: Option<String>,
    membership_discount_percent: Option<Decimal>,
    membership_free_minutes: Option<i32>,
    paid_by_client: Option<Decimal>,
}

#[derive(FromRow)]
struct PartyRow {
    id: String,
    role_name: String,
    operated_by_company_id: String,
    operated_by_main_corporate_company_id: Option<String>,
    country: String,
    is_gst_payer: bool,
    customer_ref: Option<String>,
    payment_method_ref: Option<String>,
    payout_account_ref: Option<String>,
    payout_rail: Option<String>,
}

fn corrupt(field: &str, e: String) -> AppError {
    AppError::Internal(format!("Corrupt {} in appointment projection: {}", field, e))
}

impl TryFrom<PartyRow> for PartyProjection {
    type Error = AppError;

    fn try_from(row: PartyRow) -> Result<Self> {
        let payout_rail = row
            .payout_rail
            .map(|rail| rail.parse())
            .transpose()
            .map_err(|e| corrupt("payout_rail", e))?;

        Ok(PartyProjection {
            user_role_id: row.id,
            role: row.role_name.parse().map_err(|e| corrupt("role_name", e))?,
            operated_by_company_id: row.operated_by_company_id,
            operated_by_main_corporate_company_id: row.operated_by_main_corporate_company_id,
            country: row.country,
            is_gst_payer: row.is_gst_payer,
            payment_info: PaymentInfo {
                customer_ref: row.customer_ref,
                payment_method_ref: row.payment_method_ref,
                payout_account_ref: row.payout_account_ref,
                payout_rail,
            },
        })
    }
}

impl AppointmentRow {
    fn discount(&self) -> Option<DiscountInput> {
        let any = self.promo_code.is_some()
            || self.membership_type.is_some()
            || self.membership_free_minutes.is_some();

        any.then(|| DiscountInput {
            promo_code: self.promo_code.clone(),
            promo_percentage: self.promo_discount_percent,
            membership_type: self.membership_type.clone(),
            membership_percentage: self.membership_discount_percent,
            membership_free_minutes: self
                .membership_free_minutes
                .and_then(|m| u32::try_from(m).ok()),
        })
    }
}

#[async_trait]
impl AppointmentRepository for MySqlAppointmentRepository {
    async fn find_projection(&self, appointment_id: &str) -> Result<Option<AppointmentProjection>> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT
                id, platform_id, status, scheduling_type, communication_type, currency,
                scheduled_start_time, scheduling_duration_min, business_start_time,
                business_end_time, is_wait_list, client_id, interpreter_id,
                promo_code, promo_discount_percent, membership_type,
                membership_discount_percent, membership_free_minutes, paid_by_client
            FROM appointments
            WHERE id = ?
            "#,
        )
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let client = self.find_party(&row.client_id).await?.ok_or_else(|| {
            AppError::not_found(format!(
                "Client '{}' of appointment '{}' not found",
                row.client_id, row.id
            ))
        })?;

        let interpreter = match row.interpreter_id.as_deref() {
            Some(id) => Some(self.find_party(id).await?.ok_or_else(|| {
                AppError::not_found(format!(
                    "Interpreter '{}' of appointment '{}' not found",
                    id, row.id
                ))
            })?),
            None => None,
        };

        let currency = match row.currency.as_deref() {
            Some(code) => code.parse().map_err(|e| corrupt("currency", e))?,
            None => self.default_currency,
        };
        let discount = row.discount();

        Ok(Some(AppointmentProjection {
            id: row.id,
            platform_id: row.platform_id,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            scheduling_type: row
                .scheduling_type
                .parse()
                .map_err(|e| corrupt("scheduling_type", e))?,
            communication_type: row
                .communication_type
                .parse()
                .map_err(|e| corrupt("communication_type", e))?,
            currency,
            scheduled_start_time: row.scheduled_start_time,
            scheduling_duration_min: u32::try_from(row.scheduling_duration_min)
                .map_err(|e| corrupt("scheduling_duration_min", e.to_string()))?,
            business_start_time: row.business_start_time,
            business_end_time: row.business_end_time,
            is_wait_list: row.is_wait_list,
            client,
            interpreter,
            discount,
            paid_by_client: row.paid_by_client,
        }))
    }

    async fn cancel_appointment_payment_failed(&self, appointment_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET status = 'cancelled', payment_failed_at = NOW(6), updated_at = NOW(6)
            WHERE id = ?
            "#,
        )
        .bind(appointment_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_paid_by_client(
        &self,
        appointment_id: &str,
        amount: Decimal,
        currency: Currency,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET paid_by_client = ?, paid_by_client_currency = ?, updated_at = NOW(6)
            WHERE id = ?
            "#,
        )
        .bind(amount)
        .bind(currency.to_string())
        .bind(appointment_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_received_by_interpreter(
        &self,
        appointment_id: &str,
        amount: Decimal,
        gst_amount: Decimal,
        currency: Currency,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET received_by_interpreter = ?,
                received_by_interpreter_gst = ?,
                received_by_interpreter_currency = ?,
                updated_at = NOW(6)
            WHERE id = ?
            "#,
        )
        .bind(amount)
        .bind(gst_amount)
        .bind(currency.to_string())
        .bind(appointment_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
