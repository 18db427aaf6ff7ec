// MySQL implementation of the ledger store
//
// Payments and payment items are owned by this service; the company row is
// shared with the company service and only its balance column is written here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use super::ledger_store::{LedgerStore, LedgerTransaction};
use crate::core::{AppError, Result};
use crate::modules::companies::CompanyLedger;
use crate::modules::payments::models::{Payment, PaymentDirection, PaymentItem};
use crate::modules::pricing::AppliedDiscounts;

/// Re-saving a payment rewrites every column the engine may change
const UPSERT_PAYMENT: &str = r#"
    INSERT INTO payments (
        id, platform_id, direction, currency, customer_type, system,
        total_amount, total_gst_amount, total_full_amount,
        company_id, from_client_id, to_interpreter_id, appointment_id,
        note, created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON DUPLICATE KEY UPDATE
        platform_id = VALUES(platform_id),
        total_amount = VALUES(total_amount),
        total_gst_amount = VALUES(total_gst_amount),
        total_full_amount = VALUES(total_full_amount),
        appointment_id = VALUES(appointment_id),
        note = VALUES(note),
        updated_at = VALUES(updated_at)
"#;

/// Ledger store backed by a MySQL pool
#[derive(Clone)]
pub struct MySqlLedgerStore {
    pool: MySqlPool,
}

impl MySqlLedgerStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for MySqlLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;
        Ok(Box::new(MySqlLedgerTransaction { tx }))
    }
}

pub struct MySqlLedgerTransaction {
    tx: Transaction<'static, MySql>,
}

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    platform_id: String,
    direction: String,
    currency: String,
    customer_type: String,
    system: String,
    total_amount: Decimal,
    total_gst_amount: Decimal,
    total_full_amount: Decimal,
    company_id: Option<String>,
    from_client_id: Option<String>,
    to_interpreter_id: Option<String>,
    appointment_id: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PaymentItemRow {
    id: String,
    payment_id: String,
    position: i32,
    amount: Decimal,
    gst_amount: Decimal,
    full_amount: Decimal,
    currency: String,
    status: String,
    attempt: i32,
    external_id: Option<String>,
    transfer_id: Option<String>,
    payout_id: Option<String>,
    receipt: Option<String>,
    note: Option<String>,
    applied_promo_code: Option<String>,
    applied_promo_discount_percent: Option<Decimal>,
    applied_membership_type: Option<String>,
    applied_membership_discount_percent: Option<Decimal>,
    applied_membership_free_minutes: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CompanyRow {
    id: String,
    name: String,
    funding_source: String,
    deposit_amount: Decimal,
    deposit_default_charge_amount: Option<Decimal>,
    credit_limit: Option<Decimal>,
    platform_commission_rate: Decimal,
    super_admin_id: Option<String>,
}

fn corrupt(field: &str, e: String) -> AppError {
    AppError::Internal(format!("Corrupt {} in ledger row: {}", field, e))
}

impl TryFrom<PaymentItemRow> for PaymentItem {
    type Error = AppError;

    fn try_from(row: PaymentItemRow) -> Result<Self> {
        let has_discounts = row.applied_promo_code.is_some()
            || row.applied_membership_type.is_some()
            || row.applied_membership_free_minutes.is_some();
        let discounts = has_discounts.then(|| AppliedDiscounts {
            promo_code: row.applied_promo_code,
            promo_percentage: row.applied_promo_discount_percent,
            membership_type: row.applied_membership_type,
            membership_percentage: row.applied_membership_discount_percent,
            free_minutes_applied: row
                .applied_membership_free_minutes
                .and_then(|m| u32::try_from(m).ok()),
        });

        Ok(PaymentItem {
            id: row.id,
            payment_id: row.payment_id,
            position: u32::try_from(row.position).map_err(|e| corrupt("position", e.to_string()))?,
            amount: row.amount,
            gst_amount: row.gst_amount,
            full_amount: row.full_amount,
            currency: row.currency.parse().map_err(|e| corrupt("currency", e))?,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            attempt: u32::try_from(row.attempt).map_err(|e| corrupt("attempt", e.to_string()))?,
            external_id: row.external_id,
            transfer_id: row.transfer_id,
            payout_id: row.payout_id,
            receipt: row.receipt,
            note: row.note,
            discounts,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PaymentRow {
    fn into_payment(self, items: Vec<PaymentItem>) -> Result<Payment> {
        Ok(Payment {
            id: self.id,
            platform_id: self.platform_id,
            direction: self.direction.parse().map_err(|e| corrupt("direction", e))?,
            currency: self.currency.parse().map_err(|e| corrupt("currency", e))?,
            customer_type: self
                .customer_type
                .parse()
                .map_err(|e| corrupt("customer_type", e))?,
            system: self.system.parse().map_err(|e| corrupt("system", e))?,
            total_amount: self.total_amount,
            total_gst_amount: self.total_gst_amount,
            total_full_amount: self.total_full_amount,
            appointment_id: self.appointment_id,
            company_id: self.company_id,
            from_client_id: self.from_client_id,
            to_interpreter_id: self.to_interpreter_id,
            note: self.note,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl LedgerTransaction for MySqlLedgerTransaction {
    async fn find_payment_by_appointment(
        &mut self,
        appointment_id: &str,
        direction: PaymentDirection,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT
                id, platform_id, direction, currency, customer_type, system,
                total_amount, total_gst_amount, total_full_amount,
                company_id, from_client_id, to_interpreter_id, appointment_id,
                note, created_at, updated_at
            FROM payments
            WHERE appointment_id = ? AND direction = ?
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(appointment_id)
        .bind(direction.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows = sqlx::query_as::<_, PaymentItemRow>(
            r#"
            SELECT
                id, payment_id, position, amount, gst_amount, full_amount,
                currency, status, attempt, external_id, transfer_id, payout_id,
                receipt, note, applied_promo_code, applied_promo_discount_percent,
                applied_membership_type, applied_membership_discount_percent,
                applied_membership_free_minutes, created_at, updated_at
            FROM payment_items
            WHERE payment_id = ?
            ORDER BY position ASC
            FOR UPDATE
            "#,
        )
        .bind(&row.id)
        .fetch_all(&mut *self.tx)
        .await?;

        let items = item_rows
            .into_iter()
            .map(PaymentItem::try_from)
            .collect::<Result<Vec<_>>>()?;

        row.into_payment(items).map(Some)
    }

    async fn find_company_for_update(&mut self, company_id: &str) -> Result<Option<CompanyLedger>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT
                id, name, funding_source, deposit_amount, deposit_default_charge_amount,
                credit_limit, platform_commission_rate, super_admin_id
            FROM companies
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(company_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| {
            Ok(CompanyLedger {
                id: row.id,
                name: row.name,
                funding_source: row
                    .funding_source
                    .parse()
                    .map_err(|e| corrupt("funding_source", e))?,
                deposit_amount: row.deposit_amount,
                deposit_default_charge_amount: row.deposit_default_charge_amount,
                credit_limit: row.credit_limit,
                platform_commission_rate: row.platform_commission_rate,
                super_admin_id: row.super_admin_id,
            })
        })
        .transpose()
    }

    async fn update_company_balance(
        &mut self,
        company_id: &str,
        deposit_amount: Decimal,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET deposit_amount = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(deposit_amount)
        .bind(company_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Company with id '{}' not found",
                company_id
            )));
        }

        Ok(())
    }

    async fn save_payment(&mut self, payment: &Payment) -> Result<()> {
        sqlx::query(UPSERT_PAYMENT)
            .bind(&payment.id)
            .bind(&payment.platform_id)
            .bind(payment.direction.as_str())
            .bind(payment.currency.to_string())
            .bind(payment.customer_type.as_str())
            .bind(payment.system.as_str())
            .bind(payment.total_amount)
            .bind(payment.total_gst_amount)
            .bind(payment.total_full_amount)
            .bind(&payment.company_id)
            .bind(&payment.from_client_id)
            .bind(&payment.to_interpreter_id)
            .bind(&payment.appointment_id)
            .bind(&payment.note)
            .bind(payment.created_at)
            .bind(payment.updated_at)
            .execute(&mut *self.tx)
            .await?;

        for item in &payment.items {
            let discounts = item.discounts.clone().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO payment_items (
                    id, payment_id, position, amount, gst_amount, full_amount,
                    currency, status, attempt, external_id, transfer_id, payout_id,
                    receipt, note, applied_promo_code, applied_promo_discount_percent,
                    applied_membership_type, applied_membership_discount_percent,
                    applied_membership_free_minutes, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    amount = VALUES(amount),
                    gst_amount = VALUES(gst_amount),
                    full_amount = VALUES(full_amount),
                    status = VALUES(status),
                    attempt = VALUES(attempt),
                    external_id = VALUES(external_id),
                    transfer_id = VALUES(transfer_id),
                    payout_id = VALUES(payout_id),
                    receipt = VALUES(receipt),
                    note = VALUES(note),
                    applied_promo_code = VALUES(applied_promo_code),
                    applied_promo_discount_percent = VALUES(applied_promo_discount_percent),
                    applied_membership_type = VALUES(applied_membership_type),
                    applied_membership_discount_percent = VALUES(applied_membership_discount_percent),
                    applied_membership_free_minutes = VALUES(applied_membership_free_minutes),
                    updated_at = VALUES(updated_at)
                "#,
            )
            .bind(&item.id)
            .bind(&item.payment_id)
            .bind(item.position as i32)
            .bind(item.amount)
            .bind(item.gst_amount)
            .bind(item.full_amount)
            .bind(item.currency.to_string())
            .bind(item.status.as_str())
            .bind(item.attempt as i32)
            .bind(&item.external_id)
            .bind(&item.transfer_id)
            .bind(&item.payout_id)
            .bind(&item.receipt)
            .bind(&item.note)
            .bind(discounts.promo_code)
            .bind(discounts.promo_percentage)
            .bind(discounts.membership_type)
            .bind(discounts.membership_percentage)
            .bind(discounts.free_minutes_applied.map(|m| m as i32))
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))
    }
}
