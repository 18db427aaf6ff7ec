use rust_decimal::Decimal;
use tracing::{info, warn};

use super::record_service::RecordService;
use crate::core::{round_money, Result};
use crate::modules::companies::CompanyLedger;
use crate::modules::payments::models::{Payment, PaymentItemStatus, TotalsBasis};
use crate::modules::payments::repositories::LedgerTransaction;
use crate::modules::pricing::PriceBreakdown;

/// Result of comparing the final price with the authorized main item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalculationOutcome {
    pub changed: bool,
    pub previous_full_amount: Decimal,
    pub full_amount: Decimal,
    /// Set when a price change could not be applied
    pub note: Option<String>,
}

/// Applies the final appointment price to the main payment item
#[derive(Debug, Clone, Default)]
pub struct RecalculationService {
    records: RecordService,
}

impl RecalculationService {
    pub fn new(records: RecordService) -> Self {
        Self { records }
    }

    /// Diff `price` against the main item and adjust item, totals and balance.
    ///
    /// # Business Rules
    /// - Amounts are compared after rounding to cents; an unchanged price only
    ///   refreshes discount attribution
    /// - Only an AUTHORIZED main item is re-priced
    /// - Totals become the sum of AUTHORIZED items
    /// - Corporate balances move by `old - new` in the funding direction
    pub async fn apply(
        &self,
        tx: &mut dyn LedgerTransaction,
        payment: &mut Payment,
        company: Option<&mut CompanyLedger>,
        price: &PriceBreakdown,
    ) -> Result<RecalculationOutcome> {
        let amount = round_money(price.client_amount);
        let gst_amount = round_money(price.client_gst_amount);

        let Some(main) = payment.main_item_mut() else {
            return Ok(RecalculationOutcome {
                changed: false,
                previous_full_amount: Decimal::ZERO,
                full_amount: Decimal::ZERO,
                note: Some("Payment has no items to recalculate".to_string()),
            });
        };

        let previous_full_amount = main.full_amount;

        if round_money(main.amount) == amount && round_money(main.gst_amount) == gst_amount {
            main.discounts = price.applied_discounts.clone();
            self.records.save(tx, payment, None).await?;

            return Ok(RecalculationOutcome {
                changed: false,
                previous_full_amount,
                full_amount: previous_full_amount,
                note: None,
            });
        }

        if main.status() != PaymentItemStatus::Authorized {
            let note = format!(
                "Final price {} differs from {} but main item is {}",
                amount + gst_amount,
                previous_full_amount,
                main.status()
            );
            warn!(payment_id = %payment.id, "{}", note);

            return Ok(RecalculationOutcome {
                changed: false,
                previous_full_amount,
                full_amount: previous_full_amount,
                note: Some(note),
            });
        }

        main.set_amounts(amount, gst_amount);
        main.discounts = price.applied_discounts.clone();
        let full_amount = main.full_amount;

        if let Some(company) = company {
            let delta = previous_full_amount - full_amount;
            if !delta.is_zero() {
                self.records.refund_company(tx, company, delta).await?;
            }
        }

        self.records
            .save(tx, payment, Some(TotalsBasis::Authorized))
            .await?;

        info!(
            payment_id = %payment.id,
            previous = %previous_full_amount,
            full_amount = %full_amount,
            "Main item re-priced"
        );

        Ok(RecalculationOutcome {
            changed: true,
            previous_full_amount,
            full_amount,
            note: None,
        })
    }
}
