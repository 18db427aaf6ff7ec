use rust_decimal::Decimal;

use crate::core::{round_money, AppError, Result};
use crate::modules::pricing::models::{
    AppliedDiscounts, DiscountInput, PriceBreakdown, PricingInput, RateCard,
};

/// Computes appointment prices from timing, channel and party context.
///
/// Pure: the same input always yields the same cent-level breakdown.
#[derive(Debug, Clone)]
pub struct PriceCalculator {
    rate_card: RateCard,
    gst_rate: Decimal,
}

impl PriceCalculator {
    pub fn new(rate_card: RateCard, gst_rate: Decimal) -> Self {
        Self {
            rate_card,
            gst_rate,
        }
    }

    /// Calculate the client and interpreter amounts for one price window
    ///
    /// # Business Rules
    /// - Billable minutes are rounded up to the billing increment and never fall
    ///   below the channel minimum, except for additional blocks
    /// - Discounts apply to individual clients on the main window only:
    ///   free membership minutes first, then the combined percentage (max 100)
    /// - The interpreter is paid for the undiscounted billable minutes
    pub fn calculate(&self, input: &PricingInput) -> Result<PriceBreakdown> {
        let rate = self
            .rate_card
            .rate_for(input.communication_type, input.scheduling_type)
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "No rate configured for {:?}/{:?}",
                    input.communication_type, input.scheduling_type
                ))
            })?;

        let billable_minutes = self.billable_minutes(input);
        let billable = Decimal::from(billable_minutes);

        let discount = if input.client_is_corporate || input.window.is_additional_block() {
            None
        } else {
            input.discount.as_ref()
        };

        let (client_amount, discount_rate, applied_discounts) = match discount {
            Some(discount) => {
                let free_minutes = discount
                    .membership_free_minutes
                    .unwrap_or(0)
                    .min(billable_minutes);
                let percentage = combined_percentage(discount);
                let chargeable = Decimal::from(billable_minutes - free_minutes);
                let amount = chargeable * rate.client_per_minute
                    * (Decimal::ONE_HUNDRED - percentage)
                    / Decimal::ONE_HUNDRED;

                let applied = AppliedDiscounts {
                    promo_code: discount.promo_code.clone(),
                    promo_percentage: discount.promo_percentage,
                    membership_type: discount.membership_type.clone(),
                    membership_percentage: discount.membership_percentage,
                    free_minutes_applied: (free_minutes > 0).then_some(free_minutes),
                };
                let rate = (percentage > Decimal::ZERO).then_some(percentage);

                (round_money(amount), rate, Some(applied))
            }
            None => (round_money(billable * rate.client_per_minute), None, None),
        };

        let client_gst_amount = if input.client_pays_gst {
            round_money(client_amount * self.gst_rate)
        } else {
            Decimal::ZERO
        };

        let interpreter_amount = round_money(billable * rate.interpreter_per_minute);
        let interpreter_gst_amount = if input.interpreter_pays_gst {
            round_money(interpreter_amount * self.gst_rate)
        } else {
            Decimal::ZERO
        };

        Ok(PriceBreakdown {
            billable_minutes,
            client_amount,
            client_gst_amount,
            client_full_amount: client_amount + client_gst_amount,
            interpreter_amount,
            interpreter_gst_amount,
            discount_rate,
            applied_discounts,
        })
    }

    fn billable_minutes(&self, input: &PricingInput) -> u32 {
        let increment = self.rate_card.billing_increment_minutes;
        let duration = input.window.duration_minutes();
        let rounded = duration.div_ceil(increment).saturating_mul(increment);

        if input.window.is_additional_block() {
            rounded
        } else {
            rounded.max(self.rate_card.minimum_minutes(input.communication_type))
        }
    }
}

fn combined_percentage(discount: &DiscountInput) -> Decimal {
    let total = discount.promo_percentage.unwrap_or_default()
        + discount.membership_percentage.unwrap_or_default();
    total.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
