mod price;
mod rate_card;

pub use price::{
    AppliedDiscounts, CommunicationType, DiscountInput, PriceBreakdown, PriceWindow,
    PricingInput, SchedulingType,
};
pub use rate_card::{Rate, RateCard};
