// Pricing module: appointment price breakdowns for authorization and capture

pub mod models;
pub mod services;

pub use models::{
    AppliedDiscounts, CommunicationType, DiscountInput, PriceBreakdown, PriceWindow,
    PricingInput, Rate, RateCard, SchedulingType,
};
pub use services::PriceCalculator;
