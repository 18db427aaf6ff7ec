use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the appointment was booked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulingType {
    OnDemand,
    PreBooked,
}

impl std::str::FromStr for SchedulingType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "on-demand" => Ok(SchedulingType::OnDemand),
            "pre-booked" => Ok(SchedulingType::PreBooked),
            _ => Err(format!("Invalid scheduling type: {}", s)),
        }
    }
}

/// Channel the interpreting session runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommunicationType {
    Audio,
    Video,
    FaceToFace,
}

impl std::str::FromStr for CommunicationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "audio" => Ok(CommunicationType::Audio),
            "video" => Ok(CommunicationType::Video),
            "face-to-face" => Ok(CommunicationType::FaceToFace),
            _ => Err(format!("Invalid communication type: {}", s)),
        }
    }
}

/// Time span a price is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceWindow {
    /// Booked duration, used when authorizing
    Estimated { minutes: u32 },
    /// Actual business start/end, used at completion
    Actual {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Extension of a running appointment; no minimum charge
    AdditionalBlock { minutes: u32 },
}

impl PriceWindow {
    /// Duration in whole minutes, partial minutes rounded up
    pub fn duration_minutes(&self) -> u32 {
        match *self {
            PriceWindow::Estimated { minutes } | PriceWindow::AdditionalBlock { minutes } => minutes,
            PriceWindow::Actual { start, end } => {
                let seconds = (end - start).num_seconds().max(0);
                u32::try_from((seconds + 59) / 60).unwrap_or(u32::MAX)
            }
        }
    }

    pub fn is_additional_block(&self) -> bool {
        matches!(self, PriceWindow::AdditionalBlock { .. })
    }
}

/// Discounts supplied by the discount engine for an individual client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountInput {
    pub promo_code: Option<String>,
    pub promo_percentage: Option<Decimal>,
    pub membership_type: Option<String>,
    pub membership_percentage: Option<Decimal>,
    pub membership_free_minutes: Option<u32>,
}

/// Discount attribution stored on the payment item; informational only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscounts {
    pub promo_code: Option<String>,
    pub promo_percentage: Option<Decimal>,
    pub membership_type: Option<String>,
    pub membership_percentage: Option<Decimal>,
    pub free_minutes_applied: Option<u32>,
}

/// Everything the calculator needs about an appointment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingInput {
    pub scheduling_type: SchedulingType,
    pub communication_type: CommunicationType,
    pub window: PriceWindow,
    pub client_is_corporate: bool,
    pub client_pays_gst: bool,
    pub interpreter_pays_gst: bool,
    pub discount: Option<DiscountInput>,
}

/// Normalized price of one appointment window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub billable_minutes: u32,
    pub client_amount: Decimal,
    pub client_gst_amount: Decimal,
    pub client_full_amount: Decimal,
    pub interpreter_amount: Decimal,
    pub interpreter_gst_amount: Decimal,
    pub discount_rate: Option<Decimal>,
    pub applied_discounts: Option<AppliedDiscounts>,
}

impl PriceBreakdown {
    pub fn interpreter_full_amount(&self) -> Decimal {
        self.interpreter_amount + self.interpreter_gst_amount
    }
}
