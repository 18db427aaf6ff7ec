use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Currency;
use crate::modules::pricing::{CommunicationType, DiscountInput, SchedulingType};

/// Appointment lifecycle as seen by the payment engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    Live,
    Completed,
    Cancelled,
    /// Cancelled by the client too late; the authorization is captured
    CancelledOrdered,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::CancelledOrdered
        )
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "accepted" => Ok(AppointmentStatus::Accepted),
            "live" => Ok(AppointmentStatus::Live),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "cancelled-ordered" => Ok(AppointmentStatus::CancelledOrdered),
            _ => Err(format!("Invalid appointment status: {}", s)),
        }
    }
}

/// User role names relevant to payment routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleName {
    IndClient,
    IndProfessionalInterpreter,
    CorporateClientsSuperAdmin,
    CorporateClientsAdmin,
    CorporateClientsReceptionist,
    CorporateClientsIndUser,
    CorporateInterpretingProvidersSuperAdmin,
    CorporateInterpretingProvidersAdmin,
    CorporateInterpretingProvidersIndInterpreter,
}

impl RoleName {
    pub fn is_corporate_client(&self) -> bool {
        matches!(
            self,
            RoleName::CorporateClientsSuperAdmin
                | RoleName::CorporateClientsAdmin
                | RoleName::CorporateClientsReceptionist
                | RoleName::CorporateClientsIndUser
        )
    }

    pub fn is_corporate_interpreting_provider(&self) -> bool {
        matches!(
            self,
            RoleName::CorporateInterpretingProvidersSuperAdmin
                | RoleName::CorporateInterpretingProvidersAdmin
                | RoleName::CorporateInterpretingProvidersIndInterpreter
        )
    }
}

impl std::str::FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ind-client" => Ok(RoleName::IndClient),
            "ind-professional-interpreter" => Ok(RoleName::IndProfessionalInterpreter),
            "corporate-clients-super-admin" => Ok(RoleName::CorporateClientsSuperAdmin),
            "corporate-clients-admin" => Ok(RoleName::CorporateClientsAdmin),
            "corporate-clients-receptionist" => Ok(RoleName::CorporateClientsReceptionist),
            "corporate-clients-ind-user" => Ok(RoleName::CorporateClientsIndUser),
            "corporate-interpreting-providers-super-admin" => {
                Ok(RoleName::CorporateInterpretingProvidersSuperAdmin)
            }
            "corporate-interpreting-providers-admin" => {
                Ok(RoleName::CorporateInterpretingProvidersAdmin)
            }
            "corporate-interpreting-providers-ind-interpreter" => {
                Ok(RoleName::CorporateInterpretingProvidersIndInterpreter)
            }
            _ => Err(format!("Invalid role name: {}", s)),
        }
    }
}

/// Rail an interpreter is paid out through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoutRail {
    /// Card-gateway connected account, settled on the gateway's schedule
    CardGateway,
    /// Card-gateway connected account with an immediate payout after transfer
    CardGatewayInstant,
    /// Alternate payout network
    PayoutNetwork,
}

impl PayoutRail {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutRail::CardGateway => "card-gateway",
            PayoutRail::CardGatewayInstant => "card-gateway-instant",
            PayoutRail::PayoutNetwork => "payout-network",
        }
    }
}

impl std::str::FromStr for PayoutRail {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "card-gateway" => Ok(PayoutRail::CardGateway),
            "card-gateway-instant" => Ok(PayoutRail::CardGatewayInstant),
            "payout-network" => Ok(PayoutRail::PayoutNetwork),
            _ => Err(format!("Invalid payout rail: {}", s)),
        }
    }
}

/// Saved payment and payout references of a user role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub customer_ref: Option<String>,
    pub payment_method_ref: Option<String>,
    pub payout_account_ref: Option<String>,
    pub payout_rail: Option<PayoutRail>,
}

/// A client or interpreter as needed for payment routing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyProjection {
    pub user_role_id: String,
    pub role: RoleName,
    pub operated_by_company_id: String,
    pub operated_by_main_corporate_company_id: Option<String>,
    pub country: String,
    pub is_gst_payer: bool,
    pub payment_info: PaymentInfo,
}

impl PartyProjection {
    /// Company billed (client) or paid (interpreter) for a corporate party.
    ///
    /// The main corporate company wins unless it is the platform's own root company.
    pub fn billing_company_id(&self, platform_company_id: &str) -> &str {
        match self.operated_by_main_corporate_company_id.as_deref() {
            Some(main) if main != platform_company_id => main,
            _ => &self.operated_by_company_id,
        }
    }
}

/// Appointment read projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentProjection {
    pub id: String,
    pub platform_id: String,
    pub status: AppointmentStatus,
    pub scheduling_type: SchedulingType,
    pub communication_type: CommunicationType,
    pub currency: Currency,
    pub scheduled_start_time: DateTime<Utc>,
    pub scheduling_duration_min: u32,
    pub business_start_time: Option<DateTime<Utc>>,
    pub business_end_time: Option<DateTime<Utc>>,
    /// Routed to the wait list because no interpreter capacity was available
    pub is_wait_list: bool,
    pub client: PartyProjection,
    pub interpreter: Option<PartyProjection>,
    pub discount: Option<DiscountInput>,
    pub paid_by_client: Option<Decimal>,
}
