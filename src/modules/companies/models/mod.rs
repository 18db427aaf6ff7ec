use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::round_money;

/// How a corporate client funds its appointments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundingSource {
    /// Pre-paid balance drawn down per appointment
    Deposit,
    /// Billed afterwards, up to a credit limit
    PostPayment,
}

impl std::fmt::Display for FundingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FundingSource::Deposit => write!(f, "deposit"),
            FundingSource::PostPayment => write!(f, "post-payment"),
        }
    }
}

impl std::str::FromStr for FundingSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(FundingSource::Deposit),
            "post-payment" => Ok(FundingSource::PostPayment),
            _ => Err(format!("Invalid funding source: {}", s)),
        }
    }
}

/// Ledger fields of a corporate company
///
/// `deposit_amount` is the pre-paid balance under deposit funding and the
/// used credit under post-payment funding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLedger {
    pub id: String,
    pub name: String,
    pub funding_source: FundingSource,
    pub deposit_amount: Decimal,
    pub deposit_default_charge_amount: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    /// Percentage retained by the platform on same-company appointments
    pub platform_commission_rate: Decimal,
    pub super_admin_id: Option<String>,
}

impl CompanyLedger {
    /// Balance after returning `amount` to the company
    pub fn balance_after_refund(&self, amount: Decimal) -> Decimal {
        match self.funding_source {
            FundingSource::Deposit => round_money(self.deposit_amount + amount),
            FundingSource::PostPayment => round_money(self.deposit_amount - amount),
        }
    }

    /// Balance after drawing `amount` from the company
    pub fn balance_after_charge(&self, amount: Decimal) -> Decimal {
        self.balance_after_refund(-amount)
    }
}
