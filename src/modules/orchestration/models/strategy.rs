use serde::{Deserialize, Serialize};

/// Processing strategy picked by the resolver; executors only consume it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStrategy {
    ValidationFailed,
    WaitListRedirect,
    CorporateDepositCharge,
    CorporatePostPayment,
    IndividualStripeAuth,
    ReattachExistingPayment,
    CorporateCancelAndReauthorize,
    IndividualCancelAndReauthorize,
    AuthorizationCancelNotAllowed,
    CorporateAuthorizationCancel,
    IndividualAuthorizationCancel,
    SameCompanyCommission,
    CorporateCapture,
    IndividualCapture,
    CorporateTransfer,
    IndividualTransfer,
}

impl PaymentStrategy {
    pub fn as_str(&self) -> &'static str {
        use PaymentStrategy::*;
        match self {
            ValidationFailed => "VALIDATION_FAILED",
            WaitListRedirect => "WAIT_LIST_REDIRECT",
            CorporateDepositCharge => "CORPORATE_DEPOSIT_CHARGE",
            CorporatePostPayment => "CORPORATE_POST_PAYMENT",
            IndividualStripeAuth => "INDIVIDUAL_STRIPE_AUTH",
            ReattachExistingPayment => "REATTACH_EXISTING_PAYMENT",
            CorporateCancelAndReauthorize => "CORPORATE_CANCEL_AND_REAUTHORIZE",
            IndividualCancelAndReauthorize => "INDIVIDUAL_CANCEL_AND_REAUTHORIZE",
            AuthorizationCancelNotAllowed => "AUTHORIZATION_CANCEL_NOT_ALLOWED",
            CorporateAuthorizationCancel => "CORPORATE_AUTHORIZATION_CANCEL",
            IndividualAuthorizationCancel => "INDIVIDUAL_AUTHORIZATION_CANCEL",
            SameCompanyCommission => "SAME_COMPANY_COMMISSION",
            CorporateCapture => "CORPORATE_CAPTURE",
            IndividualCapture => "INDIVIDUAL_CAPTURE",
            CorporateTransfer => "CORPORATE_TRANSFER",
            IndividualTransfer => "INDIVIDUAL_TRANSFER",
        }
    }
}

impl std::fmt::Display for PaymentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream validation result fed to the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn passed() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("Validation failed")
    }
}
