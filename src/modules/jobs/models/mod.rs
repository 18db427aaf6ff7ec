use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};
use crate::modules::orchestration::models::OperationKind;

/// A queued payment operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentJob {
    pub appointment_id: String,
    pub operation: OperationKind,
    #[serde(default)]
    pub additional_data: AdditionalData,
}

/// Operation-specific arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_cancelled_by_client: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_appointment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_second_attempt: Option<bool>,
    /// Length of an additional block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

impl PaymentJob {
    pub fn new(appointment_id: impl Into<String>, operation: OperationKind) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            operation,
            additional_data: AdditionalData::default(),
        }
    }

    pub fn with_data(mut self, additional_data: AdditionalData) -> Self {
        self.additional_data = additional_data;
        self
    }

    /// Reject jobs missing the arguments their operation needs
    pub fn validate(&self) -> Result<()> {
        if self.appointment_id.trim().is_empty() {
            return Err(AppError::validation("appointmentId is required"));
        }

        let data = &self.additional_data;
        match self.operation {
            OperationKind::AuthorizeAdditionalBlock => match data.minutes {
                Some(minutes) if minutes > 0 => Ok(()),
                _ => Err(AppError::validation(
                    "additionalData.minutes must be a positive number for authorize-additional-block",
                )),
            },
            OperationKind::AuthorizationRecreate => match data.old_appointment_id.as_deref() {
                Some(old) if !old.trim().is_empty() => Ok(()),
                _ => Err(AppError::validation(
                    "additionalData.oldAppointmentId is required for authorization-recreate",
                )),
            },
            _ => Ok(()),
        }
    }
}
