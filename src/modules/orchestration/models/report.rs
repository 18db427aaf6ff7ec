use serde::{Deserialize, Serialize};

use super::operation::OperationKind;
use super::strategy::PaymentStrategy;
use crate::modules::collaborators::SideEffect;

/// Business outcome of one engine operation
///
/// `success` is true only when every item reached its terminal success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    pub operation: OperationKind,
    pub strategy: Option<PaymentStrategy>,
    pub success: bool,
    pub payment_id: Option<String>,
    pub note: Option<String>,
}

/// What an executor did inside the transaction
#[derive(Debug, Default)]
pub struct Execution {
    pub success: bool,
    pub payment_id: Option<String>,
    pub note: Option<String>,
    /// Dispatched only after commit
    pub effects: Vec<SideEffect>,
    /// Appointment to cancel for a failed payment, once the failure is committed
    pub cancel_appointment: Option<String>,
}

impl Execution {
    pub fn succeeded(payment_id: Option<String>) -> Self {
        Self {
            success: true,
            payment_id,
            ..Self::default()
        }
    }

    pub fn failed(payment_id: Option<String>, note: impl Into<String>) -> Self {
        Self {
            success: false,
            payment_id,
            note: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        if note.is_some() {
            self.note = note;
        }
        self
    }

    pub fn with_effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn cancelling_appointment(mut self, appointment_id: impl Into<String>) -> Self {
        self.cancel_appointment = Some(appointment_id.into());
        self
    }
}
