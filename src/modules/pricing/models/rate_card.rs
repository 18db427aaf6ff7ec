use super::{CommunicationType, SchedulingType};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Per-minute rates for one (communication, scheduling) combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub client_per_minute: Decimal,
    pub interpreter_per_minute: Decimal,
}

impl Rate {
    pub const fn new(client_per_minute: Decimal, interpreter_per_minute: Decimal) -> Self {
        Self {
            client_per_minute,
            interpreter_per_minute,
        }
    }
}

/// Rates and billing granularity used by the price calculator
#[derive(Debug, Clone)]
pub struct RateCard {
    rates: HashMap<(CommunicationType, SchedulingType), Rate>,
    /// Billed durations are rounded up to a multiple of this
    pub billing_increment_minutes: u32,
    pub remote_minimum_minutes: u32,
    pub face_to_face_minimum_minutes: u32,
}

impl RateCard {
    pub fn new(billing_increment_minutes: u32) -> Self {
        Self {
            rates: HashMap::new(),
            billing_increment_minutes: billing_increment_minutes.max(1),
            remote_minimum_minutes: 15,
            face_to_face_minimum_minutes: 60,
        }
    }

    pub fn with_rate(
        mut self,
        communication: CommunicationType,
        scheduling: SchedulingType,
        rate: Rate,
    ) -> Self {
        self.rates.insert((communication, scheduling), rate);
        self
    }

    pub fn rate_for(
        &self,
        communication: CommunicationType,
        scheduling: SchedulingType,
    ) -> Option<Rate> {
        self.rates.get(&(communication, scheduling)).copied()
    }

    pub fn minimum_minutes(&self, communication: CommunicationType) -> u32 {
        match communication {
            CommunicationType::FaceToFace => self.face_to_face_minimum_minutes,
            CommunicationType::Audio | CommunicationType::Video => self.remote_minimum_minutes,
        }
    }
}

impl Default for RateCard {
    fn default() -> Self {
        use CommunicationType::*;
        use SchedulingType::*;

        RateCard::new(5)
            .with_rate(Audio, OnDemand, Rate::new(Decimal::new(150, 2), Decimal::new(100, 2)))
            .with_rate(Audio, PreBooked, Rate::new(Decimal::new(140, 2), Decimal::new(95, 2)))
            .with_rate(Video, OnDemand, Rate::new(Decimal::new(170, 2), Decimal::new(115, 2)))
            .with_rate(Video, PreBooked, Rate::new(Decimal::new(160, 2), Decimal::new(110, 2)))
            .with_rate(FaceToFace, OnDemand, Rate::new(Decimal::new(220, 2), Decimal::new(150, 2)))
            .with_rate(FaceToFace, PreBooked, Rate::new(Decimal::new(200, 2), Decimal::new(140, 2)))
    }
}
