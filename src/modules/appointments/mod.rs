// Appointments module: read projection and write-back contract of the
// appointment service consumed by the payment engine

pub mod models;
pub mod repositories;

pub use models::{
    AppointmentProjection, AppointmentStatus, PartyProjection, PaymentInfo, PayoutRail, RoleName,
};
pub use repositories::{AppointmentRepository, MySqlAppointmentRepository};
