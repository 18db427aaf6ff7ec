pub mod appointments;
pub mod collaborators;
pub mod companies;
pub mod gateways;
pub mod health;
pub mod jobs;
pub mod orchestration;
pub mod payments;
pub mod pricing;
