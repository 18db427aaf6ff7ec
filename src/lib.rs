//! AppointPay payment orchestration engine
//!
//! Authorizes, captures, cancels and settles payments for interpreting
//! appointments across card, corporate deposit and corporate credit funding.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::jobs::{PaymentJob, PaymentQueue};
pub use modules::orchestration::{
    EngineDependencies, OperationKind, OperationReport, PaymentEngine, PaymentStrategy,
};
