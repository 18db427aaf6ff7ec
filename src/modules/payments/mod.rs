// Payments module: payment ledger aggregates, ledger store and the services
// mutating them

pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    CustomerType, NewPayment, Payment, PaymentDirection, PaymentItem, PaymentItemStatus,
    PaymentSystem, TotalsBasis,
};
pub use repositories::{LedgerStore, LedgerTransaction, MySqlLedgerStore};
pub use services::{RecalculationOutcome, RecalculationService, RecordService};
