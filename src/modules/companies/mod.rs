// Companies module: ledger fields of a corporate company

pub mod models;

pub use models::{CompanyLedger, FundingSource};
