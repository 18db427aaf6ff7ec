pub mod ledger_store;
pub mod mysql_ledger_store;

pub use ledger_store::{LedgerStore, LedgerTransaction};
pub use mysql_ledger_store::MySqlLedgerStore;
