pub mod recalculation_service;
pub mod record_service;

pub use recalculation_service::{RecalculationOutcome, RecalculationService};
pub use record_service::RecordService;
