pub mod authorization;
pub mod cancellation;
pub mod capture;
pub mod recreate;
pub mod transfer;

pub use authorization::AuthorizationExecutor;
pub use cancellation::CancellationExecutor;
pub use capture::{CaptureExecutor, CommissionSplit};
pub use recreate::RecreateExecutor;
pub use transfer::TransferExecutor;
