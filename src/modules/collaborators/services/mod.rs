pub mod collaborator_client;
pub mod notifier;
pub mod ports;

pub use collaborator_client::CollaboratorClient;
pub use notifier::Notifier;
pub use ports::{DepositRecharger, NotificationSender, ReceiptGenerator};
