// Collaborators module: best-effort notification, deposit recharge and
// receipt ports of neighbouring services

pub mod models;
pub mod services;

pub use models::{PaymentNotification, RechargeRequest, ReceiptRequest, SideEffect};
pub use services::{
    CollaboratorClient, DepositRecharger, NotificationSender, Notifier, ReceiptGenerator,
};
