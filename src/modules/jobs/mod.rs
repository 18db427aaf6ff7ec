// Jobs module: the payments queue feeding the engine

pub mod controllers;
pub mod models;
pub mod services;

pub use models::{AdditionalData, PaymentJob};
pub use services::{JobHandler, PaymentQueue, QueueReceiver};
