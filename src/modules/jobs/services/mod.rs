pub mod payment_queue;

pub use payment_queue::{JobHandler, PaymentQueue, QueueReceiver};
