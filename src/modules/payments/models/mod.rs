mod payment;
mod payment_item;

pub use payment::{CustomerType, NewPayment, Payment, PaymentDirection, PaymentSystem, TotalsBasis};
pub use payment_item::{PaymentItem, PaymentItemStatus};
