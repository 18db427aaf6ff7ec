pub mod currency;
pub mod error;

pub use currency::{round_money, Currency};
pub use error::{AppError, Result};
