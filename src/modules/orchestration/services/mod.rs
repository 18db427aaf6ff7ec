pub mod context_loader;
pub mod engine;
pub mod executors;
pub mod strategy_resolver;
pub mod validator;

pub use context_loader::ContextLoader;
pub use engine::{EngineDependencies, PaymentEngine};
pub use executors::CommissionSplit;
pub use strategy_resolver::resolve_strategy;
pub use validator::OperationValidator;
