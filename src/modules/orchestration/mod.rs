// Orchestration module: context loading, validation, strategy resolution and
// execution of payment operations

pub mod models;
pub mod services;

pub use models::{
    AuthorizationContext, AuthorizationKind, CancelContext, CaptureContext, Execution,
    OperationContext, OperationKind, OperationReport, Payee, Payer, PaymentStrategy,
    RecreateContext, TransferContext, ValidationOutcome,
};
pub use services::{
    resolve_strategy, CommissionSplit, ContextLoader, EngineDependencies, OperationValidator,
    PaymentEngine,
};
