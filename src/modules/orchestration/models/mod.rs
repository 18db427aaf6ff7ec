mod context;
mod operation;
mod report;
mod strategy;

pub use context::{
    AuthorizationContext, AuthorizationKind, CancelContext, CaptureContext, OperationContext,
    Payee, Payer, RecreateContext, TransferContext,
};
pub use operation::OperationKind;
pub use report::{Execution, OperationReport};
pub use strategy::{PaymentStrategy, ValidationOutcome};
