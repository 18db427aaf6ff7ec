use serde::{Deserialize, Serialize};

/// Operations the engine exposes, one entry point each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Authorize,
    AuthorizeAdditionalBlock,
    AuthorizationRecreate,
    AuthorizationCancel,
    Capture,
    Transfer,
    Recalculate,
    GenerateReceipts,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Authorize => "authorize",
            OperationKind::AuthorizeAdditionalBlock => "authorize-additional-block",
            OperationKind::AuthorizationRecreate => "authorization-recreate",
            OperationKind::AuthorizationCancel => "authorization-cancel",
            OperationKind::Capture => "capture",
            OperationKind::Transfer => "transfer",
            OperationKind::Recalculate => "recalculate",
            OperationKind::GenerateReceipts => "generate-receipts",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
