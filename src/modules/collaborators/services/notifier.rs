use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::{DepositRecharger, NotificationSender};
use crate::modules::collaborators::models::SideEffect;

/// Best-effort side channel for post-commit effects
///
/// Effects are spawned onto the runtime and never awaited by the operation;
/// a failed send is logged and otherwise ignored.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn NotificationSender>,
    recharger: Arc<dyn DepositRecharger>,
}

impl Notifier {
    pub fn new(sender: Arc<dyn NotificationSender>, recharger: Arc<dyn DepositRecharger>) -> Self {
        Self { sender, recharger }
    }

    pub fn dispatch(&self, effects: Vec<SideEffect>) {
        for effect in effects {
            let sender = Arc::clone(&self.sender);
            let recharger = Arc::clone(&self.recharger);

            tokio::spawn(async move {
                match effect {
                    SideEffect::Notify(notification) => {
                        debug!(?notification, "Sending payment notification");
                        if let Err(e) = sender.send(notification).await {
                            warn!(error = %e, "Payment notification could not be sent");
                        }
                    }
                    SideEffect::Recharge(request) => {
                        let company_id = request.company_id.clone();
                        if let Err(e) = recharger.request_recharge(request).await {
                            warn!(
                                company_id = %company_id,
                                error = %e,
                                "Deposit auto-recharge request failed"
                            );
                        }
                    }
                }
            });
        }
    }
}
