pub mod card_gateway;
pub mod gateway_trait;
pub mod idempotency;
pub mod payout_network;

pub use card_gateway::CardGatewayClient;
pub use gateway_trait::{
    Authorization, AuthorizeRequest, Capture, CaptureRequest, PaymentGateway, Payout,
    PayoutNetwork, PayoutRequest, Transfer, TransferRequest,
};
pub use payout_network::PayoutNetworkClient;
