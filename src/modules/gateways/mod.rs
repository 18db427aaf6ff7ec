// Gateways module: card gateway and payout network adapters

pub mod services;

pub use services::{
    idempotency, Authorization, AuthorizeRequest, Capture, CaptureRequest, CardGatewayClient,
    PaymentGateway, Payout, PayoutNetwork, PayoutNetworkClient, PayoutRequest, Transfer,
    TransferRequest,
};
