//! Payment Gateway Port - the third-party checkout UI.
//!
//! The gateway shows its own payment screen and eventually reports back once.
//! It can also never report back (the buyer walked away); adapters surface a
//! dropped callback as [`GatewayError::Abandoned`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::subscription::Recurrence;

/// Parameters of one gateway charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRequest {
    /// Payment processor routed through the gateway (e.g. `tosspayments`).
    pub pg: String,
    /// Payment method (e.g. `card`).
    pub pay_method: String,
    /// Merchant order id of the attempt.
    pub order_id: String,
    /// Amount in KRW.
    pub amount: i64,
    /// Human-readable product name.
    pub product_name: String,
    pub buyer_email: String,
    /// Present only for recurring (monthly) subscriptions.
    pub recurrence: Option<Recurrence>,
}

/// What the gateway reported back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GatewayOutcome {
    /// The charge went through.
    Approved {
        gateway_transaction_id: String,
        /// Order id echoed by the gateway; must match the attempt's.
        order_id: String,
    },
    /// The charge was declined or failed inside the gateway.
    Failed { error_message: String },
}

/// Errors raised by a gateway adapter itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment gateway could not be initialized: {0}")]
    InitializationFailed(String),

    #[error("Payment gateway is unavailable: {0}")]
    Unavailable(String),

    #[error("Payment was abandoned before the gateway reported back")]
    Abandoned,
}

/// Port for the external payment gateway client
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initialize the gateway for a merchant
    ///
    /// # Errors
    /// Returns `GatewayError::InitializationFailed` if the merchant is rejected
    async fn init(&self, merchant_id: &str) -> Result<(), GatewayError>;

    /// Show the payment UI and wait for its single callback
    ///
    /// # Errors
    /// Returns `GatewayError::Abandoned` if the callback can no longer fire
    async fn request_pay(&self, request: PayRequest) -> Result<GatewayOutcome, GatewayError>;
}
