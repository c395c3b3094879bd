//! Mock payment gateway for testing.
//!
//! Scripts the gateway's single callback and records what the checkout sent.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::ports::{GatewayError, GatewayOutcome, PayRequest, PaymentGateway};

#[derive(Debug, Clone)]
enum Behavior {
    /// Approve and echo the request's order id.
    Approve { gateway_transaction_id: String },
    /// Return exactly this outcome.
    Reply(GatewayOutcome),
    /// Never call back.
    Abandon,
}

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::approving("imp_123");
/// let declined = MockPaymentGateway::replying(GatewayOutcome::Failed {
///     error_message: "card declined".into(),
/// });
/// ```
#[derive(Debug)]
pub struct MockPaymentGateway {
    behavior: Behavior,
    init_error: Option<GatewayError>,
    inits: Mutex<Vec<String>>,
    requests: Mutex<Vec<PayRequest>>,
}

impl MockPaymentGateway {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            init_error: None,
            inits: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Approves every payment, echoing its order id.
    pub fn approving(gateway_transaction_id: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Approve {
            gateway_transaction_id: gateway_transaction_id.into(),
        })
    }

    /// Returns `outcome` for every payment, whatever the order id.
    pub fn replying(outcome: GatewayOutcome) -> Self {
        Self::with_behavior(Behavior::Reply(outcome))
    }

    /// Reports every payment as abandoned.
    pub fn abandoning() -> Self {
        Self::with_behavior(Behavior::Abandon)
    }

    /// Fails `init` with the given error.
    pub fn with_init_error(mut self, error: GatewayError) -> Self {
        self.init_error = Some(error);
        self
    }

    /// Merchant ids passed to `init`.
    pub fn inits(&self) -> Vec<String> {
        self.inits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Payment requests received.
    pub fn requests(&self) -> Vec<PayRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn init(&self, merchant_id: &str) -> Result<(), GatewayError> {
        self.inits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(merchant_id.to_string());
        match &self.init_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn request_pay(&self, request: PayRequest) -> Result<GatewayOutcome, GatewayError> {
        let order_id = request.order_id.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match &self.behavior {
            Behavior::Approve {
                gateway_transaction_id,
            } => Ok(GatewayOutcome::Approved {
                gateway_transaction_id: gateway_transaction_id.clone(),
                order_id,
            }),
            Behavior::Reply(outcome) => Ok(outcome.clone()),
            Behavior::Abandon => Err(GatewayError::Abandoned),
        }
    }
}
