//! Channel-bridged payment gateway.
//!
//! The gateway client itself lives in a UI host this crate does not own. Each
//! `request_pay` is delivered to that host as a [`PaymentPrompt`] carrying a
//! single-use callback. Responding consumes the prompt, so a callback can fire
//! at most once; dropping it abandons the attempt.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};

use crate::ports::{GatewayError, GatewayOutcome, PayRequest, PaymentGateway};

/// One payment awaiting the UI host.
#[derive(Debug)]
pub struct PaymentPrompt {
    merchant_id: String,
    request: PayRequest,
    callback: oneshot::Sender<GatewayOutcome>,
}

impl PaymentPrompt {
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn request(&self) -> &PayRequest {
        &self.request
    }

    /// Reports the gateway's result back to the waiting checkout.
    ///
    /// Returns `false` if the checkout stopped waiting.
    pub fn respond(self, outcome: GatewayOutcome) -> bool {
        self.callback.send(outcome).is_ok()
    }
}

/// Gateway adapter that forwards prompts to a UI host.
pub struct ChannelPaymentGateway {
    merchant_id: Mutex<Option<String>>,
    prompts: mpsc::Sender<PaymentPrompt>,
}

impl ChannelPaymentGateway {
    /// Creates the gateway and the receiving end for the UI host.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PaymentPrompt>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                merchant_id: Mutex::new(None),
                prompts: tx,
            },
            rx,
        )
    }

    fn merchant_id(&self) -> Option<String> {
        self.merchant_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for ChannelPaymentGateway {
    async fn init(&self, merchant_id: &str) -> Result<(), GatewayError> {
        if merchant_id.trim().is_empty() {
            return Err(GatewayError::InitializationFailed(
                "merchant id is empty".to_string(),
            ));
        }
        *self
            .merchant_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(merchant_id.to_string());
        Ok(())
    }

    async fn request_pay(&self, request: PayRequest) -> Result<GatewayOutcome, GatewayError> {
        let merchant_id = self
            .merchant_id()
            .ok_or_else(|| GatewayError::Unavailable("gateway was not initialized".to_string()))?;

        let (callback, outcome) = oneshot::channel();
        let order_id = request.order_id.clone();
        self.prompts
            .send(PaymentPrompt {
                merchant_id,
                request,
                callback,
            })
            .await
            .map_err(|_| GatewayError::Unavailable("payment UI host is gone".to_string()))?;

        tracing::debug!(order_id = %order_id, "Payment prompt delivered, awaiting callback");

        outcome.await.map_err(|_| {
            tracing::info!(order_id = %order_id, "Payment prompt dropped without a callback");
            GatewayError::Abandoned
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pay_request() -> PayRequest {
        PayRequest {
            pg: "tosspayments".into(),
            pay_method: "card".into(),
            order_id: "subscription_1_abc".into(),
            amount: 9000,
            product_name: "LottoMate+ STANDARD monthly".into(),
            buyer_email: "user@example.com".into(),
            recurrence: None,
        }
    }

    #[tokio::test]
    async fn request_before_init_is_unavailable() {
        let (gateway, _prompts) = ChannelPaymentGateway::new(1);
        let err = gateway.request_pay(pay_request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[tokio::test]
    async fn empty_merchant_is_rejected() {
        let (gateway, _prompts) = ChannelPaymentGateway::new(1);
        assert!(matches!(
            gateway.init(" ").await,
            Err(GatewayError::InitializationFailed(_))
        ));
    }

    #[tokio::test]
    async fn host_response_reaches_checkout() {
        let (gateway, mut prompts) = ChannelPaymentGateway::new(1);
        gateway.init("imp70056657").await.unwrap();

        let host = tokio::spawn(async move {
            let prompt = prompts.recv().await.unwrap();
            assert_eq!(prompt.merchant_id(), "imp70056657");
            let order_id = prompt.request().order_id.clone();
            prompt.respond(GatewayOutcome::Approved {
                gateway_transaction_id: "imp_1".into(),
                order_id,
            })
        });

        let outcome = gateway.request_pay(pay_request()).await.unwrap();
        assert!(host.await.unwrap());
        assert_eq!(
            outcome,
            GatewayOutcome::Approved {
                gateway_transaction_id: "imp_1".into(),
                order_id: "subscription_1_abc".into(),
            }
        );
    }

    #[tokio::test]
    async fn dropped_prompt_is_abandoned() {
        let (gateway, mut prompts) = ChannelPaymentGateway::new(1);
        gateway.init("imp70056657").await.unwrap();

        tokio::spawn(async move {
            let prompt = prompts.recv().await.unwrap();
            drop(prompt);
        });

        assert_eq!(
            gateway.request_pay(pay_request()).await,
            Err(GatewayError::Abandoned)
        );
    }

    #[tokio::test]
    async fn closed_host_is_unavailable() {
        let (gateway, prompts) = ChannelPaymentGateway::new(1);
        gateway.init("imp70056657").await.unwrap();
        drop(prompts);

        assert!(matches!(
            gateway.request_pay(pay_request()).await,
            Err(GatewayError::Unavailable(_))
        ));
    }
}
