//! StartCheckoutHandler - pays for a plan and turns the approval into a
//! verified subscription.
//!
//! The gateway reports back exactly once. An approval is only trusted after
//! the server verifies it; a charge the server never confirms surfaces as
//! `PaidUnverified` so it can be reconciled by hand.

use serde_json::json;
use std::sync::Arc;

use crate::application::credential_manager::payload;
use crate::application::operations;
use crate::application::service_facade::ServiceFacade;
use crate::domain::foundation::{
    GatewayTransactionId, MerchantOrderId, ServiceError, SubscriptionId, Timestamp,
    ValidationError,
};
use crate::domain::subscription::{BillingPeriod, PaymentAttempt, Plan};
use crate::ports::{ApiRequest, GatewayError, GatewayOutcome, PayRequest, PaymentGateway};

/// Verification endpoint relative to the API base.
const VERIFY_PAYMENT_PATH: &str = "subscription/verify-payment";

/// Merchant and processor the gateway charges through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub merchant_id: String,
    pub pg: String,
    pub pay_method: String,
}

/// Command to buy `plan` for `billing_period`.
#[derive(Debug, Clone)]
pub struct StartCheckoutCommand {
    pub plan: Plan,
    pub billing_period: BillingPeriod,
}

/// A verified purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCheckoutResult {
    pub subscription_id: SubscriptionId,
    pub gateway_transaction_id: GatewayTransactionId,
    pub merchant_order_id: MerchantOrderId,
    pub amount: i64,
}

/// Why a checkout did not produce a subscription.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Plan cannot be purchased: {0}")]
    InvalidPlan(#[from] ValidationError),

    #[error("Payment gateway failed: {0}")]
    GatewayFault(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment was abandoned")]
    Abandoned,

    #[error("Gateway approved order {received} but this checkout started {expected}")]
    OrderMismatch { expected: String, received: String },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Handler for the checkout flow.
pub struct StartCheckoutHandler {
    facade: Arc<ServiceFacade>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl StartCheckoutHandler {
    pub fn new(
        facade: Arc<ServiceFacade>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            facade,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartCheckoutCommand,
    ) -> Result<StartCheckoutResult, CheckoutError> {
        // 1. A live session comes before anything touches the gateway
        let session = self.facade.require_session().await?;

        // 2. Price the attempt
        let attempt = PaymentAttempt::start(
            &cmd.plan,
            cmd.billing_period,
            session.subject_id().clone(),
            Timestamp::now(),
        )?;
        tracing::info!(
            order_id = %attempt.merchant_order_id,
            plan = %attempt.plan_key,
            period = %attempt.billing_period,
            amount = attempt.amount,
            "Starting checkout"
        );

        // 3. Hand over to the gateway
        let (gateway_transaction_id, echoed_order) = self.pay(&attempt).await?;

        // 4. The approval must belong to this attempt
        if !attempt.owns_order(&echoed_order) {
            tracing::error!(
                expected = %attempt.merchant_order_id,
                received = %echoed_order,
                "Gateway approval does not match checkout"
            );
            return Err(CheckoutError::OrderMismatch {
                expected: attempt.merchant_order_id.to_string(),
                received: echoed_order.to_string(),
            });
        }

        // 5. Server verification
        let subscription_id = self
            .verify(&attempt, &gateway_transaction_id)
            .await
            .map_err(|reason| {
                tracing::error!(
                    gateway_transaction_id = %gateway_transaction_id,
                    order_id = %attempt.merchant_order_id,
                    "Payment approved but not verified: {}",
                    reason
                );
                ServiceError::paid_unverified(
                    gateway_transaction_id.as_str(),
                    attempt.merchant_order_id.as_str(),
                    reason,
                )
            })?;

        tracing::info!(
            subscription_id = %subscription_id,
            order_id = %attempt.merchant_order_id,
            "Checkout verified"
        );

        Ok(StartCheckoutResult {
            subscription_id,
            gateway_transaction_id,
            merchant_order_id: attempt.merchant_order_id,
            amount: attempt.amount,
        })
    }

    async fn pay(
        &self,
        attempt: &PaymentAttempt,
    ) -> Result<(GatewayTransactionId, MerchantOrderId), CheckoutError> {
        self.gateway
            .init(&self.settings.merchant_id)
            .await
            .map_err(|e| CheckoutError::GatewayFault(e.to_string()))?;

        let request = PayRequest {
            pg: self.settings.pg.clone(),
            pay_method: self.settings.pay_method.clone(),
            order_id: attempt.merchant_order_id.to_string(),
            amount: attempt.amount,
            product_name: attempt.product_name(),
            buyer_email: attempt.buyer.to_string(),
            recurrence: attempt.recurrence(),
        };

        match self.gateway.request_pay(request).await {
            Ok(GatewayOutcome::Approved {
                gateway_transaction_id,
                order_id,
            }) => {
                let tx = GatewayTransactionId::new(gateway_transaction_id).map_err(|e| {
                    CheckoutError::GatewayFault(format!("approval without transaction id: {}", e))
                })?;
                Ok((tx, MerchantOrderId::from_echo(order_id)))
            }
            Ok(GatewayOutcome::Failed { error_message }) => {
                tracing::info!(order_id = %attempt.merchant_order_id, "Payment declined: {}", error_message);
                Err(CheckoutError::Declined(error_message))
            }
            Err(GatewayError::Abandoned) => {
                tracing::info!(order_id = %attempt.merchant_order_id, "Payment abandoned");
                Err(CheckoutError::Abandoned)
            }
            Err(e) => {
                tracing::warn!(order_id = %attempt.merchant_order_id, "Payment gateway failed: {}", e);
                Err(CheckoutError::GatewayFault(e.to_string()))
            }
        }
    }

    async fn verify(
        &self,
        attempt: &PaymentAttempt,
        gateway_transaction_id: &GatewayTransactionId,
    ) -> Result<SubscriptionId, String> {
        // The gateway wait is unbounded; the buyer may have signed out or
        // been replaced by another account in the meantime.
        let still_signed_in = self
            .facade
            .session()
            .is_some_and(|s| s.subject_id() == &attempt.buyer);
        if !still_signed_in {
            return Err(format!("{} is no longer signed in", attempt.buyer));
        }

        let body = json!({
            "impUid": gateway_transaction_id.as_str(),
            "merchantUid": attempt.merchant_order_id.as_str(),
            "plan": attempt.plan_key,
            "planId": attempt.plan_id.as_i64(),
            "period": attempt.billing_period,
            "amount": attempt.amount,
            "userEmail": attempt.buyer.as_str(),
        });

        let response = self
            .facade
            .execute(operations::VERIFY_PAYMENT, |ctx| async move {
                ctx.send(ApiRequest::post(VERIFY_PAYMENT_PATH, body)).await
            })
            .await
            .map_err(|e| e.to_string())?;

        let data = payload(response);
        ["subscriptionId", "id"]
            .iter()
            .find_map(|key| data.get(*key).and_then(SubscriptionId::from_json))
            .ok_or_else(|| "verification response carried no subscription id".to_string())
    }
}
