//! Operation names routed through the facade.
//!
//! Every call the facade runs is identified by one of these names. Only the
//! names in the public allow-list may run without a live session.

use once_cell::sync::Lazy;
use std::collections::HashSet;

pub const SIGN_IN: &str = "signIn";
pub const SIGN_UP: &str = "signUp";
pub const CHECK_EMAIL_AVAILABILITY: &str = "checkEmailAvailability";

pub const GET_SUBSCRIPTION_PLANS: &str = "getSubscriptionPlans";
pub const GET_ACTIVE_SUBSCRIPTION_PLANS: &str = "getActiveSubscriptionPlans";
pub const GET_SUBSCRIPTION_PLAN_BY_NAME: &str = "getSubscriptionPlanByName";
pub const GET_SUBSCRIPTION_INFO: &str = "getSubscriptionInfo";
pub const GET_SUBSCRIPTION_DETAILS: &str = "getSubscriptionDetails";
pub const CREATE_SUBSCRIPTION: &str = "createSubscription";
pub const CANCEL_SUBSCRIPTION: &str = "cancelSubscription";
pub const UPDATE_AUTO_RENEWAL: &str = "updateAutoRenewal";
pub const CHANGE_PLAN: &str = "changePlan";
pub const CHANGE_PAYMENT_METHOD: &str = "changePaymentMethod";
pub const CREATE_CANCELLATION: &str = "createCancellation";
pub const GET_CANCELLATION_HISTORY: &str = "getCancellationHistory";
pub const GET_CANCELLATION_DETAIL: &str = "getCancellationDetail";
pub const VERIFY_PAYMENT: &str = "verifyPaymentAndCreateSubscription";

pub const GET_PAYMENT_INFO: &str = "getPaymentInfo";
pub const GET_PAYMENT_RECEIPT: &str = "getPaymentReceipt";
pub const REFUND_PAYMENT: &str = "refundPayment";
pub const REGISTER_PAYMENT_METHOD: &str = "registerPaymentMethod";
pub const GET_PAYMENT_METHODS: &str = "getPaymentMethods";
pub const DELETE_PAYMENT_METHOD: &str = "deletePaymentMethod";
pub const LOG_PAYMENT_ACTION: &str = "logPaymentAction";
pub const GET_PAYMENT_LOGS: &str = "getPaymentLogs";

static PUBLIC_OPERATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        GET_SUBSCRIPTION_PLANS,
        GET_SUBSCRIPTION_PLAN_BY_NAME,
        GET_ACTIVE_SUBSCRIPTION_PLANS,
        SIGN_IN,
        SIGN_UP,
        CHECK_EMAIL_AVAILABILITY,
    ]
    .into_iter()
    .collect()
});

/// Whether `operation` may run without a live session.
pub fn is_public(operation: &str) -> bool {
    PUBLIC_OPERATIONS.contains(operation)
}
