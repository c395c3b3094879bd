//! Subscription module - plans, pricing, checkout attempts, and the
//! server-owned subscription record.

mod billing;
mod payment_attempt;
mod plan;
mod record;

pub use billing::{
    checkout_amount, monthly_unit_price, BillingPeriod, Recurrence, MAX_PLAN_PRICE,
    YEARLY_MONTHS_CHARGED,
};
pub use payment_attempt::PaymentAttempt;
pub use plan::{Plan, PlanCatalog, PlanOffer};
pub use record::{Subscription, SubscriptionStatus};
