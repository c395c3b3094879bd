//! Server-owned subscription records, as read back by the client.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, StateMachine, SubscriptionId};

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Created but not yet confirmed by payment verification.
    #[serde(alias = "pending")]
    Pending,

    /// Paid and in force.
    #[serde(alias = "active")]
    Active,

    /// Cancelled by the user or an operator.
    #[serde(alias = "cancelled", alias = "CANCELED", alias = "canceled")]
    Cancelled,
}

impl SubscriptionStatus {
    pub fn has_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Pending, Active) | (Pending, Cancelled) | (Active, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Cancelled],
            Active => vec![Cancelled],
            Cancelled => vec![],
        }
    }
}

/// A subscription as returned by `subscription/info`.
///
/// Dates are kept as the server formats them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(alias = "id")]
    pub subscription_id: SubscriptionId,
    #[serde(default, alias = "userEmail", alias = "email")]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    #[serde(default)]
    pub plan_name: Option<String>,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub next_payment_date: Option<String>,
    #[serde(default)]
    pub auto_renewal: bool,
}

impl Subscription {
    /// Whether a cancellation request makes sense for the current status.
    pub fn can_cancel(&self) -> bool {
        self.status.can_transition_to(&SubscriptionStatus::Cancelled)
    }
}
