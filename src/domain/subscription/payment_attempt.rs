//! One in-memory checkout attempt.

use super::billing::{BillingPeriod, Recurrence};
use super::plan::Plan;
use crate::domain::foundation::{MerchantOrderId, PlanId, SubjectId, Timestamp, ValidationError};

/// Brand prefix on gateway product names.
const PRODUCT_BRAND: &str = "LottoMate+";

/// Everything needed to correlate a gateway callback with the checkout that
/// started it. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub merchant_order_id: MerchantOrderId,
    pub plan_id: PlanId,
    pub plan_key: String,
    pub plan_display_name: String,
    pub billing_period: BillingPeriod,
    pub amount: i64,
    pub buyer: SubjectId,
    pub started_at: Timestamp,
}

impl PaymentAttempt {
    /// Starts an attempt for `plan`, pricing it for `period`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the plan is not purchasable.
    pub fn start(
        plan: &Plan,
        period: BillingPeriod,
        buyer: SubjectId,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        plan.validate_for_checkout()?;

        Ok(Self {
            merchant_order_id: MerchantOrderId::generate_at(now),
            plan_id: plan.id,
            plan_key: plan.key(),
            plan_display_name: plan.display_name(),
            billing_period: period,
            amount: plan.amount_for(period)?,
            buyer,
            started_at: now,
        })
    }

    /// Product name shown in the gateway UI, e.g. `LottoMate+ STANDARD monthly`.
    pub fn product_name(&self) -> String {
        format!(
            "{} {} {}",
            PRODUCT_BRAND,
            self.plan_display_name,
            self.billing_period.label()
        )
    }

    pub fn recurrence(&self) -> Option<Recurrence> {
        self.billing_period.recurrence(self.started_at)
    }

    /// Whether a gateway callback belongs to this attempt.
    pub fn owns_order(&self, echoed: &MerchantOrderId) -> bool {
        &self.merchant_order_id == echoed
    }
}
