//! Billing periods and checkout amount computation.
//!
//! Amounts are whole KRW. A yearly charge is ten monthly units, i.e. two
//! months free.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Yearly price expressed in monthly units.
pub const YEARLY_MONTHS_CHARGED: i64 = 10;

/// Largest plan price accepted from the server, in won.
pub const MAX_PLAN_PRICE: i64 = 1_000_000_000_000;

/// How often the buyer is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    /// Wire label, also used in product names.
    pub fn label(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
        }
    }

    /// Only monthly subscriptions are registered as recurring with the gateway.
    pub fn recurrence(&self, starting: Timestamp) -> Option<Recurrence> {
        match self {
            BillingPeriod::Monthly => Some(Recurrence::monthly_from(starting)),
            BillingPeriod::Yearly => None,
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recurring-charge schedule handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Months between charges.
    pub interval_months: u32,
    /// Charges per interval.
    pub interval_count: u32,
    /// First charge date as `YYYYMMDD`.
    pub start_date: String,
    /// Last charge date as `YYYYMMDD`; `None` runs until cancelled.
    pub end_date: Option<String>,
}

impl Recurrence {
    pub fn monthly_from(starting: Timestamp) -> Self {
        Self {
            interval_months: 1,
            interval_count: 1,
            start_date: starting.compact_date(),
            end_date: None,
        }
    }
}

/// Price of one month of a plan.
///
/// Plans lasting one month or less are priced per month already; longer plans
/// are spread evenly and rounded to the nearest won.
pub fn monthly_unit_price(price: i64, duration_months: u32) -> i64 {
    if duration_months <= 1 {
        price
    } else {
        (price as f64 / duration_months as f64).round() as i64
    }
}

/// Amount charged for one checkout of a plan.
///
/// # Errors
///
/// Returns `ValidationError::OutOfRange` when the amount does not fit in an
/// `i64`.
pub fn checkout_amount(
    price: i64,
    duration_months: u32,
    period: BillingPeriod,
) -> Result<i64, ValidationError> {
    let unit = monthly_unit_price(price, duration_months);
    match period {
        BillingPeriod::Monthly => Ok(unit),
        BillingPeriod::Yearly => unit
            .checked_mul(YEARLY_MONTHS_CHARGED)
            .ok_or_else(|| ValidationError::out_of_range("plan.price", 0, MAX_PLAN_PRICE, price)),
    }
}
