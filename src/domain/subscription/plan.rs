//! Subscription plans and the plan catalog shown at checkout.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

use super::billing::{checkout_amount, BillingPeriod, MAX_PLAN_PRICE};
use crate::domain::foundation::{PlanId, ValidationError};

/// Plan key preselected when present.
const DEFAULT_PLAN_KEY: &str = "standard";

/// A named subscription tier as served by `subscription/plans*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    #[serde(with = "won")]
    pub price: i64,
    pub duration_months: u32,
    #[serde(rename = "maxLottoNumbers", default)]
    pub max_saved_numbers: Option<u32>,
    #[serde(rename = "features", default, with = "feature_list")]
    pub feature_list: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Plan {
    /// Lowercased name used as a stable lookup key.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Name as shown on receipts and in the gateway UI.
    pub fn display_name(&self) -> String {
        self.name.to_uppercase()
    }

    /// # Errors
    ///
    /// Returns `ValidationError::OutOfRange` when the price is too large to
    /// charge for `period`.
    pub fn amount_for(&self, period: BillingPeriod) -> Result<i64, ValidationError> {
        checkout_amount(self.price, self.duration_months, period)
    }

    /// Checks the plan can be purchased.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for inactive plans, non-positive prices, or a
    /// zero duration.
    pub fn validate_for_checkout(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("plan.name"));
        }
        if !self.is_active {
            return Err(ValidationError::invalid_format(
                "plan.is_active",
                format!("plan '{}' is not on sale", self.name),
            ));
        }
        if !(1..=MAX_PLAN_PRICE).contains(&self.price) {
            return Err(ValidationError::out_of_range(
                "plan.price",
                1,
                MAX_PLAN_PRICE,
                self.price,
            ));
        }
        if self.duration_months == 0 {
            return Err(ValidationError::out_of_range("plan.duration_months", 1, 120, 0));
        }
        Ok(())
    }
}

/// A plan with its checkout prices and the features it lacks relative to the
/// rest of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOffer {
    pub plan: Plan,
    pub monthly_price: i64,
    pub yearly_price: i64,
    pub not_included: Vec<String>,
}

/// Plans keyed by lowercased name, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanCatalog {
    offers: Vec<PlanOffer>,
}

impl PlanCatalog {
    pub fn from_plans(plans: Vec<Plan>) -> Self {
        let all_features: BTreeSet<String> = plans
            .iter()
            .flat_map(|p| p.feature_list.iter().cloned())
            .collect();

        let offers = plans
            .into_iter()
            .filter_map(|plan| {
                let prices = plan.amount_for(BillingPeriod::Monthly).and_then(|monthly| {
                    plan.amount_for(BillingPeriod::Yearly)
                        .map(|yearly| (monthly, yearly))
                });
                let (monthly_price, yearly_price) = match prices {
                    Ok(prices) => prices,
                    Err(e) => {
                        tracing::warn!(plan = %plan.name, "Leaving unpriceable plan out of catalog: {}", e);
                        return None;
                    }
                };
                let not_included = all_features
                    .iter()
                    .filter(|f| !plan.feature_list.contains(f))
                    .cloned()
                    .collect();
                Some(PlanOffer {
                    monthly_price,
                    yearly_price,
                    not_included,
                    plan,
                })
            })
            .collect();

        Self { offers }
    }

    pub fn offers(&self) -> &[PlanOffer] {
        &self.offers
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Looks up an offer by plan name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&PlanOffer> {
        let key = name.to_lowercase();
        self.offers.iter().find(|o| o.plan.key() == key)
    }

    /// `standard` when offered, otherwise the first plan.
    pub fn default_selection(&self) -> Option<&PlanOffer> {
        self.get(DEFAULT_PLAN_KEY).or_else(|| self.offers.first())
    }
}

/// Plan prices arrive as JSON numbers, possibly fractional, or as numeric
/// strings.
mod won {
    use super::*;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                serde::de::Error::custom(format!("price '{}' is not a number", s))
            })?,
        };
        if !raw.is_finite() {
            return Err(serde::de::Error::custom("price must be a finite number"));
        }
        let rounded = raw.round();
        if rounded < 0.0 || rounded > MAX_PLAN_PRICE as f64 {
            return Err(serde::de::Error::custom(format!(
                "price {} is outside 0..={}",
                raw, MAX_PLAN_PRICE
            )));
        }
        Ok(rounded as i64)
    }
}

/// Features travel as one comma-separated string.
mod feature_list {
    use super::*;

    pub fn serialize<S: Serializer>(value: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Csv(String),
            List(Vec<String>),
        }

        let items = match Option::<Raw>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Raw::Csv(s)) => s.split(',').map(str::to_string).collect(),
            Some(Raw::List(v)) => v,
        };

        Ok(items
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect())
    }
}
