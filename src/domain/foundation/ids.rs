//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{Timestamp, ValidationError};

/// Identifies the signed-in user (an email address in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a SubjectId, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(ValidationError::empty_field("subject_id"));
        }
        Ok(Self(value))
    }

    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned identifier of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(i64);

impl PlanId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned identifier of a subscription record.
///
/// Kept as a string because the server has returned both numeric and
/// textual identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl<'de> Deserialize<'de> for SubscriptionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self::new(s).map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(Self(n.to_string())),
        }
    }
}

impl SubscriptionId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("subscription_id"));
        }
        Ok(Self(value))
    }

    /// Reads an identifier from a JSON string or number.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::new(s.clone()).ok(),
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the payment gateway assigns to a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayTransactionId(String);

impl GatewayTransactionId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("gateway_transaction_id"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Length of the random suffix in a merchant order id.
const ORDER_SUFFIX_LEN: usize = 11;

/// Client-generated identifier correlating one checkout attempt across the
/// gateway callback and the server verification call.
///
/// Format: `subscription_{unix_millis}_{11 lowercase alphanumerics}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantOrderId(String);

impl MerchantOrderId {
    /// Generates a fresh order id for the given instant.
    pub fn generate_at(at: Timestamp) -> Self {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(ORDER_SUFFIX_LEN)
            .collect();
        Self(format!(
            "subscription_{}_{}",
            at.as_datetime().timestamp_millis(),
            suffix
        ))
    }

    /// Wraps an order id echoed back by the gateway.
    pub fn from_echo(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MerchantOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn subject_id_trims_and_rejects_blank() {
        assert_eq!(
            SubjectId::new("  user@example.com ").unwrap().as_str(),
            "user@example.com"
        );
        assert!(SubjectId::new("   ").is_err());
    }

    #[test]
    fn subscription_id_reads_numbers_and_strings() {
        let numeric = SubscriptionId::from_json(&serde_json::json!(42)).unwrap();
        let textual = SubscriptionId::from_json(&serde_json::json!("sub_9")).unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(textual.as_str(), "sub_9");
        assert!(SubscriptionId::from_json(&serde_json::json!(null)).is_none());
    }

    #[test]
    fn subscription_id_deserializes_from_either_form() {
        let a: SubscriptionId = serde_json::from_str("17").unwrap();
        let b: SubscriptionId = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<SubscriptionId>("\"\"").is_err());
    }

    #[test]
    fn merchant_order_id_has_expected_shape() {
        let at = Timestamp::from_unix_millis(1_700_000_000_123).unwrap();
        let id = MerchantOrderId::generate_at(at);
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "subscription");
        assert_eq!(parts[1], "1700000000123");
        assert_eq!(parts[2].len(), 11);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn merchant_order_ids_do_not_collide() {
        let at = Timestamp::now();
        let ids: HashSet<MerchantOrderId> =
            (0..500).map(|_| MerchantOrderId::generate_at(at)).collect();
        assert_eq!(ids.len(), 500);
    }
}
