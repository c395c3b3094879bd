//! Payment gateway configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::CheckoutSettings;

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Merchant identifier the gateway is initialized with
    #[serde(default = "default_merchant_id")]
    pub merchant_id: String,

    /// Payment processor routed through the gateway
    #[serde(default = "default_pg")]
    pub pg: String,

    /// Payment method offered at checkout
    #[serde(default = "default_pay_method")]
    pub pay_method: String,

    /// Payment prompts that may queue for the UI host
    #[serde(default = "default_prompt_buffer")]
    pub prompt_buffer: usize,
}

impl GatewayConfig {
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            merchant_id: self.merchant_id.clone(),
            pg: self.pg.clone(),
            pay_method: self.pay_method.clone(),
        }
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.merchant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("gateway.merchant_id"));
        }
        if self.pg.trim().is_empty() {
            return Err(ValidationError::MissingRequired("gateway.pg"));
        }
        if self.pay_method.trim().is_empty() {
            return Err(ValidationError::MissingRequired("gateway.pay_method"));
        }
        if self.prompt_buffer == 0 {
            return Err(ValidationError::InvalidPromptBuffer);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            merchant_id: default_merchant_id(),
            pg: default_pg(),
            pay_method: default_pay_method(),
            prompt_buffer: default_prompt_buffer(),
        }
    }
}

fn default_merchant_id() -> String {
    "imp70056657".to_string()
}

fn default_pg() -> String {
    "tosspayments".to_string()
}

fn default_pay_method() -> String {
    "card".to_string()
}

fn default_prompt_buffer() -> usize {
    1
}
