//! Backend API configuration

use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const DEVELOPMENT_BASE_URL: &str = "http://localhost:8080/api";
const PRODUCTION_BASE_URL: &str = "https://lottomateapi.eeerrorcode.com/api";

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Environment name
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Overrides the environment's default base URL
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Application environment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ApiConfig {
    /// Base URL every request path is joined onto
    pub fn resolved_base_url(&self) -> &str {
        match (&self.base_url, &self.environment) {
            (Some(url), _) => url,
            (None, Environment::Production) => PRODUCTION_BASE_URL,
            (None, _) => DEVELOPMENT_BASE_URL,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Validate API configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }

        let url = Url::parse(self.resolved_base_url())
            .map_err(|e| ValidationError::InvalidBaseUrl(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ValidationError::InvalidBaseUrl(url.to_string()));
        }
        if self.is_production() && url.scheme() != "https" {
            return Err(ValidationError::BaseUrlMustBeHttps);
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            log_level: default_log_level(),
        }
    }
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_request_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info,lottomate_core=debug".to_string()
}
