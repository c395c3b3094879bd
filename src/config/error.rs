//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("API base URL must use HTTPS in production")]
    BaseUrlMustBeHttps,

    #[error("Expiry leeway must be between 0 and 3600 seconds")]
    InvalidExpiryLeeway,

    #[error("Gateway prompt buffer must be at least 1")]
    InvalidPromptBuffer,
}
