//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `LOTTOMATE_` prefix and nested values use double underscores as separators.
//! Every value has a default, so an empty environment yields a working
//! development setup.
//!
//! # Example
//!
//! ```no_run
//! use lottomate_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("API at {}", config.api.resolved_base_url());
//! ```

mod api;
mod error;
mod gateway;
mod session;

pub use api::{ApiConfig, Environment};
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Backend API configuration (environment, base URL, timeout)
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence and refresh
    #[serde(default)]
    pub session: SessionConfig,

    /// Payment gateway (merchant, processor)
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// A `.env` file in the working directory is applied first when present.
    /// Variables carry the `LOTTOMATE` prefix and nest with `__`:
    ///
    /// - `LOTTOMATE__API__ENVIRONMENT=production` -> `api.environment`
    /// - `LOTTOMATE__SESSION__EXPIRY_LEEWAY_SECS=30` -> `session.expiry_leeway_secs`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadError` when a variable does not parse.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LOTTOMATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        self.session.validate()?;
        self.gateway.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.api.is_production()
    }
}
