//! Session persistence and refresh configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::application::RefreshPolicy;

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// File backing the durable session tier
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Refresh endpoint, relative to the API base URL
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Seconds before `exp` at which a credential counts as expired
    #[serde(default)]
    pub expiry_leeway_secs: i64,
}

impl SessionConfig {
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            refresh_path: self.refresh_path.clone(),
            expiry_leeway_secs: self.expiry_leeway_secs,
        }
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("session.storage_path"));
        }
        if self.refresh_path.trim_matches('/').is_empty() {
            return Err(ValidationError::MissingRequired("session.refresh_path"));
        }
        if !(0..=3600).contains(&self.expiry_leeway_secs) {
            return Err(ValidationError::InvalidExpiryLeeway);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            refresh_path: default_refresh_path(),
            expiry_leeway_secs: 0,
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".lottomate/session.yaml")
}

fn default_refresh_path() -> String {
    crate::application::credential_manager::DEFAULT_REFRESH_PATH.to_string()
}
