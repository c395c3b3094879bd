//! Session Storage Port - flat key/value persistence for one storage tier.
//!
//! A session store owns two of these: a durable tier that survives restarts
//! and an ephemeral tier that does not. Values are plain strings under the
//! fixed keys in `domain::session::keys`.

use async_trait::async_trait;

/// Errors that can occur during session storage operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to serialize session entries: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session entries: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for one tier of session persistence
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read a value
    ///
    /// # Returns
    /// `None` when the key is absent
    ///
    /// # Errors
    /// Returns `StorageError` if the tier cannot be read
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any existing one
    ///
    /// # Errors
    /// Returns `StorageError` if the write fails
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; removing an absent key succeeds
    ///
    /// # Errors
    /// Returns `StorageError` if the tier cannot be written
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Short label for logs
    fn tier_name(&self) -> &'static str;
}
