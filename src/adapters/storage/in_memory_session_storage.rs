//! In-Memory Session Storage Adapter
//!
//! Ephemeral tier: entries live as long as this value (or a clone of it).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{SessionStorage, StorageError};

/// In-memory storage for session entries
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStorage {
    /// Create a new, empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry, as closing the client context would
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn tier_name(&self) -> &'static str {
        "ephemeral"
    }
}
