//! File-based Session Storage Adapter
//!
//! Durable tier: keeps the flat session map in a single YAML file so a session
//! survives process restarts. Every write rewrites the whole file through a
//! temporary sibling and a rename. On Unix the file is readable by its owner
//! only.
//!
//! A file that no longer parses is reported on reads and replaced by the next
//! write, so a damaged file never locks the user out of signing in again.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Owner read/write only; the file holds credentials.
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

use crate::ports::{SessionStorage, StorageError};

/// File-backed storage for session entries
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Create a file storage at the given path
    ///
    /// # Arguments
    /// * `path` - The YAML file holding the entries; created on first write
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileSessionStorage::new("./data/session.yaml");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !fs::try_exists(&self.path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?
        {
            return Ok(BTreeMap::new());
        }

        let yaml = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        if yaml.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_yaml::from_str(&yaml).map_err(|e| StorageError::DeserializationFailed(e.to_string()))
    }

    /// Loads entries for a read-modify-write.
    ///
    /// Returns the entries and whether the file on disk was unreadable and
    /// must be rewritten.
    async fn load_for_write(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.load().await {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::DeserializationFailed(reason)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Replacing unreadable session file: {}",
                    reason
                );
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::IoError(e.to_string()))?;
        }

        let yaml = serde_yaml::to_string(entries)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        let temp = self.temp_path();
        // A leftover from an interrupted write may carry looser permissions.
        let _ = fs::remove_file(&temp).await;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(SESSION_FILE_MODE);

        let mut file = options
            .open(&temp)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        file.write_all(yaml.as_bytes())
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        drop(file);

        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.load().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let (mut entries, _) = self.load_for_write().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let (mut entries, unreadable) = self.load_for_write().await?;
        if entries.remove(key).is_none() && !unreadable {
            return Ok(());
        }
        self.save(&entries).await
    }

    fn tier_name(&self) -> &'static str {
        "durable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> FileSessionStorage {
        FileSessionStorage::new(dir.path().join("nested").join("session.yaml"))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        assert!(storage.get("token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn values_survive_a_new_instance() {
        let dir = TempDir::new().unwrap();
        storage_in(&dir).set("token", "abc").await.unwrap();
        storage_in(&dir).set("email", "user@example.com").await.unwrap();

        let reopened = storage_in(&dir);
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(
            reopened.get("email").await.unwrap().as_deref(),
            Some("user@example.com")
        );
    }

    #[tokio::test]
    async fn remove_deletes_only_that_key() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.set("token", "abc").await.unwrap();
        storage.set("rememberMe", "true").await.unwrap();

        storage.remove("token").await.unwrap();
        storage.remove("token").await.unwrap();

        assert!(storage.get("token").await.unwrap().is_none());
        assert_eq!(storage.get("rememberMe").await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir_all(storage.path().parent().unwrap()).await.unwrap();
        fs::write(storage.path(), "- not\n- a map\n").await.unwrap();

        assert!(matches!(
            storage.get("token").await,
            Err(StorageError::DeserializationFailed(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_file_is_replaced_by_next_write() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir_all(storage.path().parent().unwrap()).await.unwrap();
        fs::write(storage.path(), "token: [unterminated").await.unwrap();

        storage.set("token", "abc").await.unwrap();

        assert_eq!(storage.get("token").await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn remove_scrubs_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir_all(storage.path().parent().unwrap()).await.unwrap();
        fs::write(storage.path(), "token: [unterminated").await.unwrap();

        storage.remove("token").await.unwrap();

        assert!(storage.get("token").await.unwrap().is_none());
        assert!(storage.get("email").await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_private_to_its_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.set("token", "abc").await.unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn no_temp_file_is_left_behind() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.set("token", "abc").await.unwrap();
        assert!(!storage.temp_path().exists());
    }
}
