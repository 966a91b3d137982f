//! Local file state backend.
//!
//! Layout below the state directory:
//! - `state.json`: the [`ProviderState`], replaced atomically on save
//! - `state.lock`: the current [`LockInfo`], if any

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Result, StateError};

use super::lock::{LOCK_EXPIRY_SECS, LockInfo, generate_holder_id};
use super::store::StateStore;
use super::types::{ProviderState, STATE_VERSION};

/// State file name.
const STATE_FILE: &str = "state.json";

/// Lock file name.
const LOCK_FILE: &str = "state.lock";

/// File-based state store.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    base_dir: PathBuf,
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalStateStore {
    /// Creates a store in `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let state_path = base_dir.join(STATE_FILE);
        let lock_path = base_dir.join(LOCK_FILE);

        Self {
            base_dir,
            state_path,
            lock_path,
        }
    }

    /// Path of `state.json`.
    #[must_use]
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            debug!("Creating state directory: {}", self.base_dir.display());
            fs::create_dir_all(&self.base_dir)
                .await
                .map_err(|e| StateError::WriteFailed {
                    message: format!("Failed to create state directory: {e}"),
                })?;
        }
        Ok(())
    }

    async fn read_lock_file(&self) -> Result<Option<LockInfo>> {
        if !self.lock_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.lock_path)
            .await
            .map_err(|e| StateError::corrupted(format!("Failed to read lock file: {e}")))?;
        let lock_info = serde_json::from_str(&content)
            .map_err(|e| StateError::corrupted(format!("Failed to parse lock file: {e}")))?;

        Ok(Some(lock_info))
    }

    async fn write_lock_file(&self, lock_info: &LockInfo) -> Result<()> {
        self.ensure_dir().await?;

        let content = serde_json::to_string_pretty(lock_info)
            .map_err(|e| StateError::serialization(format!("Failed to serialize lock: {e}")))?;
        let lock_failed = |e: std::io::Error| StateError::LockFailed {
            message: format!("Failed to write lock file: {e}"),
        };

        let mut file = fs::File::create(&self.lock_path).await.map_err(lock_failed)?;
        file.write_all(content.as_bytes()).await.map_err(lock_failed)?;
        file.sync_all().await.map_err(lock_failed)?;
        Ok(())
    }

    async fn delete_lock_file(&self) -> Result<()> {
        if self.lock_path.exists() {
            fs::remove_file(&self.lock_path)
                .await
                .map_err(|e| StateError::LockFailed {
                    message: format!("Failed to delete lock file: {e}"),
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<Option<ProviderState>> {
        if !self.state_path.exists() {
            debug!("State file does not exist: {}", self.state_path.display());
            return Ok(None);
        }

        debug!("Loading state from: {}", self.state_path.display());
        let content = fs::read_to_string(&self.state_path)
            .await
            .map_err(|e| StateError::corrupted(format!("Failed to read state file: {e}")))?;
        let state: ProviderState = serde_json::from_str(&content)
            .map_err(|e| StateError::corrupted(format!("Failed to parse state file: {e}")))?;

        if state.version != STATE_VERSION {
            return Err(StateError::VersionMismatch {
                expected: STATE_VERSION.to_string(),
                found: state.version,
            }
            .into());
        }

        Ok(Some(state))
    }

    async fn save(&self, state: &ProviderState) -> Result<()> {
        self.ensure_dir().await?;

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StateError::serialization(format!("Failed to serialize state: {e}")))?;
        let write_failed = |e: std::io::Error| StateError::WriteFailed {
            message: format!("Failed to write state file: {e}"),
        };

        let temp_path = self.state_path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(write_failed)?;
        file.write_all(content.as_bytes()).await.map_err(write_failed)?;
        file.sync_all().await.map_err(write_failed)?;
        fs::rename(&temp_path, &self.state_path)
            .await
            .map_err(write_failed)?;

        debug!(serial = state.serial, "State saved to {}", self.state_path.display());
        Ok(())
    }

    async fn acquire_lock(&self, holder: &str, operation: &str) -> Result<LockInfo> {
        if let Some(existing) = self.read_lock_file().await? {
            if !existing.is_expired() {
                return Err(StateError::LockedByOther {
                    holder: existing.holder,
                    since: existing.acquired_at.to_rfc3339(),
                }
                .into());
            }
            warn!("Taking over expired state lock held by {}", existing.holder);
        }

        let holder_id = if holder.is_empty() {
            generate_holder_id()
        } else {
            holder.to_string()
        };

        let lock_info = LockInfo::new(&holder_id, operation);
        self.write_lock_file(&lock_info).await?;

        info!(
            "Acquired state lock: {} (expires in {}s)",
            lock_info.lock_id, LOCK_EXPIRY_SECS
        );
        Ok(lock_info)
    }

    async fn release_lock(&self, lock_id: &str) -> Result<()> {
        if let Some(existing) = self.read_lock_file().await? {
            if existing.lock_id == lock_id {
                self.delete_lock_file().await?;
                debug!("Released state lock: {lock_id}");
            } else {
                debug!("Lock ID mismatch: expected {lock_id}, found {}", existing.lock_id);
            }
        }
        Ok(())
    }

    async fn force_unlock(&self) -> Result<Option<LockInfo>> {
        let existing = self.read_lock_file().await?;
        if let Some(lock) = &existing {
            warn!("Force-removing state lock {lock}");
            self.delete_lock_file().await?;
        }
        Ok(existing)
    }

    async fn get_lock_info(&self) -> Result<Option<LockInfo>> {
        self.read_lock_file().await
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirConfigError;
    use crate::resources;
    use crate::state::{ResourceState, ResourceStatus};
    use crate::types::ResourceModel;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn create_test_store() -> (LocalStateStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = LocalStateStore::new(temp_dir.path().join(".dirconfig"));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = create_test_store();
        assert!(store.load().await.expect("load").is_none());

        let schema = resources::lookup("location").expect("registered");
        let mut state = ProviderState::new();
        state.upsert(ResourceState::from_model(
            "location.hq",
            &schema,
            &ResourceModel::new(),
            ResourceStatus::Created,
            None,
        ));
        store.save(&state).await.expect("save");

        let loaded = store.load().await.expect("load").expect("state exists");
        assert_eq!(loaded, state);
        assert!(!store.state_path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let (store, _temp) = create_test_store();
        let mut state = ProviderState::new();
        state.version = String::from("0");
        store.save(&state).await.expect("save");

        let err = store.load().await.expect_err("old version");
        assert!(matches!(err, DirConfigError::State(StateError::VersionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_corrupted_file() {
        let (store, _temp) = create_test_store();
        store.ensure_dir().await.expect("mkdir");
        fs::write(store.state_path(), "{not json").await.expect("write");

        let err = store.load().await.expect_err("corrupted");
        assert!(matches!(err, DirConfigError::State(StateError::Corrupted { .. })));
    }

    #[tokio::test]
    async fn test_lock_acquire_release() {
        let (store, _temp) = create_test_store();

        let lock = store.acquire_lock("", "apply").await.expect("acquire");
        assert!(lock.holder.contains(&std::process::id().to_string()));

        let err = store
            .acquire_lock("other", "plan")
            .await
            .expect_err("already locked");
        assert!(matches!(err, DirConfigError::State(StateError::LockedByOther { .. })));

        store.release_lock("someone-else").await.expect("ignored");
        assert!(store.get_lock_info().await.expect("read").is_some());

        store.release_lock(&lock.lock_id).await.expect("release");
        assert!(store.get_lock_info().await.expect("read").is_none());
    }

    #[tokio::test]
    async fn test_expired_lock_is_taken_over() {
        let (store, _temp) = create_test_store();
        let mut stale = LockInfo::new("crashed-1-abcd", "apply");
        stale.expires_at = Utc::now() - Duration::seconds(1);
        store.write_lock_file(&stale).await.expect("write");

        let lock = store.acquire_lock("me", "apply").await.expect("takeover");
        assert_eq!(lock.holder, "me");
        assert_ne!(lock.lock_id, stale.lock_id);
    }

    #[tokio::test]
    async fn test_force_unlock() {
        let (store, _temp) = create_test_store();
        assert!(store.force_unlock().await.expect("no lock").is_none());

        store.acquire_lock("other", "apply").await.expect("acquire");
        let removed = store.force_unlock().await.expect("unlock").expect("had lock");
        assert_eq!(removed.holder, "other");
        assert!(store.get_lock_info().await.expect("read").is_none());
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let (store, temp) = create_test_store();
        assert_eq!(store.backend_type(), "local");
        assert_eq!(store.state_path(), temp.path().join(".dirconfig").join("state.json"));

        let loaded = tokio_test::block_on(store.load()).expect("load");
        assert!(loaded.is_none());
        assert!(!temp.path().join(".dirconfig").exists());
    }
}
