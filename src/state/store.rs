//! State store trait.

use async_trait::async_trait;

use crate::error::Result;

use super::lock::LockInfo;
use super::types::ProviderState;

/// Persistent storage for [`ProviderState`] with a single-writer lock.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the state; `None` when nothing has been recorded yet.
    async fn load(&self) -> Result<Option<ProviderState>>;

    /// Replaces the stored state.
    async fn save(&self, state: &ProviderState) -> Result<()>;

    /// Acquires the lock for `operation`.
    ///
    /// Fails while another live lock exists; expired locks are taken over.
    async fn acquire_lock(&self, holder: &str, operation: &str) -> Result<LockInfo>;

    /// Releases the lock if `lock_id` still owns it.
    async fn release_lock(&self, lock_id: &str) -> Result<()>;

    /// Removes any lock regardless of owner.
    async fn force_unlock(&self) -> Result<Option<LockInfo>>;

    /// Current lock, if any.
    async fn get_lock_info(&self) -> Result<Option<LockInfo>>;

    /// Backend name for display.
    fn backend_type(&self) -> &'static str;
}
