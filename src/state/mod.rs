//! State management.
//!
//! This module records what dirconfig manages on the server: one
//! [`ResourceState`] per declared address, persisted by a [`StateStore`]
//! guarded by a lock file.

mod local;
mod lock;
mod store;
mod types;

pub use local::LocalStateStore;
pub use lock::{LOCK_EXPIRY_SECS, LockInfo, generate_holder_id};
pub use store::StateStore;
pub use types::{ProviderState, ResourceState, ResourceStatus, STATE_VERSION};
