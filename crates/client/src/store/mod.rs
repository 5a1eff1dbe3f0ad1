//! Client-side state containers.
//!
//! Each store owns an in-memory snapshot behind a lock and mirrors it to a
//! shared [`Storage`]. Storage failures are logged and never propagated;
//! the in-memory snapshot stays authoritative for the running process.

mod session;
mod storage;
mod ui;
mod workspace;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use session::{AuthPayload, SessionSnapshot, SessionStore};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use ui::{Theme, UiSnapshot, UiStore};
pub use workspace::{WorkspaceSnapshot, WorkspaceStore};

/// Persisted key names.
pub mod keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const AUTH_USER: &str = "auth_user";
    pub const AUTH_WORKSPACES: &str = "auth_workspaces";
    pub const ACTIVE_WORKSPACE: &str = "active_workspace";
    pub const THEME: &str = "studioai-theme";
}

/// The three stores over one storage backend.
#[derive(Clone)]
pub struct Stores {
    pub session: Arc<SessionStore>,
    pub workspace: Arc<WorkspaceStore>,
    pub ui: Arc<UiStore>,
}

impl Stores {
    /// Build all stores, restoring whatever `storage` already holds.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            session: Arc::new(SessionStore::load(storage.clone())),
            workspace: Arc::new(WorkspaceStore::load(storage.clone())),
            ui: Arc::new(UiStore::load(storage)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// End the session and forget the active workspace.
    pub fn logout(&self) {
        self.session.logout();
        self.workspace.clear_workspace();
    }
}


// ---------------------------------------------------------------------------
// Helpers shared by the stores
// ---------------------------------------------------------------------------

/// Snapshots are replaced whole, so a panic while the lock was held cannot
/// leave a half-written state behind; recover instead of dropping writes.
fn read_state<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_state<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring unreadable stored value");
            None
        }
    }
}

fn write_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|raw| storage.set(key, &raw));
    if let Err(e) = result {
        tracing::warn!(key, error = %e, "Failed to persist client state");
    }
}

fn remove_key(storage: &dyn Storage, key: &str) {
    if let Err(e) = storage.remove(key) {
        tracing::warn!(key, error = %e, "Failed to remove client state");
    }
}
