use std::sync::{Arc, RwLock};

use studioai_core::models::show::Show;
use studioai_core::models::workspace::Workspace;
use studioai_core::types::RecordId;

use super::{keys, read_json, read_state, remove_key, write_json, write_state, Storage};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceSnapshot {
    pub active_workspace: Option<Workspace>,
    /// In-memory only; reset whenever the workspace changes.
    pub active_show: Option<Show>,
}

/// The active workspace and show selection.
pub struct WorkspaceStore {
    storage: Arc<dyn Storage>,
    state: RwLock<WorkspaceSnapshot>,
}

impl WorkspaceStore {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let active_workspace = read_json(storage.as_ref(), keys::ACTIVE_WORKSPACE);
        Self {
            storage,
            state: RwLock::new(WorkspaceSnapshot {
                active_workspace,
                active_show: None,
            }),
        }
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        read_state(&self.state).clone()
    }

    /// Persist and activate `workspace`, resetting the active show.
    pub fn set_workspace(&self, workspace: Workspace) {
        write_json(self.storage.as_ref(), keys::ACTIVE_WORKSPACE, &workspace);
        tracing::info!(workspace_id = %workspace.id, "Active workspace set");
        let mut state = write_state(&self.state);
        state.active_workspace = Some(workspace);
        state.active_show = None;
    }

    pub fn set_active_show(&self, show: Option<Show>) {
        write_state(&self.state).active_show = show;
    }

    pub fn clear_workspace(&self) {
        remove_key(self.storage.as_ref(), keys::ACTIVE_WORKSPACE);
        *write_state(&self.state) = WorkspaceSnapshot::default();
    }

    pub fn active_workspace(&self) -> Option<Workspace> {
        read_state(&self.state).active_workspace.clone()
    }

    pub fn active_workspace_id(&self) -> Option<RecordId> {
        read_state(&self.state)
            .active_workspace
            .as_ref()
            .map(|w| w.id.clone())
    }

    /// Panic while holding the write lock, leaving it poisoned.
    #[cfg(test)]
    pub(super) fn poison_for_test(&self) {
        let _guard = write_state(&self.state);
        panic!("poisoning workspace lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    fn workspace(id: &str) -> Workspace {
        serde_json::from_value(serde_json::json!({ "id": id, "plan": "pro" })).unwrap()
    }

    fn show(id: &str) -> Show {
        serde_json::from_value(serde_json::json!({ "id": id })).unwrap()
    }

    #[test]
    fn switching_workspace_resets_show() {
        let store = WorkspaceStore::load(Arc::new(MemoryStorage::new()));
        store.set_workspace(workspace("w1"));
        store.set_active_show(Some(show("s1")));
        assert!(store.snapshot().active_show.is_some());

        store.set_workspace(workspace("w2"));
        let snap = store.snapshot();
        assert_eq!(snap.active_workspace.unwrap().id, "w2");
        assert_eq!(snap.active_show, None);
    }

    #[test]
    fn active_workspace_is_restored_but_show_is_not() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let store = WorkspaceStore::load(storage.clone());
        store.set_workspace(workspace("w1"));
        store.set_active_show(Some(show("s1")));

        let restored = WorkspaceStore::load(storage.clone());
        assert_eq!(restored.active_workspace_id().as_deref(), Some("w1"));
        assert_eq!(restored.snapshot().active_show, None);

        restored.clear_workspace();
        assert_eq!(restored.active_workspace_id(), None);
        assert_eq!(storage.get(keys::ACTIVE_WORKSPACE), None);
    }
}
