//! Typed reads and writes per backend resource.
//!
//! Reads return a [`Query`](crate::Query) bound to a cache key; writes run
//! through the mutation runner so invalidation and toasts stay uniform.
//! Workspace-scoped calls use the active workspace from the workspace
//! store and fail with [`ClientError::NoWorkspace`](crate::ClientError)
//! when none is selected.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::keys::QueryKey;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

mod auth;
mod billing;
mod characters;
mod episodes;
mod notifications;
mod pipeline;
mod production;
mod scenes;
mod shows;
mod superadmin;
mod workspaces;

pub use auth::AuthOutcome;

/// Poll interval for fast-moving pipeline views.
pub const FAST_POLL: Duration = Duration::from_secs(10);

/// Poll interval for counters and queues.
pub const SLOW_POLL: Duration = Duration::from_secs(30);

impl StudioClient {
    /// A cached `GET {path}` with fixed query pairs.
    pub(crate) fn get_query<T>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        path: String,
        params: Vec<(&'static str, String)>,
    ) -> Query<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let api = self.api.clone();
        self.queries.query(key, options, move || {
            let api = api.clone();
            let path = path.clone();
            let params = params.clone();
            async move { api.get(&path, &params).await }
        })
    }
}

pub(crate) fn workspace_path(wid: &str, rest: &str) -> String {
    format!("/api/workspaces/{wid}{rest}")
}

pub(crate) fn show_path(wid: &str, sid: &str, rest: &str) -> String {
    workspace_path(wid, &format!("/shows/{sid}{rest}"))
}

pub(crate) fn episode_path(wid: &str, sid: &str, eid: &str, rest: &str) -> String {
    show_path(wid, sid, &format!("/episodes/{eid}{rest}"))
}

pub(crate) fn character_path(wid: &str, sid: &str, cid: &str, rest: &str) -> String {
    show_path(wid, sid, &format!("/characters/{cid}{rest}"))
}
