//! Realtime-driven cache invalidation.
//!
//! Record changes pushed by the realtime server mark the matching cache
//! prefixes stale. Observed keys refetch right away; the pushed record
//! itself is never written into the cache.

use studioai_realtime::event::workspace_filter;
use studioai_realtime::{RealtimeBridge, RecordEvent, Subscription};

use crate::error::ClientError;
use crate::keys::{self, QueryKey};
use crate::query::QueryClient;
use crate::StudioClient;

/// Collections the client follows per workspace, with the key families a
/// change in each one makes stale.
pub const WATCHED_COLLECTIONS: &[(&str, &[&str])] = &[
    ("render_jobs", &["pipeline", "episode-logs"]),
    ("episodes", &["episodes", "episode", "review-queue", "workspace-usage"]),
    ("notifications", &["notifications", "notification-count"]),
    ("pipeline_logs", &["recent-activity", "episode-logs", "episodes"]),
];

/// Subscribe to `collection` and invalidate `prefixes` on every change.
pub fn invalidate_on_change(
    bridge: &RealtimeBridge,
    queries: QueryClient,
    collection: &str,
    filter: Option<&str>,
    prefixes: Vec<QueryKey>,
) -> Subscription {
    let name = collection.to_string();
    bridge.subscribe(collection, filter, move |event: RecordEvent| {
        tracing::debug!(
            collection = %name,
            action = ?event.action,
            record_id = event.record_id().unwrap_or_default(),
            "Realtime change"
        );
        let queries = queries.clone();
        let prefixes = prefixes.clone();
        tokio::spawn(async move {
            for prefix in &prefixes {
                queries.invalidate_queries(prefix).await;
            }
        });
    })
}

impl StudioClient {
    /// Follow every collection in [`WATCHED_COLLECTIONS`] for the active
    /// workspace. Dropping the returned guards ends the subscriptions.
    pub fn follow_workspace(&self, bridge: &RealtimeBridge) -> Result<Vec<Subscription>, ClientError> {
        let wid = self.workspace_id()?;
        let filter = workspace_filter(&wid);
        tracing::info!(workspace_id = %wid, "Following workspace changes");
        Ok(WATCHED_COLLECTIONS
            .iter()
            .map(|(collection, families)| {
                let prefixes = families
                    .iter()
                    .map(|family| keys::family_in(family, &wid))
                    .collect();
                invalidate_on_change(bridge, self.queries.clone(), collection, Some(&filter), prefixes)
            })
            .collect())
    }
}
