//! Typed cache keys.
//!
//! A [`QueryKey`] is an ordered list of string segments: the family name
//! first, then the workspace id for workspace-scoped families, then any
//! narrower ids. Keys are only built through the functions in this module,
//! so invalidation prefixes and fetch keys can never drift apart.

use std::fmt;

use studioai_core::episode_tabs::{EpisodeTab, TabData};
use studioai_core::models::episode::EpisodeListParams;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryKey(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn family(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    /// Segment-wise prefix match. An empty prefix matches every key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }

    /// The workspace this key belongs to, if its family is workspace-scoped.
    pub fn workspace_id(&self) -> Option<&str> {
        if GLOBAL_FAMILIES.contains(&self.family()) {
            return None;
        }
        self.0.get(1).map(String::as_str)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Families whose keys are not tied to a workspace.
const GLOBAL_FAMILIES: &[&str] = &[
    "me",
    "workspaces",
    "pipeline-health",
    "pipeline-global-queue",
    "billing-plans",
    "superadmin-stats",
    "superadmin-workspaces",
    "superadmin-render-queue",
];

/// Families whose second segment is a workspace id.
const WORKSPACE_FAMILIES: &[&str] = &[
    "workspace",
    "workspace-usage",
    "workspace-members",
    "voice-actors",
    "notifications",
    "notification-count",
    "review-queue",
    "pipeline",
    "recent-activity",
    "billing-subscription",
    "shows",
    "show",
    "show-production-profile",
    "episodes",
    "episode",
    "episode-logs",
    "scenes",
    "characters",
    "character",
    "character-production",
];

/// One prefix per workspace-scoped family, covering all of `wid`'s data.
pub fn workspace_prefixes(wid: &str) -> Vec<QueryKey> {
    WORKSPACE_FAMILIES
        .iter()
        .map(|family| QueryKey::new([*family, wid]))
        .collect()
}

/// Prefix for one family within one workspace.
pub fn family_in(name: &str, wid: &str) -> QueryKey {
    QueryKey::new([name, wid])
}

/// Every key.
pub fn all() -> QueryKey {
    QueryKey(Vec::new())
}

/// Prefix for one family across all workspaces.
pub fn family(name: &str) -> QueryKey {
    QueryKey::new([name])
}

pub fn me() -> QueryKey {
    QueryKey::new(["me"])
}

/// Workspaces the current user belongs to.
pub fn workspaces() -> QueryKey {
    QueryKey::new(["workspaces"])
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

pub fn workspace(wid: &str) -> QueryKey {
    QueryKey::new(["workspace", wid])
}

pub fn workspace_usage(wid: &str) -> QueryKey {
    QueryKey::new(["workspace-usage", wid])
}

pub fn workspace_members(wid: &str) -> QueryKey {
    QueryKey::new(["workspace-members", wid])
}

pub fn voice_actors(wid: &str) -> QueryKey {
    QueryKey::new(["voice-actors", wid])
}

pub fn notifications(wid: &str) -> QueryKey {
    QueryKey::new(["notifications", wid])
}

pub fn notification_count(wid: &str) -> QueryKey {
    QueryKey::new(["notification-count", wid])
}

pub fn review_queue(wid: &str) -> QueryKey {
    QueryKey::new(["review-queue", wid])
}

pub fn pipeline(wid: &str) -> QueryKey {
    QueryKey::new(["pipeline", wid])
}

pub fn recent_activity(wid: &str) -> QueryKey {
    QueryKey::new(["recent-activity", wid])
}

pub fn billing_subscription(wid: &str) -> QueryKey {
    QueryKey::new(["billing-subscription", wid])
}

// ---------------------------------------------------------------------------
// Shows and children
// ---------------------------------------------------------------------------

pub fn shows(wid: &str) -> QueryKey {
    QueryKey::new(["shows", wid])
}

pub fn show(wid: &str, sid: &str) -> QueryKey {
    QueryKey::new(["show", wid, sid])
}

pub fn show_production_profile(wid: &str, sid: &str) -> QueryKey {
    QueryKey::new(["show-production-profile", wid, sid])
}

/// Prefix covering every filtered listing of a show's episodes.
pub fn episodes_of(wid: &str, sid: &str) -> QueryKey {
    QueryKey::new(["episodes", wid, sid])
}

pub fn episodes(wid: &str, sid: &str, params: &EpisodeListParams) -> QueryKey {
    let params = params
        .query_pairs()
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    QueryKey::new(["episodes", wid, sid, params.as_str()])
}

pub fn episode(wid: &str, sid: &str, eid: &str) -> QueryKey {
    QueryKey::new(["episode", wid, sid, eid])
}

pub fn episode_logs(wid: &str, eid: &str) -> QueryKey {
    QueryKey::new(["episode-logs", wid, eid])
}

/// Keys the given episode detail tab reads.
pub fn episode_tab(wid: &str, sid: &str, eid: &str, tab: EpisodeTab) -> Vec<QueryKey> {
    tab.data()
        .iter()
        .map(|data| match data {
            TabData::Episode => episode(wid, sid, eid),
            TabData::Scenes => scenes(wid, sid, eid),
            TabData::PipelineLog => episode_logs(wid, eid),
        })
        .collect()
}

pub fn scenes(wid: &str, sid: &str, eid: &str) -> QueryKey {
    QueryKey::new(["scenes", wid, sid, eid])
}

pub fn characters(wid: &str, sid: &str) -> QueryKey {
    QueryKey::new(["characters", wid, sid])
}

pub fn character(wid: &str, sid: &str, cid: &str) -> QueryKey {
    QueryKey::new(["character", wid, sid, cid])
}

pub fn character_production(wid: &str, sid: &str, cid: &str) -> QueryKey {
    QueryKey::new(["character-production", wid, sid, cid])
}

// ---------------------------------------------------------------------------
// Global
// ---------------------------------------------------------------------------

pub fn pipeline_health() -> QueryKey {
    QueryKey::new(["pipeline-health"])
}

pub fn pipeline_global_queue() -> QueryKey {
    QueryKey::new(["pipeline-global-queue"])
}

pub fn billing_plans() -> QueryKey {
    QueryKey::new(["billing-plans"])
}

pub fn superadmin_stats() -> QueryKey {
    QueryKey::new(["superadmin-stats"])
}

pub fn superadmin_workspaces() -> QueryKey {
    QueryKey::new(["superadmin-workspaces"])
}

pub fn superadmin_render_queue() -> QueryKey {
    QueryKey::new(["superadmin-render-queue"])
}
