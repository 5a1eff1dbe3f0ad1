//! Platform-wide figures for super admins.

use serde::{Deserialize, Serialize};

/// Response of `GET /api/superadmin/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    #[serde(default)]
    pub total_workspaces: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub published_episodes: u64,
    #[serde(default)]
    pub active_renders: u64,
    #[serde(default)]
    pub mrr_cents: i64,
}
