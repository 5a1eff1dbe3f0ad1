//! Render queue entries and pipeline health, owned by the render server.

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

define_wire_enum! {
    /// Render job state as reported by the render server.
    RenderJobStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl Default for RenderJobStatus {
    fn default() -> Self {
        RenderJobStatus::Queued
    }
}

impl RenderJobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RenderJobStatus::Queued | RenderJobStatus::Running)
    }
}

/// A read-only render queue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: RecordId,
    #[serde(default)]
    pub episode: RecordId,
    #[serde(default)]
    pub workspace: RecordId,
    #[serde(default)]
    pub show: RecordId,
    #[serde(default)]
    pub status: RenderJobStatus,
    /// Priority tier derived from the workspace plan.
    #[serde(default)]
    pub priority: i32,
    /// Completion percentage (0-100).
    #[serde(default)]
    pub progress: f32,
}

impl RenderJob {
    /// Progress clamped to `0..=100`.
    pub fn progress_percent(&self) -> u8 {
        self.progress.clamp(0.0, 100.0).round() as u8
    }
}

/// Response of `GET /api/pipeline/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineHealth {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
}

/// Counts from the super-admin render-queue view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderQueueOverview {
    #[serde(default)]
    pub db_jobs: Vec<RenderJob>,
    #[serde(default)]
    pub queue_waiting: u32,
    #[serde(default)]
    pub queue_active: u32,
    #[serde(default)]
    pub queue_failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        let mut job: RenderJob = serde_json::from_value(serde_json::json!({
            "id": "j1",
            "status": "running",
            "progress": 140.0,
        }))
        .unwrap();
        assert_eq!(job.progress_percent(), 100);
        job.progress = -3.0;
        assert_eq!(job.progress_percent(), 0);
        assert!(job.status.is_active());
    }
}
