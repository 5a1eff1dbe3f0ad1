//! Episode model, lifecycle status and DTOs.

use serde::{Deserialize, Serialize};

use super::show::Show;
use crate::types::RecordId;

define_wire_enum! {
    /// Server-owned lifecycle status. Never computed locally.
    EpisodeStatus {
        Pending => "PENDING",
        ScriptGenerating => "SCRIPT_GENERATING",
        ScriptReady => "SCRIPT_READY",
        RenderQueued => "RENDER_QUEUED",
        Rendering => "RENDERING",
        RenderFailed => "RENDER_FAILED",
        AwaitingApproval => "AWAITING_APPROVAL",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Publishing => "PUBLISHING",
        Published => "PUBLISHED",
    }
}

impl Default for EpisodeStatus {
    fn default() -> Self {
        EpisodeStatus::Pending
    }
}

impl EpisodeStatus {
    /// Position in the forward lifecycle. `RENDER_FAILED` shares the slot of
    /// `RENDERING`; approve and reject share theirs. Unknown values have none.
    pub fn stage(&self) -> Option<u8> {
        Some(match self {
            EpisodeStatus::Pending => 0,
            EpisodeStatus::ScriptGenerating => 1,
            EpisodeStatus::ScriptReady => 2,
            EpisodeStatus::RenderQueued => 3,
            EpisodeStatus::Rendering | EpisodeStatus::RenderFailed => 4,
            EpisodeStatus::AwaitingApproval => 5,
            EpisodeStatus::Approved | EpisodeStatus::Rejected => 6,
            EpisodeStatus::Publishing => 7,
            EpisodeStatus::Published => 8,
            EpisodeStatus::Other(_) => return None,
        })
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            EpisodeStatus::Pending => "Pending",
            EpisodeStatus::ScriptGenerating => "Generating Script",
            EpisodeStatus::ScriptReady => "Script Ready",
            EpisodeStatus::RenderQueued => "Queued",
            EpisodeStatus::Rendering => "Rendering",
            EpisodeStatus::RenderFailed => "Render Failed",
            EpisodeStatus::AwaitingApproval => "Awaiting Approval",
            EpisodeStatus::Approved => "Approved",
            EpisodeStatus::Rejected => "Rejected",
            EpisodeStatus::Publishing => "Publishing",
            EpisodeStatus::Published => "Published",
            EpisodeStatus::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EpisodeStatus::RenderFailed)
    }

    /// Statuses in which the server is actively working on the episode.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            EpisodeStatus::ScriptGenerating
                | EpisodeStatus::RenderQueued
                | EpisodeStatus::Rendering
                | EpisodeStatus::Publishing
        )
    }

    /// Whether approve/reject may be offered.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, EpisodeStatus::AwaitingApproval)
    }
}

/// Expanded relations that the server may attach to an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeExpand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<Show>,
}

/// A single installment of a show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: RecordId,
    #[serde(default)]
    pub show: RecordId,
    #[serde(default)]
    pub workspace: RecordId,
    #[serde(default)]
    pub episode_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: EpisodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default)]
    pub scenes: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, rename = "collectionId", skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<EpisodeExpand>,
}

/// Filters and pagination for `GET .../episodes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EpisodeListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EpisodeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "perPage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl EpisodeListParams {
    /// Query-string pairs in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(theme) = &self.theme {
            pairs.push(("theme", theme.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("perPage", per_page.to_string()));
        }
        pairs
    }
}

/// Body for manual `POST .../episodes`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateEpisode {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moral: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

/// Body for `PATCH .../episodes/{eid}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateEpisode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moral: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl Episode {
    /// Id of the show this episode belongs to, preferring the expanded
    /// relation when the server attached one.
    pub fn show_id(&self) -> &str {
        self.expand
            .as_ref()
            .and_then(|e| e.show.as_ref())
            .map(|s| s.id.as_str())
            .unwrap_or(self.show.as_str())
    }
}

/// Body for `POST .../episodes/{eid}/reject`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectEpisode {
    pub reason: String,
}

/// One entry of `GET .../episodes/{eid}/logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineLogEntry {
    pub id: RecordId,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created: String,
}

/// A `pipeline_logs` record read straight from the document store, with its
/// episode expanded. Feeds the workspace's recent-activity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineActivity {
    pub id: RecordId,
    #[serde(default)]
    pub episode: RecordId,
    #[serde(default)]
    pub workspace: RecordId,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<ActivityExpand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityExpand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<Episode>,
}

impl PipelineActivity {
    /// The message, or the raw event name when the message is blank.
    pub fn headline(&self) -> &str {
        if self.message.trim().is_empty() {
            &self.event
        } else {
            &self.message
        }
    }

    pub fn episode_title(&self) -> Option<&str> {
        self.expand
            .as_ref()?
            .episode
            .as_ref()
            .map(|e| e.title.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// Response of `POST .../shows/{sid}/generate-episode` (HTTP 202).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateEpisodeResponse {
    #[serde(default)]
    pub success: bool,
    pub episode: Episode,
}

/// Response of `POST .../episodes/{eid}/queue-render`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRenderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "jobId")]
    pub job_id: RecordId,
    #[serde(default)]
    pub shot_count: u32,
}

/// Response of `POST .../episodes/{eid}/generate-scenes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateScenesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub shot_count: u32,
    /// Shot list as produced by the storyboard generator.
    #[serde(default)]
    pub storyboard: serde_json::Value,
}
