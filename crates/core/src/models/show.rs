//! Show model, production profile and DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::RecordId;

/// A serialized production owned by a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: RecordId,
    #[serde(default)]
    pub workspace: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Body for `POST /api/workspaces/{wid}/shows`.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CreateShow {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_prompt: Option<String>,
}

/// Body for `PATCH /api/workspaces/{wid}/shows/{sid}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateShow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_prompt: Option<String>,
}

/// Render preset dimensions and sampling steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

/// Pipeline configuration of a show (`/production`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowProductionProfile {
    #[serde(default = "default_pipeline_mode")]
    pub pipeline_mode: String,
    #[serde(default = "enabled")]
    pub frame_generation_enabled: bool,
    #[serde(default = "enabled")]
    pub scene_generation_enabled: bool,
    #[serde(default = "enabled")]
    pub music_generation_enabled: bool,
    #[serde(default = "enabled")]
    pub sfx_enabled: bool,
    #[serde(default = "enabled")]
    pub intro_enabled: bool,
    #[serde(default = "enabled")]
    pub outro_enabled: bool,
    #[serde(default)]
    pub intro_text: String,
    #[serde(default)]
    pub outro_text: String,
    #[serde(default)]
    pub render_preset: RenderPreset,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn default_pipeline_mode() -> String {
    "storyboard_keyframes".to_string()
}

fn enabled() -> bool {
    true
}

/// Body for `PATCH .../shows/{sid}/production`. Unset fields keep the
/// server-side value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProductionProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_generation_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_generation_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_generation_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfx_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_preset: Option<RenderPreset>,
}

/// Response of `POST /api/ai/show-names`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowNameSuggestions {
    #[serde(default)]
    pub suggestions: Vec<String>,
}
