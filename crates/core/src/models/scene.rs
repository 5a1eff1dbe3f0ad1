//! Scene (shot) model and DTOs.

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// A render unit within an episode, ordered by `(scene_index, shot_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: RecordId,
    #[serde(default)]
    pub episode: RecordId,
    #[serde(default)]
    pub scene_index: u32,
    #[serde(default)]
    pub shot_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_override: Option<String>,
}

impl Scene {
    pub fn order_key(&self) -> (u32, u32) {
        (self.scene_index, self.shot_index)
    }
}

/// Sort shots into playback order.
pub fn sort_scenes(scenes: &mut [Scene]) {
    scenes.sort_by_key(Scene::order_key);
}

/// Body for `POST .../scenes` and `PATCH .../scenes/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_override: Option<String>,
}
