//! Character production data: voice assignment and emotion references.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::files::{FileUpload, FormEncode};
use crate::types::RecordId;

define_wire_enum! {
    /// Emotions a character can be rendered with.
    Emotion {
        Neutral => "neutral",
        Happy => "happy",
        Sad => "sad",
        Angry => "angry",
        Excited => "excited",
        Scared => "scared",
        Thinking => "thinking",
        Surprised => "surprised",
    }
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Happy
    }
}

/// Voice settings bound to a character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_actor: Option<RecordId>,
    #[serde(default)]
    pub tts_style: String,
    #[serde(default = "unit_speed")]
    pub tts_speed: f32,
    #[serde(default)]
    pub tts_pitch: f32,
    #[serde(default)]
    pub tts_emotion_map: serde_json::Map<String, serde_json::Value>,
}

fn unit_speed() -> f32 {
    1.0
}

/// A per-emotion reference image for a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReference {
    pub id: RecordId,
    pub emotion: Emotion,
    #[serde(default)]
    pub prompt_hint: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
    #[serde(default, rename = "collectionId", skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
}

/// Response of `GET .../characters/{cid}/production`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterProduction {
    #[serde(default)]
    pub voice_assignment: Option<VoiceAssignment>,
    #[serde(default)]
    pub emotion_refs: Vec<EmotionReference>,
}

/// Body for `PATCH .../production/voice`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateVoiceAssignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_actor: Option<RecordId>,
    pub tts_style: String,
    pub tts_speed: f32,
    pub tts_pitch: f32,
    pub tts_emotion_map: serde_json::Map<String, serde_json::Value>,
}

impl UpdateVoiceAssignment {
    /// Parse the emotion map from the raw text a user typed. An empty string
    /// is an empty map; anything that is not a JSON object is rejected.
    pub fn parse_emotion_map(
        raw: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, CoreError> {
        if raw.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            _ => Err(CoreError::Validation(
                "TTS emotion map must be valid JSON".to_string(),
            )),
        }
    }
}

/// Form state for uploading an emotion reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionReferenceUpload {
    pub emotion: Emotion,
    pub prompt_hint: String,
    pub is_primary: bool,
    pub file: Option<FileUpload>,
}

impl EmotionReferenceUpload {
    /// An upload without an image is rejected before any request is built.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.file.is_none() {
            return Err(CoreError::Validation(
                "Select an emotion image first".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body for `PATCH .../production/emotion-refs/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateEmotionReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
}

impl FormEncode for EmotionReferenceUpload {
    fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("emotion", self.emotion.to_string()),
            ("prompt_hint", self.prompt_hint.clone()),
            ("is_primary", self.is_primary.to_string()),
        ]
    }

    fn file_fields(&self) -> Vec<(&'static str, &FileUpload)> {
        self.file
            .as_ref()
            .map(|f| vec![("reference_image", f)])
            .unwrap_or_default()
    }
}
