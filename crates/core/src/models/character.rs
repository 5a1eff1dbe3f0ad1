//! Character model and DTOs.

use serde::{Deserialize, Serialize};

use crate::files::{FileUpload, FormEncode};
use crate::types::RecordId;

define_wire_enum! {
    /// Narrative role of a character in its show.
    CharacterRole {
        Main => "main",
        Supporting => "supporting",
        Recurring => "recurring",
        Background => "background",
    }
}

impl Default for CharacterRole {
    fn default() -> Self {
        CharacterRole::Main
    }
}

/// A character belonging to a show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: RecordId,
    #[serde(default)]
    pub show: RecordId,
    #[serde(default)]
    pub workspace: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: CharacterRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comfyui_positive_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comfyui_negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

/// Accumulated character form state, sent on create or update.
///
/// Encoded as multipart when a reference image is attached, JSON otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacterDraft {
    pub name: String,
    pub role: CharacterRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    pub personality_traits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchphrases: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clothing_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfyui_positive_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfyui_negative_prompt: Option<String>,
    #[serde(skip)]
    pub reference_image: Option<FileUpload>,
}

impl CharacterDraft {
    /// Add the trait if absent, remove it if present. Order is kept.
    pub fn toggle_trait(&mut self, personality_trait: &str) {
        if let Some(pos) = self
            .personality_traits
            .iter()
            .position(|t| t == personality_trait)
        {
            self.personality_traits.remove(pos);
        } else {
            self.personality_traits.push(personality_trait.to_string());
        }
    }
}

impl FormEncode for CharacterDraft {
    fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        push_text(&mut fields, "name", Some(&self.name));
        push_text(&mut fields, "role", Some(&self.role.to_string()));
        push_text(&mut fields, "age", self.age.as_ref());
        if !self.personality_traits.is_empty() {
            // Arrays travel as JSON strings inside multipart bodies.
            fields.push((
                "personality_traits",
                serde_json::to_string(&self.personality_traits).unwrap_or_default(),
            ));
        }
        push_text(&mut fields, "speech_style", self.speech_style.as_ref());
        push_text(&mut fields, "catchphrases", self.catchphrases.as_ref());
        push_text(&mut fields, "visual_description", self.visual_description.as_ref());
        push_text(&mut fields, "clothing_description", self.clothing_description.as_ref());
        push_text(&mut fields, "comfyui_positive_prompt", self.comfyui_positive_prompt.as_ref());
        push_text(&mut fields, "comfyui_negative_prompt", self.comfyui_negative_prompt.as_ref());
        fields
    }

    fn file_fields(&self) -> Vec<(&'static str, &FileUpload)> {
        self.reference_image
            .as_ref()
            .map(|f| vec![("reference_image", f)])
            .unwrap_or_default()
    }
}

/// Empty values are omitted from multipart bodies.
fn push_text(fields: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            fields.push((key, v.clone()));
        }
    }
}
