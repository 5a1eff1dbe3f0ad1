//! Voice actor model and DTOs.

use serde::{Deserialize, Serialize};

use crate::files::{FileUpload, FormEncode};
use crate::types::RecordId;

define_wire_enum! {
    /// Text-to-speech provider backing a voice actor.
    VoiceProvider {
        Xtts => "xtts",
        Piper => "piper",
        Elevenlabs => "elevenlabs",
        Rvc => "rvc",
        Custom => "custom",
    }
}

impl Default for VoiceProvider {
    fn default() -> Self {
        VoiceProvider::Xtts
    }
}

/// A voice available to a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceActor {
    pub id: RecordId,
    #[serde(default)]
    pub workspace: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: VoiceProvider,
    #[serde(default)]
    pub external_voice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_sample: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

/// Create/update form for a voice actor; multipart when a sample is attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoiceActorDraft {
    pub name: String,
    pub provider: VoiceProvider,
    pub external_voice_id: String,
    pub is_active: bool,
    #[serde(skip)]
    pub voice_sample: Option<FileUpload>,
}

impl FormEncode for VoiceActorDraft {
    fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("provider", self.provider.to_string()),
            ("external_voice_id", self.external_voice_id.clone()),
            ("is_active", self.is_active.to_string()),
        ]
    }

    fn file_fields(&self) -> Vec<(&'static str, &FileUpload)> {
        self.voice_sample
            .as_ref()
            .map(|f| vec![("voice_sample", f)])
            .unwrap_or_default()
    }
}
