//! Voice casting and per-show render configuration.

use reqwest::Method;
use studioai_core::models::production::{
    CharacterProduction, EmotionReference, EmotionReferenceUpload, UpdateEmotionReference,
    UpdateVoiceAssignment, VoiceAssignment,
};
use studioai_core::models::show::{ShowProductionProfile, UpdateProductionProfile};
use studioai_core::models::voice_actor::{VoiceActor, VoiceActorDraft};

use super::{character_path, show_path, workspace_path};
use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    // -----------------------------------------------------------------------
    // Voice actors
    // -----------------------------------------------------------------------

    pub fn voice_actors(&self) -> Result<Query<Vec<VoiceActor>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::voice_actors(&wid),
            QueryOptions::default(),
            workspace_path(&wid, "/voice-actors"),
            vec![],
        ))
    }

    /// Sent as multipart when a voice sample is attached.
    pub async fn create_voice_actor(&self, draft: VoiceActorDraft) -> Result<VoiceActor, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::CreateVoiceActor { workspace_id: wid.clone() };
        self.mutate(mutation, async {
            if draft.name.trim().is_empty() {
                return Err(ClientError::Validation("Voice actor name is required".into()));
            }
            self.api
                .send(
                    Method::POST,
                    &workspace_path(&wid, "/voice-actors"),
                    Payload::from_form(&draft)?,
                )
                .await
        })
        .await
    }

    pub async fn update_voice_actor(
        &self,
        voice_actor_id: &str,
        draft: VoiceActorDraft,
    ) -> Result<VoiceActor, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateVoiceActor { workspace_id: wid.clone() };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::PATCH,
                    &workspace_path(&wid, &format!("/voice-actors/{voice_actor_id}")),
                    Payload::from_form(&draft)?,
                )
                .await
        })
        .await
    }

    pub async fn delete_voice_actor(&self, voice_actor_id: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::DeleteVoiceActor { workspace_id: wid.clone() };
        self.mutate(
            mutation,
            self.api
                .delete(&workspace_path(&wid, &format!("/voice-actors/{voice_actor_id}"))),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Show production profile
    // -----------------------------------------------------------------------

    pub fn show_production_profile(&self, show_id: &str) -> Result<Query<ShowProductionProfile>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::show_production_profile(&wid, show_id),
            QueryOptions::default(),
            show_path(&wid, show_id, "/production"),
            vec![],
        ))
    }

    pub async fn update_show_production(
        &self,
        show_id: &str,
        update: UpdateProductionProfile,
    ) -> Result<ShowProductionProfile, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateShowProduction {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::PATCH,
                    &show_path(&wid, show_id, "/production"),
                    Payload::json(&update)?,
                )
                .await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Character production
    // -----------------------------------------------------------------------

    /// Voice assignment and emotion references of one character.
    pub fn character_production(
        &self,
        show_id: &str,
        character_id: &str,
    ) -> Result<Query<CharacterProduction>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::character_production(&wid, show_id, character_id),
            QueryOptions::default(),
            character_path(&wid, show_id, character_id, "/production"),
            vec![],
        ))
    }

    pub async fn update_character_voice(
        &self,
        show_id: &str,
        character_id: &str,
        update: UpdateVoiceAssignment,
    ) -> Result<VoiceAssignment, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateCharacterVoice {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            character_id: character_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::PATCH,
                    &character_path(&wid, show_id, character_id, "/production/voice"),
                    Payload::json(&update)?,
                )
                .await
        })
        .await
    }

    /// Upload an emotion reference image. Without a file this fails
    /// validation and no request is sent.
    pub async fn upload_emotion_ref(
        &self,
        show_id: &str,
        character_id: &str,
        upload: EmotionReferenceUpload,
    ) -> Result<EmotionReference, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UploadEmotionRef {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            character_id: character_id.to_string(),
        };
        self.mutate(mutation, async {
            upload.validate()?;
            self.api
                .send(
                    Method::POST,
                    &character_path(&wid, show_id, character_id, "/production/emotion-refs"),
                    Payload::multipart(&upload),
                )
                .await
        })
        .await
    }

    pub async fn update_emotion_ref(
        &self,
        show_id: &str,
        character_id: &str,
        ref_id: &str,
        update: UpdateEmotionReference,
    ) -> Result<EmotionReference, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateEmotionRef {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            character_id: character_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::PATCH,
                    &character_path(
                        &wid,
                        show_id,
                        character_id,
                        &format!("/production/emotion-refs/{ref_id}"),
                    ),
                    Payload::json(&update)?,
                )
                .await
        })
        .await
    }

    pub async fn delete_emotion_ref(&self, show_id: &str, character_id: &str, ref_id: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::DeleteEmotionRef {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            character_id: character_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api.delete(&character_path(
                &wid,
                show_id,
                character_id,
                &format!("/production/emotion-refs/{ref_id}"),
            )),
        )
        .await
    }
}
