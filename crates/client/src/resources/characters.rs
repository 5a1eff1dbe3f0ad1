use reqwest::Method;
use serde_json::{json, Value};
use studioai_core::models::character::{Character, CharacterDraft};

use super::{character_path, show_path};
use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    pub fn characters(&self, show_id: &str) -> Result<Query<Vec<Character>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::characters(&wid, show_id),
            QueryOptions::default(),
            show_path(&wid, show_id, "/characters"),
            vec![],
        ))
    }

    pub fn character(&self, show_id: &str, character_id: &str) -> Result<Query<Character>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::character(&wid, show_id, character_id),
            QueryOptions::default(),
            character_path(&wid, show_id, character_id, ""),
            vec![],
        ))
    }

    /// Sent as multipart when the draft carries a reference image.
    pub async fn create_character(&self, show_id: &str, draft: CharacterDraft) -> Result<Character, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::CreateCharacter {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
        };
        self.mutate(mutation, async {
            if draft.name.trim().is_empty() {
                return Err(ClientError::Validation("Character name is required".into()));
            }
            self.api
                .send(
                    Method::POST,
                    &show_path(&wid, show_id, "/characters"),
                    Payload::from_form(&draft)?,
                )
                .await
        })
        .await
    }

    pub async fn update_character(
        &self,
        show_id: &str,
        character_id: &str,
        draft: CharacterDraft,
    ) -> Result<Character, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateCharacter {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            character_id: character_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::PATCH,
                    &character_path(&wid, show_id, character_id, ""),
                    Payload::from_form(&draft)?,
                )
                .await
        })
        .await
    }

    pub async fn delete_character(&self, show_id: &str, character_id: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::DeleteCharacter {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            character_id: character_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api.delete(&character_path(&wid, show_id, character_id, "")),
        )
        .await
    }

    /// Regenerate the image prompts from the character's description.
    pub async fn generate_character_prompts(
        &self,
        show_id: &str,
        character_id: &str,
    ) -> Result<Character, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::GenerateCharacterPrompts {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            character_id: character_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api.send(
                Method::POST,
                &character_path(&wid, show_id, character_id, "/generate-prompts"),
                Payload::Empty,
            ),
        )
        .await
    }

    /// `POST /api/ai/character-description`: suggested description fields
    /// for a draft. Nothing is cached.
    pub async fn describe_character(&self, draft: &CharacterDraft) -> Result<Value, ClientError> {
        self.api
            .send(
                Method::POST,
                "/api/ai/character-description",
                Payload::Json(json!({
                    "name": draft.name,
                    "age": draft.age,
                    "traits": draft.personality_traits,
                })),
            )
            .await
    }
}
