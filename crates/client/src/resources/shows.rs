use reqwest::Method;
use serde_json::json;
use studioai_core::models::episode::GenerateEpisodeResponse;
use studioai_core::models::show::{CreateShow, Show, ShowNameSuggestions, UpdateShow};
use validator::Validate;

use super::{show_path, workspace_path};
use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    pub fn shows(&self) -> Result<Query<Vec<Show>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::shows(&wid),
            QueryOptions::default(),
            workspace_path(&wid, "/shows"),
            vec![],
        ))
    }

    pub fn show(&self, show_id: &str) -> Result<Query<Show>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::show(&wid, show_id),
            QueryOptions::default(),
            show_path(&wid, show_id, ""),
            vec![],
        ))
    }

    pub async fn create_show(&self, show: CreateShow) -> Result<Show, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::CreateShow { workspace_id: wid.clone() };
        self.mutate(mutation, async {
            show.validate()?;
            self.api
                .send(Method::POST, &workspace_path(&wid, "/shows"), Payload::json(&show)?)
                .await
        })
        .await
    }

    pub async fn update_show(&self, show_id: &str, update: UpdateShow) -> Result<Show, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateShow {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(Method::PATCH, &show_path(&wid, show_id, ""), Payload::json(&update)?)
                .await
        })
        .await
    }

    /// Archives the show server-side.
    pub async fn delete_show(&self, show_id: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::DeleteShow {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
        };
        self.mutate(mutation, self.api.delete(&show_path(&wid, show_id, "")))
            .await
    }

    /// Start the script pipeline for a new episode of `show_id`.
    pub async fn generate_episode(&self, show_id: &str) -> Result<GenerateEpisodeResponse, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::GenerateEpisode {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api.send(
                Method::POST,
                &show_path(&wid, show_id, "/generate-episode"),
                Payload::Empty,
            ),
        )
        .await
    }

    /// `POST /api/ai/show-names`: name ideas for a show description.
    pub async fn suggest_show_names(&self, description: &str) -> Result<Vec<String>, ClientError> {
        let response: ShowNameSuggestions = self
            .api
            .send(
                Method::POST,
                "/api/ai/show-names",
                Payload::Json(json!({ "description": description })),
            )
            .await?;
        Ok(response.suggestions)
    }
}
