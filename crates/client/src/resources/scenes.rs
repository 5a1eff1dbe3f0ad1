use reqwest::Method;
use studioai_core::models::scene::{sort_scenes, Scene, SceneInput};

use super::episode_path;
use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    /// Shots of an episode in playback order.
    pub fn scenes(&self, show_id: &str, episode_id: &str) -> Result<Query<Vec<Scene>>, ClientError> {
        let wid = self.workspace_id()?;
        let api = self.api.clone();
        let path = episode_path(&wid, show_id, episode_id, "/scenes");
        Ok(self.queries.query(
            keys::scenes(&wid, show_id, episode_id),
            QueryOptions::default(),
            move || {
                let api = api.clone();
                let path = path.clone();
                async move {
                    let mut scenes: Vec<Scene> = api.get(&path, &[]).await?;
                    sort_scenes(&mut scenes);
                    Ok(scenes)
                }
            },
        ))
    }

    pub async fn create_scene(&self, show_id: &str, episode_id: &str, input: SceneInput) -> Result<Scene, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::CreateScene {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::POST,
                    &episode_path(&wid, show_id, episode_id, "/scenes"),
                    Payload::json(&input)?,
                )
                .await
        })
        .await
    }

    pub async fn update_scene(
        &self,
        show_id: &str,
        episode_id: &str,
        scene_id: &str,
        input: SceneInput,
    ) -> Result<Scene, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateScene {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::PATCH,
                    &episode_path(&wid, show_id, episode_id, &format!("/scenes/{scene_id}")),
                    Payload::json(&input)?,
                )
                .await
        })
        .await
    }

    pub async fn delete_scene(&self, show_id: &str, episode_id: &str, scene_id: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::DeleteScene {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api
                .delete(&episode_path(&wid, show_id, episode_id, &format!("/scenes/{scene_id}"))),
        )
        .await
    }
}
