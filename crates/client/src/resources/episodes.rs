use reqwest::Method;
use studioai_core::approval::{self, Decision};
use studioai_core::models::episode::{
    CreateEpisode, Episode, EpisodeListParams, GenerateScenesResponse, PipelineLogEntry,
    QueueRenderResponse, UpdateEpisode,
};
use studioai_core::models::ListPage;

use super::{episode_path, show_path, workspace_path, FAST_POLL, SLOW_POLL};
use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::{InFlightGuard, Mutation};
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    /// Filtered, paginated episode listing. Each filter combination is its
    /// own cache entry.
    pub fn episodes(
        &self,
        show_id: &str,
        params: &EpisodeListParams,
    ) -> Result<Query<ListPage<Episode>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::episodes(&wid, show_id, params),
            QueryOptions::default(),
            show_path(&wid, show_id, "/episodes"),
            params.query_pairs(),
        ))
    }

    pub fn episode(&self, show_id: &str, episode_id: &str) -> Result<Query<Episode>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::episode(&wid, show_id, episode_id),
            QueryOptions::default(),
            episode_path(&wid, show_id, episode_id, ""),
            vec![],
        ))
    }

    /// Pipeline log of one episode, polled every 10 s while observed.
    pub fn episode_logs(
        &self,
        show_id: &str,
        episode_id: &str,
    ) -> Result<Query<Vec<PipelineLogEntry>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::episode_logs(&wid, episode_id),
            QueryOptions::polling(FAST_POLL),
            episode_path(&wid, show_id, episode_id, "/logs"),
            vec![],
        ))
    }

    /// Episodes awaiting approval, with their show expanded.
    pub fn review_queue(&self) -> Result<Query<Vec<Episode>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::review_queue(&wid),
            QueryOptions::polling(SLOW_POLL),
            workspace_path(&wid, "/review"),
            vec![],
        ))
    }

    pub async fn create_episode(&self, show_id: &str, episode: CreateEpisode) -> Result<Episode, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::CreateEpisode {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
        };
        self.mutate(mutation, async {
            if episode.title.trim().is_empty() {
                return Err(ClientError::Validation("Episode title is required".into()));
            }
            self.api
                .send(Method::POST, &show_path(&wid, show_id, "/episodes"), Payload::json(&episode)?)
                .await
        })
        .await
    }

    pub async fn update_episode(
        &self,
        show_id: &str,
        episode_id: &str,
        update: UpdateEpisode,
    ) -> Result<Episode, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateEpisode {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(mutation, async {
            self.api
                .send(
                    Method::PATCH,
                    &episode_path(&wid, show_id, episode_id, ""),
                    Payload::json(&update)?,
                )
                .await
        })
        .await
    }

    pub async fn delete_episode(&self, show_id: &str, episode_id: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::DeleteEpisode {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(mutation, self.api.delete(&episode_path(&wid, show_id, episode_id, "")))
            .await
    }

    // -----------------------------------------------------------------------
    // Review
    // -----------------------------------------------------------------------

    /// Approve and publish. Fails with [`ClientError::MutationPending`] while
    /// another review action for the same episode is running.
    pub async fn approve_episode(&self, show_id: &str, episode_id: &str) -> Result<Episode, ClientError> {
        let wid = self.workspace_id()?;
        let _guard = self.review_guard(episode_id)?;
        let mutation = Mutation::ApproveEpisode {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api.send(
                Method::POST,
                &episode_path(&wid, show_id, episode_id, "/approve"),
                Payload::Empty,
            ),
        )
        .await
    }

    /// Reject with a reason. A blank reason fails validation before any
    /// request is sent.
    pub async fn reject_episode(&self, show_id: &str, episode_id: &str, reason: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let _guard = self.review_guard(episode_id)?;
        let mutation = Mutation::RejectEpisode {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(mutation, async {
            let body = approval::validate_rejection(reason)?;
            self.api
                .send_unit(
                    Method::POST,
                    &episode_path(&wid, show_id, episode_id, "/reject"),
                    Payload::json(&body)?,
                )
                .await
        })
        .await
    }

    /// Apply a reviewer decision to `episode`, checking its status first.
    /// The parent show is taken from the episode itself.
    pub async fn review_episode(&self, episode: &Episode, decision: Decision) -> Result<(), ClientError> {
        approval::validate_decision(&episode.status, &decision)?;
        match decision {
            Decision::Approve => self
                .approve_episode(episode.show_id(), &episode.id)
                .await
                .map(|_| ()),
            Decision::Reject { reason } => {
                self.reject_episode(episode.show_id(), &episode.id, &reason)
                    .await
            }
        }
    }

    fn review_guard(&self, episode_id: &str) -> Result<InFlightGuard, ClientError> {
        self.in_flight
            .try_acquire(format!("review:{episode_id}"), "Review")
    }

    // -----------------------------------------------------------------------
    // Pipeline actions
    // -----------------------------------------------------------------------

    pub async fn queue_render(&self, show_id: &str, episode_id: &str) -> Result<QueueRenderResponse, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::QueueRender {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api.send(
                Method::POST,
                &episode_path(&wid, show_id, episode_id, "/queue-render"),
                Payload::Empty,
            ),
        )
        .await
    }

    /// Build the shot storyboard from the episode script.
    pub async fn generate_scenes(
        &self,
        show_id: &str,
        episode_id: &str,
    ) -> Result<GenerateScenesResponse, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::GenerateScenes {
            workspace_id: wid.clone(),
            show_id: show_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self.mutate(
            mutation,
            self.api.send(
                Method::POST,
                &episode_path(&wid, show_id, episode_id, "/generate-scenes"),
                Payload::Empty,
            ),
        )
        .await
    }
}
