use studioai_core::models::episode::PipelineActivity;
use studioai_core::models::render_job::{PipelineHealth, RenderJob};
use studioai_core::models::ListPage;
use studioai_realtime::event::workspace_filter;

use super::{FAST_POLL, SLOW_POLL};
use crate::error::ClientError;
use crate::keys;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    /// Render jobs of the active workspace, polled every 10 s.
    pub fn pipeline(&self) -> Result<Query<Vec<RenderJob>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::pipeline(&wid),
            QueryOptions::polling(FAST_POLL),
            format!("/api/pipeline/workspace/{wid}"),
            vec![],
        ))
    }

    pub fn pipeline_health(&self) -> Query<PipelineHealth> {
        self.get_query(
            keys::pipeline_health(),
            QueryOptions::polling(SLOW_POLL),
            "/api/pipeline/health".to_string(),
            vec![],
        )
    }

    /// Platform-wide render queue, polled every 10 s.
    pub fn pipeline_global_queue(&self) -> Query<Vec<RenderJob>> {
        self.get_query(
            keys::pipeline_global_queue(),
            QueryOptions::polling(FAST_POLL),
            "/api/pipeline/queue".to_string(),
            vec![],
        )
    }

    /// The 20 most recent pipeline log entries of the active workspace,
    /// newest first, read from the document store with their episodes
    /// expanded. Refreshed by `pipeline_logs` changes rather than polling.
    pub fn recent_activity(&self) -> Result<Query<ListPage<PipelineActivity>>, ClientError> {
        let wid = self.workspace_id()?;
        let records = self.records.clone();
        let params = vec![
            ("page", "1".to_string()),
            ("perPage", RECENT_ACTIVITY_LIMIT.to_string()),
            ("filter", workspace_filter(&wid)),
            ("sort", "-@rowid".to_string()),
            ("expand", "episode".to_string()),
        ];
        Ok(self.queries.query(
            keys::recent_activity(&wid),
            QueryOptions::default(),
            move || {
                let records = records.clone();
                let params = params.clone();
                async move {
                    records
                        .get("/api/collections/pipeline_logs/records", &params)
                        .await
                }
            },
        ))
    }
}

const RECENT_ACTIVITY_LIMIT: u32 = 20;
