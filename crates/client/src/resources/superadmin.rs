//! Platform administration. The backend rejects these for non super admins;
//! route guards keep regular users away from the views that use them.

use studioai_core::models::admin::PlatformStats;
use studioai_core::models::render_job::RenderQueueOverview;
use studioai_core::models::workspace::Workspace;
use studioai_core::models::ListPage;

use super::{FAST_POLL, SLOW_POLL};
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    pub fn platform_stats(&self) -> Query<PlatformStats> {
        self.get_query(
            keys::superadmin_stats(),
            QueryOptions::polling(SLOW_POLL),
            "/api/superadmin/stats".to_string(),
            vec![],
        )
    }

    pub fn superadmin_workspaces(&self) -> Query<ListPage<Workspace>> {
        self.get_query(
            keys::superadmin_workspaces(),
            QueryOptions::default(),
            "/api/superadmin/workspaces".to_string(),
            vec![],
        )
    }

    pub fn render_queue_overview(&self) -> Query<RenderQueueOverview> {
        self.get_query(
            keys::superadmin_render_queue(),
            QueryOptions::polling(FAST_POLL),
            "/api/superadmin/render-queue".to_string(),
            vec![],
        )
    }

    pub async fn cancel_render_job(&self, job_id: &str) -> Result<(), ClientError> {
        self.mutate(
            Mutation::CancelRenderJob,
            self.api.delete(&format!("/api/superadmin/render-jobs/{job_id}")),
        )
        .await
    }
}
