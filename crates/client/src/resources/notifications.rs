use reqwest::Method;
use serde_json::json;
use studioai_core::models::notification::{Notification, NotificationCount};
use studioai_core::models::ListPage;

use super::SLOW_POLL;
use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    /// Notifications of the active workspace, polled every 30 s.
    pub fn notifications(&self) -> Result<Query<ListPage<Notification>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::notifications(&wid),
            QueryOptions::polling(SLOW_POLL),
            "/api/notifications".to_string(),
            vec![("workspaceId", wid)],
        ))
    }

    /// Unread counter for the badge, polled every 30 s.
    pub fn notification_count(&self) -> Result<Query<NotificationCount>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::notification_count(&wid),
            QueryOptions::polling(SLOW_POLL),
            "/api/notifications/count".to_string(),
            vec![("workspaceId", wid)],
        ))
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<(), ClientError> {
        self.mutate(
            Mutation::MarkNotificationRead,
            self.api.send_unit(
                Method::PATCH,
                &format!("/api/notifications/{notification_id}/read"),
                Payload::Empty,
            ),
        )
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        self.mutate(
            Mutation::MarkAllNotificationsRead,
            self.api.send_unit(
                Method::POST,
                "/api/notifications/read-all",
                Payload::Json(json!({ "workspaceId": wid })),
            ),
        )
        .await
    }
}
