use reqwest::Method;
use studioai_core::models::workspace::{
    InviteMember, MemberRole, UpdateMemberRole, UpdateWorkspace, UsageSnapshot, Workspace,
    WorkspaceMember,
};
use studioai_core::models::Ack;

use super::{workspace_path, SLOW_POLL};
use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::StudioClient;

impl StudioClient {
    /// `GET /api/workspaces`: every workspace the user belongs to, with role.
    pub fn workspaces(&self) -> Query<Vec<Workspace>> {
        self.get_query(
            keys::workspaces(),
            QueryOptions::default(),
            "/api/workspaces".into(),
            vec![],
        )
    }

    pub fn workspace(&self) -> Result<Query<Workspace>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::workspace(&wid),
            QueryOptions::default(),
            workspace_path(&wid, ""),
            vec![],
        ))
    }

    /// Usage counters, polled every 30 s while observed.
    pub fn workspace_usage(&self) -> Result<Query<UsageSnapshot>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::workspace_usage(&wid),
            QueryOptions::polling(SLOW_POLL),
            workspace_path(&wid, "/usage"),
            vec![],
        ))
    }

    pub fn workspace_members(&self) -> Result<Query<Vec<WorkspaceMember>>, ClientError> {
        let wid = self.workspace_id()?;
        Ok(self.get_query(
            keys::workspace_members(&wid),
            QueryOptions::default(),
            workspace_path(&wid, "/members"),
            vec![],
        ))
    }

    /// `PATCH /api/workspaces/{wid}`; the result becomes the active workspace.
    pub async fn update_workspace(&self, update: UpdateWorkspace) -> Result<Workspace, ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateWorkspace { workspace_id: wid.clone() };
        self.mutate(mutation, async {
            let mut updated: Workspace = self
                .api
                .send(Method::PATCH, &workspace_path(&wid, ""), Payload::json(&update)?)
                .await?;
            if updated.role.is_none() {
                updated.role = self
                    .stores
                    .workspace
                    .active_workspace()
                    .and_then(|w| w.role);
            }
            self.stores.workspace.set_workspace(updated.clone());
            Ok(updated)
        })
        .await
    }

    pub async fn invite_member(&self, email: &str, role: Option<MemberRole>) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::InviteMember { workspace_id: wid.clone() };
        self.mutate(mutation, async {
            let email = email.trim();
            if email.is_empty() {
                return Err(ClientError::Validation("Email is required".into()));
            }
            let body = InviteMember {
                email: email.to_string(),
                role: role.unwrap_or(MemberRole::Creator),
            };
            self.api
                .send_unit(Method::POST, &workspace_path(&wid, "/members/invite"), Payload::json(&body)?)
                .await
        })
        .await
    }

    pub async fn update_member_role(&self, user_id: &str, role: MemberRole) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::UpdateMemberRole { workspace_id: wid.clone() };
        self.mutate(mutation, async {
            let path = workspace_path(&wid, &format!("/members/{user_id}"));
            self.api
                .send_unit(Method::PATCH, &path, Payload::json(&UpdateMemberRole { role })?)
                .await
        })
        .await
    }

    pub async fn remove_member(&self, user_id: &str) -> Result<(), ClientError> {
        let wid = self.workspace_id()?;
        let mutation = Mutation::RemoveMember { workspace_id: wid.clone() };
        self.mutate(mutation, async {
            let _: Ack = self
                .api
                .send(
                    Method::DELETE,
                    &workspace_path(&wid, &format!("/members/{user_id}")),
                    Payload::Empty,
                )
                .await?;
            Ok(())
        })
        .await
    }

    /// Activate `workspace`. Cached data of the previous workspace is
    /// dropped so nothing from it can leak into the new one.
    pub fn switch_workspace(&self, workspace: Workspace) {
        let previous = self.stores.workspace.active_workspace_id();
        let next = workspace.id.clone();
        self.stores.workspace.set_workspace(workspace);

        if let Some(previous) = previous.filter(|p| *p != next) {
            let removed: usize = keys::workspace_prefixes(&previous)
                .iter()
                .map(|prefix| self.queries.remove_queries(prefix))
                .sum();
            tracing::info!(from = %previous, to = %next, removed, "Switched workspace");
        }
    }
}
