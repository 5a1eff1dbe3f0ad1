//! Workspace (tenant) model, membership and usage DTOs.

use serde::{Deserialize, Serialize};

use crate::plan::Limit;
use crate::types::RecordId;

define_wire_enum! {
    /// Subscription tier controlling quantity entitlements.
    PlanTier {
        Starter => "starter",
        Pro => "pro",
        Studio => "studio",
    }
}

impl Default for PlanTier {
    fn default() -> Self {
        PlanTier::Starter
    }
}

define_wire_enum! {
    /// Role of a member inside one workspace.
    MemberRole {
        Owner => "owner",
        Admin => "admin",
        Reviewer => "reviewer",
        Creator => "creator",
        Viewer => "viewer",
    }
}

impl MemberRole {
    /// Rank in the membership hierarchy; higher roles may perform the
    /// actions of lower ones. Unknown roles rank below `viewer`.
    pub fn rank(&self) -> u8 {
        match self {
            MemberRole::Owner => 5,
            MemberRole::Admin => 4,
            MemberRole::Reviewer => 3,
            MemberRole::Creator => 2,
            MemberRole::Viewer => 1,
            MemberRole::Other(_) => 0,
        }
    }

    /// Whether this role satisfies `required` under the hierarchy.
    pub fn satisfies(&self, required: &MemberRole) -> bool {
        self.rank() >= required.rank()
    }
}

/// A tenant/organization scope for all production data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub plan: PlanTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    /// Per-workspace render server override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_priority: Option<i32>,
    #[serde(default)]
    pub episodes_this_month: u32,
    /// The caller's membership role, present on `GET /api/workspaces`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
}

/// Body for `PATCH /api/workspaces/{wid}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWorkspace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_server_url: Option<String>,
}

/// A row of `GET /api/workspaces/{wid}/members`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub id: RecordId,
    pub role: MemberRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<String>,
    #[serde(default)]
    pub user: MemberUser,
}

/// The user half of a membership row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberUser {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Body for `PATCH /api/workspaces/{wid}/members/{uid}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateMemberRole {
    pub role: MemberRole,
}

/// Body for `POST /api/workspaces/{wid}/members/invite`.
#[derive(Debug, Clone, Serialize)]
pub struct InviteMember {
    pub email: String,
    pub role: MemberRole,
}

/// Usage counters from `GET /api/workspaces/{wid}/usage`.
///
/// The `max_*` fields carry the server's authoritative limits; they are
/// optional so that older servers without them still parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    #[serde(default)]
    pub shows_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_shows: Option<Limit>,
    #[serde(default)]
    pub episodes_this_month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes_per_month: Option<Limit>,
    #[serde(default)]
    pub team_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_team: Option<Limit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_plan_is_kept_verbatim() {
        let ws: Workspace =
            serde_json::from_value(serde_json::json!({"id": "w1", "plan": "enterprise"})).unwrap();
        assert_eq!(ws.plan, PlanTier::Other("enterprise".into()));
    }

    #[test]
    fn missing_plan_defaults_to_starter() {
        let ws: Workspace = serde_json::from_value(serde_json::json!({"id": "w1"})).unwrap();
        assert_eq!(ws.plan, PlanTier::Starter);
    }

    #[test]
    fn role_hierarchy_allows_higher_roles() {
        assert!(MemberRole::Admin.satisfies(&MemberRole::Reviewer));
        assert!(MemberRole::Reviewer.satisfies(&MemberRole::Creator));
        assert!(!MemberRole::Creator.satisfies(&MemberRole::Reviewer));
        assert!(!MemberRole::Other("guest".into()).satisfies(&MemberRole::Viewer));
    }

    #[test]
    fn member_row_parses_nested_user() {
        let member: WorkspaceMember = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "role": "reviewer",
            "joined_at": "2024-05-01 10:00:00.000Z",
            "user": {"id": "u1", "email": "ana@example.com", "display_name": null}
        }))
        .unwrap();
        assert_eq!(member.role, MemberRole::Reviewer);
        assert_eq!(member.user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(member.user.display_name, None);
    }

    #[test]
    fn usage_parses_unlimited_sentinel() {
        let usage: UsageSnapshot = serde_json::from_value(serde_json::json!({
            "shows_used": 2,
            "max_shows": -1,
            "episodes_this_month": 1,
            "episodes_per_month": 4,
        }))
        .unwrap();
        assert_eq!(usage.max_shows, Some(Limit::Unlimited));
        assert_eq!(usage.episodes_per_month, Some(Limit::Limited(4)));
        assert_eq!(usage.max_team, None);
    }
}
