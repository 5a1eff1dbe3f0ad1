//! Authenticated user model and auth request/response DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::workspace::Workspace;
use crate::types::RecordId;

define_wire_enum! {
    /// Platform-wide role, independent of workspace membership.
    PlatformRole {
        User => "user",
        Superadmin => "superadmin",
    }
}

impl Default for PlatformRole {
    fn default() -> Self {
        PlatformRole::User
    }
}

/// An authenticated user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub platform_role: PlatformRole,
    #[serde(default)]
    pub onboarding_completed: bool,
}

impl User {
    pub fn is_super_admin(&self) -> bool {
        self.platform_role == PlatformRole::Superadmin
    }
}

/// Partial user update merged into the session snapshot and sent to
/// `PATCH /api/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

impl UserPatch {
    /// Merge the set fields into `user`, leaving the rest untouched.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = Some(avatar.clone());
        }
        if let Some(done) = self.onboarding_completed {
            user.onboarding_completed = done;
        }
    }
}

/// Body for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Body for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "is required"))]
    pub workspace_name: String,
}

/// Body for `POST /api/auth/change-password`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub new_password: String,
}

/// Response of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

/// Response of `POST /api/auth/register`: a single freshly created workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: User,
    pub workspace: Workspace,
}

/// Response of `GET /api/auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub user: User,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: None,
            platform_role: PlatformRole::User,
            onboarding_completed: false,
        }
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let parsed: User = serde_json::from_value(serde_json::json!({"id": "u1"})).unwrap();
        assert_eq!(parsed.platform_role, PlatformRole::User);
        assert!(!parsed.onboarding_completed);
    }

    #[test]
    fn unknown_role_is_preserved_and_not_superadmin() {
        let parsed: User =
            serde_json::from_value(serde_json::json!({"id": "u1", "platform_role": "staff"}))
                .unwrap();
        assert_eq!(parsed.platform_role, PlatformRole::Other("staff".into()));
        assert!(!parsed.is_super_admin());
        assert_eq!(serde_json::to_value(&parsed).unwrap()["platform_role"], "staff");
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let mut u = user();
        UserPatch {
            onboarding_completed: Some(true),
            ..Default::default()
        }
        .apply_to(&mut u);
        assert!(u.onboarding_completed);
        assert_eq!(u.name, "Ada");
    }

    #[test]
    fn login_request_rejects_bad_email() {
        let req = LoginRequest {
            email: "nope".into(),
            password: "x".into(),
        };
        assert!(req.validate().is_err());
    }
}
