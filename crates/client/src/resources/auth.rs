use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use studioai_core::models::user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MeResponse, RegisterRequest,
    RegisterResponse, User, UserPatch,
};
use studioai_core::models::Ack;
use studioai_core::routes;
use validator::Validate;

use crate::api::Payload;
use crate::error::ClientError;
use crate::keys;
use crate::mutation::Mutation;
use crate::query::{Query, QueryOptions};
use crate::store::AuthPayload;
use crate::StudioClient;

/// Result of a successful login or registration.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub user: User,
    /// Where the app should navigate next.
    pub redirect: &'static str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
    user: User,
}

impl StudioClient {
    /// `POST /api/auth/login`. Activates the first workspace and points new
    /// users at onboarding.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthOutcome, ClientError> {
        self.mutate(Mutation::Login, async {
            request.validate()?;
            let response: LoginResponse = self
                .api
                .send(Method::POST, "/api/auth/login", Payload::json(&request)?)
                .await?;
            let user = response.user.clone();
            self.start_session(response.into());
            let redirect = if user.onboarding_completed {
                routes::DASHBOARD
            } else {
                routes::ONBOARDING_WELCOME
            };
            Ok(AuthOutcome { user, redirect })
        })
        .await
    }

    /// `POST /api/auth/register`. Always continues to onboarding.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthOutcome, ClientError> {
        self.mutate(Mutation::Register, async {
            request.validate()?;
            let response: RegisterResponse = self
                .api
                .send(Method::POST, "/api/auth/register", Payload::json(&request)?)
                .await?;
            let user = response.user.clone();
            self.start_session(response.into());
            Ok(AuthOutcome {
                user,
                redirect: routes::ONBOARDING_WELCOME,
            })
        })
        .await
    }

    fn start_session(&self, payload: AuthPayload) {
        let first = payload.workspaces.first().cloned();
        self.queries.clear();
        self.stores.session.set_auth(payload);
        match first {
            Some(workspace) => self.stores.workspace.set_workspace(workspace),
            None => self.stores.workspace.clear_workspace(),
        }
    }

    /// End the session. Local state is cleared even if the server call
    /// fails; that failure is only logged.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.mutate(Mutation::Logout, async {
            if let Err(e) = self
                .api
                .send_unit(Method::POST, "/api/auth/logout", Payload::Empty)
                .await
            {
                tracing::warn!(error = %e, "Server logout failed, clearing local session");
            }
            self.stores.logout();
            self.queries.clear();
            Ok(())
        })
        .await
    }

    /// `GET /api/auth/me`.
    pub fn me(&self) -> Query<MeResponse> {
        self.get_query(keys::me(), QueryOptions::default(), "/api/auth/me".into(), vec![])
    }

    /// Fetch `/me` and sync the session's workspace list with it.
    pub async fn sync_session(&self) -> Result<MeResponse, ClientError> {
        let me = self.me().fetch().await?;
        self.stores.session.set_workspaces(me.workspaces.clone());
        Ok((*me).clone())
    }

    /// `POST /api/auth/refresh`: swap in a fresh token.
    pub async fn refresh_token(&self) -> Result<(), ClientError> {
        let response: RefreshResponse = self
            .api
            .send(Method::POST, "/api/auth/refresh", Payload::Empty)
            .await?;
        let workspaces = self.stores.session.snapshot().workspaces;
        self.stores.session.set_auth(AuthPayload {
            user: response.user,
            token: response.token,
            workspaces,
        });
        Ok(())
    }

    /// `PATCH /api/auth/me`; the patch is merged into the session user.
    pub async fn update_profile(&self, patch: UserPatch) -> Result<User, ClientError> {
        self.mutate(Mutation::UpdateProfile, async {
            let user: User = self
                .api
                .send(Method::PATCH, "/api/auth/me", Payload::json(&patch)?)
                .await?;
            self.stores.session.update_user(&patch);
            Ok(user)
        })
        .await
    }

    pub async fn change_password(&self, request: ChangePasswordRequest) -> Result<(), ClientError> {
        self.mutate(Mutation::ChangePassword, async {
            request.validate()?;
            let _: Ack = self
                .api
                .send(Method::POST, "/api/auth/change-password", Payload::json(&request)?)
                .await?;
            Ok(())
        })
        .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), ClientError> {
        self.mutate(Mutation::ForgotPassword, async {
            if email.trim().is_empty() {
                return Err(ClientError::Validation("Email is required".into()));
            }
            self.api
                .send_unit(
                    Method::POST,
                    "/api/auth/forgot-password",
                    Payload::Json(json!({ "email": email.trim() })),
                )
                .await
        })
        .await
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ClientError> {
        self.mutate(Mutation::ResetPassword, async {
            if password.len() < 8 {
                return Err(ClientError::Validation(
                    "password must be at least 8 characters".into(),
                ));
            }
            self.api
                .send_unit(
                    Method::POST,
                    "/api/auth/reset-password",
                    Payload::Json(json!({ "token": token, "password": password })),
                )
                .await
        })
        .await
    }
}
