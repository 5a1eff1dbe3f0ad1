use std::sync::{Arc, RwLock};

use studioai_core::models::user::{LoginResponse, RegisterResponse, User, UserPatch};
use studioai_core::models::workspace::Workspace;
use studioai_core::routes::GuardContext;

use super::{keys, read_json, read_state, remove_key, write_json, write_state, Storage};

/// What a successful login or registration hands to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
    pub workspaces: Vec<Workspace>,
}

impl From<LoginResponse> for AuthPayload {
    fn from(r: LoginResponse) -> Self {
        Self {
            user: r.user,
            token: r.token,
            workspaces: r.workspaces,
        }
    }
}

impl From<RegisterResponse> for AuthPayload {
    fn from(r: RegisterResponse) -> Self {
        Self {
            user: r.user,
            token: r.token,
            workspaces: vec![r.workspace],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub workspaces: Vec<Workspace>,
    pub is_authenticated: bool,
}

/// Current user, bearer token, and the workspaces the user belongs to.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state: RwLock<SessionSnapshot>,
}

impl SessionStore {
    /// Restore from storage. Authenticated only when both a token and a
    /// user were persisted.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let token: Option<String> = read_json(storage.as_ref(), keys::AUTH_TOKEN);
        let user: Option<User> = read_json(storage.as_ref(), keys::AUTH_USER);
        let workspaces: Vec<Workspace> =
            read_json(storage.as_ref(), keys::AUTH_WORKSPACES).unwrap_or_default();
        let is_authenticated = token.is_some() && user.is_some();
        Self {
            storage,
            state: RwLock::new(SessionSnapshot {
                user,
                token,
                workspaces,
                is_authenticated,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        read_state(&self.state).clone()
    }

    pub fn set_auth(&self, payload: AuthPayload) {
        let storage = self.storage.as_ref();
        write_json(storage, keys::AUTH_TOKEN, &payload.token);
        write_json(storage, keys::AUTH_USER, &payload.user);
        write_json(storage, keys::AUTH_WORKSPACES, &payload.workspaces);

        tracing::info!(user_id = %payload.user.id, workspaces = payload.workspaces.len(), "Session started");
        *write_state(&self.state) = SessionSnapshot {
            user: Some(payload.user),
            token: Some(payload.token),
            workspaces: payload.workspaces,
            is_authenticated: true,
        };
    }

    /// Merge `patch` into the current user. No-op without a user.
    pub fn update_user(&self, patch: &UserPatch) {
        let mut state = write_state(&self.state);
        if let Some(user) = state.user.as_mut() {
            patch.apply_to(user);
            write_json(self.storage.as_ref(), keys::AUTH_USER, &*user);
        }
    }

    /// Replace the cached workspace list (e.g. after `GET /api/auth/me`).
    pub fn set_workspaces(&self, workspaces: Vec<Workspace>) {
        write_json(self.storage.as_ref(), keys::AUTH_WORKSPACES, &workspaces);
        write_state(&self.state).workspaces = workspaces;
    }

    /// Clear session keys and the active workspace key, reset to defaults.
    pub fn logout(&self) {
        let storage = self.storage.as_ref();
        for key in [
            keys::AUTH_TOKEN,
            keys::AUTH_USER,
            keys::AUTH_WORKSPACES,
            keys::ACTIVE_WORKSPACE,
        ] {
            remove_key(storage, key);
        }
        *write_state(&self.state) = SessionSnapshot::default();
        tracing::info!("Session cleared");
    }

    pub fn token(&self) -> Option<String> {
        read_state(&self.state).token.clone()
    }

    pub fn user(&self) -> Option<User> {
        read_state(&self.state).user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        read_state(&self.state).is_authenticated
    }

    pub fn is_super_admin(&self) -> bool {
        read_state(&self.state)
            .user
            .as_ref()
            .is_some_and(User::is_super_admin)
    }

    /// The synchronous snapshot route guards evaluate against.
    pub fn guard_context(&self) -> GuardContext {
        let state = self.snapshot();
        GuardContext {
            is_authenticated: state.is_authenticated,
            onboarding_completed: state
                .user
                .as_ref()
                .is_some_and(|u| u.onboarding_completed),
            platform_role: state.user.map(|u| u.platform_role),
        }
    }
}
