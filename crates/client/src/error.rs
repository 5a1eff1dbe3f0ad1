//! Client-side error type.
//!
//! Every failure the SDK surfaces is a [`ClientError`]. Server error bodies
//! have the shape `{"error": {"message", "code", "resource?", "limit?",
//! "plan?"}}`; anything else degrades to a status-only error.

use serde::Deserialize;
use studioai_core::error::CoreError;
use studioai_realtime::RealtimeError;

/// Message used when the server names no more specific reason.
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// Errors from the REST, cache, and realtime layers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The server rejected the request with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A plan limit blocked the action (HTTP 402).
    #[error("Plan limit reached for {resource}: {message}")]
    PlanLimit {
        resource: String,
        limit: Option<i64>,
        plan: Option<String>,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A client-side rule rejected the input; no request was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Realtime error: {0}")]
    Realtime(String),

    /// The same action is already running for this target.
    #[error("{0} is already in progress")]
    MutationPending(&'static str),

    /// A workspace-scoped call was made with no active workspace.
    #[error("No active workspace selected")]
    NoWorkspace,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    plan: Option<String>,
}

impl ClientError {
    /// Classify a non-2xx response from its status and raw body text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error)
            .unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_MESSAGE.to_string());

        let is_plan_code = parsed
            .code
            .as_deref()
            .is_some_and(|c| c.starts_with("PLAN_LIMIT"));
        if status == 402 || is_plan_code {
            let resource = parsed.resource.unwrap_or_else(|| {
                parsed
                    .code
                    .as_deref()
                    .and_then(|c| c.strip_prefix("PLAN_LIMIT_"))
                    .map(str::to_lowercase)
                    .unwrap_or_default()
            });
            return ClientError::PlanLimit {
                resource,
                limit: parsed.limit,
                plan: parsed.plan,
                message,
            };
        }

        match status {
            401 => ClientError::Unauthorized(message),
            404 => ClientError::NotFound(message),
            _ => ClientError::Api {
                status,
                code: parsed.code,
                message,
            },
        }
    }

    /// Short message for a toast. Server messages are shown verbatim;
    /// transport and decode failures show `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api { message, .. }
            | ClientError::PlanLimit { message, .. }
            | ClientError::NotFound(message)
            | ClientError::Unauthorized(message)
            | ClientError::Validation(message)
                if message != GENERIC_MESSAGE =>
            {
                message.clone()
            }
            ClientError::MutationPending(_) | ClientError::NoWorkspace => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Whether a read may be retried: transport failures, 5xx, 408, 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Api { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }

    /// Whether the target changed or vanished on the server (404, 409), so
    /// cached copies of it no longer reflect reality.
    pub fn is_stale_reference(&self) -> bool {
        matches!(
            self,
            ClientError::NotFound(_) | ClientError::Api { status: 409, .. }
        )
    }

    /// Whether the active workspace is gone or no longer accessible, so the
    /// caller should prompt for a different one.
    pub fn requires_workspace_selection(&self) -> bool {
        match self {
            ClientError::NoWorkspace => true,
            ClientError::NotFound(message) => message.contains("Workspace not found"),
            ClientError::Api { status: 403, message, .. } => {
                message.contains("not a member of this workspace")
            }
            _ => false,
        }
    }

    pub fn is_plan_limit(&self) -> bool {
        matches!(self, ClientError::PlanLimit { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

impl From<CoreError> for ClientError {
    fn from(e: CoreError) -> Self {
        ClientError::Validation(e.user_message())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(e: validator::ValidationErrors) -> Self {
        CoreError::from(e).into()
    }
}

impl From<RealtimeError> for ClientError {
    fn from(e: RealtimeError) -> Self {
        ClientError::Realtime(e.to_string())
    }
}
