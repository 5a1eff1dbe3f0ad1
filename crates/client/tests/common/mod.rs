//! In-process stand-in for the StudioAI backend.
//!
//! A single fallback handler routes on method and path segments, records
//! every request, and serves canned JSON. Toggles on [`FakeBackend`] switch
//! individual endpoints into failure modes.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use studioai_client::store::{MemoryStorage, Storage};
use studioai_client::{ClientConfig, QuerySettings, RecordingNotifier, StudioClient};
use studioai_core::models::user::LoginRequest;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// JSON body, `Null` when absent or not JSON.
    pub body: Value,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeBackend {
    pub requests: Mutex<Vec<Recorded>>,
    pub shows: Mutex<Vec<Value>>,
    /// Reject show creation with a 402 plan-limit body.
    pub show_limit_reached: AtomicBool,
    /// Number of 503s served by the pipeline endpoint before it succeeds.
    pub pipeline_failures: AtomicUsize,
    pub logout_fails: AtomicBool,
}

impl FakeBackend {
    pub fn requests_to(&self, method: Method, suffix: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path.ends_with(suffix))
            .cloned()
            .collect()
    }

    pub fn count(&self, method: Method, suffix: &str) -> usize {
        self.requests_to(method, suffix).len()
    }
}

fn workspace(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "slug": name.to_lowercase(), "plan": "starter", "role": "owner" })
}

fn episode(id: &str, status: &str) -> Value {
    json!({ "id": id, "show": "s1", "workspace": "w1", "title": "The Moon Trip", "status": status })
}

fn plan_limit() -> Response {
    (
        StatusCode::PAYMENT_REQUIRED,
        Json(json!({
            "error": {
                "message": "Your Starter plan allows 1 show. Upgrade to create more.",
                "code": "PLAN_LIMIT_SHOWS",
                "resource": "shows",
                "limit": 1,
                "plan": "starter"
            }
        })),
    )
        .into_response()
}

fn ok(body: Value) -> Response {
    Json(body).into_response()
}

async fn handle(
    State(backend): State<Arc<FakeBackend>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    backend.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        content_type: header_value(header::CONTENT_TYPE),
        authorization: header_value(header::AUTHORIZATION),
    });

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("POST", ["api", "auth", "login"]) => ok(json!({
            "token": "tok-1",
            "user": { "id": "u1", "name": "Ada", "email": "ada@example.com", "onboarding_completed": true },
            "workspaces": [workspace("w1", "Moonbeam"), workspace("w2", "Sunrise")],
        })),
        ("POST", ["api", "auth", "logout"]) => {
            if backend.logout_fails.load(Ordering::SeqCst) {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            } else {
                ok(json!({ "success": true }))
            }
        }
        ("GET", ["api", "workspaces", _, "shows"]) => {
            ok(Value::Array(backend.shows.lock().unwrap().clone()))
        }
        ("POST", ["api", "workspaces", wid, "shows"]) => {
            if backend.show_limit_reached.load(Ordering::SeqCst) {
                return plan_limit();
            }
            let input: Value = serde_json::from_slice(&body).unwrap_or_default();
            let mut shows = backend.shows.lock().unwrap();
            let show = json!({
                "id": format!("s{}", shows.len() + 1),
                "workspace": wid,
                "name": input["name"],
                "description": input["description"],
            });
            shows.push(show.clone());
            ok(show)
        }
        ("GET", ["api", "workspaces", _, "usage"]) => ok(json!({
            "shows_used": backend.shows.lock().unwrap().len(),
            "max_shows": 1,
            "episodes_this_month": 0,
            "episodes_per_month": 4,
            "team_used": 1,
            "max_team": 3,
            "plan": "starter",
        })),
        ("GET", ["api", "workspaces", _, "shows", _, "episodes", eid]) => {
            ok(episode(eid, "AWAITING_APPROVAL"))
        }
        ("POST", ["api", "workspaces", _, "shows", _, "episodes", eid, "approve"]) => {
            tokio::time::sleep(Duration::from_millis(150)).await;
            ok(episode(eid, "PUBLISHED"))
        }
        ("POST", ["api", "workspaces", _, "shows", _, "episodes", _, "reject"]) => {
            ok(json!({ "success": true }))
        }
        ("GET", ["api", "workspaces", _, "review"]) => ok(json!([episode("e1", "AWAITING_APPROVAL")])),
        ("POST", ["api", "workspaces", _, "shows", sid, "characters"]) => ok(json!({
            "id": "c1",
            "show": sid,
            "name": "Pip",
        })),
        ("POST", ["api", "workspaces", _, "shows", _, "characters", _, "production", "emotion-refs"]) => {
            ok(json!({ "id": "r1", "emotion": "happy" }))
        }
        ("POST", ["api", "billing", "checkout"]) => ok(json!({
            "url": "https://checkout.example.com/c/cs_1",
            "sessionId": "cs_1",
        })),
        ("POST", ["api", "billing", "portal"]) => ok(json!({ "url": "https://billing.example.com/p/1" })),
        ("GET", ["api", "collections", "pipeline_logs", "records"]) => ok(json!({
            "page": 1,
            "perPage": 20,
            "totalItems": 2,
            "totalPages": 1,
            "items": [
                {
                    "id": "l2",
                    "episode": "e1",
                    "workspace": "w1",
                    "event": "published",
                    "message": "Episode published",
                    "created": "2026-10-18 09:30:00.000Z",
                    "expand": { "episode": episode("e1", "PUBLISHED") }
                },
                { "id": "l1", "episode": "e1", "workspace": "w1", "event": "render_queued", "message": "" }
            ],
        })),
        ("GET", ["api", "pipeline", "workspace", _]) => {
            let remaining = backend.pipeline_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                backend.pipeline_failures.store(remaining - 1, Ordering::SeqCst);
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": { "message": "Render server unavailable" } })),
                )
                    .into_response();
            }
            ok(json!([{ "id": "j1", "episode": "e1", "status": "running", "progress": 42.0 }]))
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "message": format!("No route for {method} {path}") } })),
        )
            .into_response(),
    }
}

pub async fn spawn_backend() -> (String, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::default());
    let app = Router::new().fallback(handle).with_state(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), backend)
}

pub struct Harness {
    pub client: StudioClient,
    pub backend: Arc<FakeBackend>,
    pub toasts: Arc<RecordingNotifier>,
    pub base_url: String,
}

pub fn config_for(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: base_url.to_string(),
        pb_url: base_url.to_string(),
        ..ClientConfig::default()
    }
}

pub fn client_for(base_url: &str, storage: Arc<dyn Storage>, toasts: Arc<RecordingNotifier>) -> StudioClient {
    StudioClient::new(config_for(base_url), storage)
        .unwrap()
        .with_notifier(toasts)
        .with_query_settings(QuerySettings {
            retry_delay: Duration::from_millis(10),
            ..QuerySettings::default()
        })
}

pub async fn harness() -> Harness {
    let (base_url, backend) = spawn_backend().await;
    let toasts = Arc::new(RecordingNotifier::new());
    let client = client_for(&base_url, Arc::new(MemoryStorage::default()), toasts.clone());
    Harness {
        client,
        backend,
        toasts,
        base_url,
    }
}

/// A harness with a logged-in session on workspace `w1`.
pub async fn logged_in() -> Harness {
    let h = harness().await;
    h.client.login(credentials()).await.unwrap();
    h
}

pub fn credentials() -> LoginRequest {
    LoginRequest {
        email: "ada@example.com".into(),
        password: "secret-password".into(),
    }
}
