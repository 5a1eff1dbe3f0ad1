//! Login, logout and persistence of the client session.

mod common;

use std::sync::Arc;

use axum::http::Method;
use studioai_client::store::FileStorage;
use studioai_client::{RecordingNotifier, ToastKind};
use studioai_core::routes;

use common::{client_for, credentials, harness, logged_in, spawn_backend};

#[tokio::test]
async fn test_login_starts_session_on_first_workspace() {
    let h = harness().await;
    let outcome = h.client.login(credentials()).await.unwrap();
    assert_eq!(outcome.redirect, routes::DASHBOARD);
    assert_eq!(outcome.user.name, "Ada");

    let session = h.client.stores().session.snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.token.as_deref(), Some("tok-1"));
    assert_eq!(session.workspaces.len(), 2);
    assert_eq!(h.client.workspace_id().unwrap(), "w1");
    // Login raises no success toast.
    assert!(h.toasts.toasts().is_empty());

    h.client.shows().unwrap().fetch().await.unwrap();
    let sent = h.backend.requests_to(Method::GET, "/api/workspaces/w1/shows");
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn test_invalid_credentials_are_rejected_locally() {
    let h = harness().await;
    let mut request = credentials();
    request.email = "not-an-email".into();
    assert!(h.client.login(request).await.is_err());
    assert_eq!(h.backend.count(Method::POST, "/api/auth/login"), 0);
    assert!(!h.client.stores().session.is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_state_even_if_server_fails() {
    let h = logged_in().await;
    h.client.shows().unwrap().fetch().await.unwrap();
    h.backend
        .logout_fails
        .store(true, std::sync::atomic::Ordering::SeqCst);

    h.client.logout().await.unwrap();

    assert_eq!(h.backend.count(Method::POST, "/api/auth/logout"), 1);
    assert!(!h.client.stores().session.is_authenticated());
    assert!(h.client.stores().workspace.active_workspace().is_none());
    assert!(h.client.queries().is_empty());
    let toast = h.toasts.last().unwrap();
    assert_eq!(toast.kind, ToastKind::Success);
    assert_eq!(toast.message, "Logged out");
}

#[tokio::test]
async fn test_session_survives_restart_with_file_storage() {
    let (base_url, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let storage = Arc::new(FileStorage::open(path.clone()).unwrap());
        let client = client_for(&base_url, storage, Arc::new(RecordingNotifier::new()));
        client.login(credentials()).await.unwrap();
        client.stores().ui.toggle_theme();
    }

    let storage = Arc::new(FileStorage::open(path).unwrap());
    let client = client_for(&base_url, storage, Arc::new(RecordingNotifier::new()));
    assert!(client.stores().session.is_authenticated());
    assert_eq!(client.stores().session.token().as_deref(), Some("tok-1"));
    assert_eq!(client.workspace_id().unwrap(), "w1");
    assert_eq!(client.stores().ui.theme().as_str(), "light");
}
