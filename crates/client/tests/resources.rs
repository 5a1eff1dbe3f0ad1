//! Resource calls against the in-process backend: invalidation, toasts,
//! plan-limit handling, payload selection and client-side guards.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::Method;
use studioai_client::{keys, ClientError, ToastKind};
use studioai_core::files::FileUpload;
use studioai_core::models::billing::BillingInterval;
use studioai_core::models::character::CharacterDraft;
use studioai_core::models::production::EmotionReferenceUpload;
use studioai_core::models::show::{CreateShow, Show};
use studioai_core::models::workspace::PlanTier;

use common::logged_in;

fn new_show(name: &str) -> CreateShow {
    CreateShow {
        name: name.into(),
        description: "Bedtime adventures".into(),
        ..Default::default()
    }
}

// ---- Test: mutation invalidation ----

#[tokio::test]
async fn test_create_show_refetches_observed_listing() {
    let h = logged_in().await;
    let mut observer = h.client.shows().unwrap().observe();
    let first = observer.wait_for(|s| s.data.is_some()).await.unwrap();
    assert!(first.data.unwrap().is_empty());

    let show = h.client.create_show(new_show("Moon Pals")).await.unwrap();
    assert_eq!(show.name, "Moon Pals");

    // Observed keys are refetched before the mutation resolves.
    let listing: Vec<Show> = observer.snapshot().data.unwrap().to_vec();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, show.id);
    assert_eq!(h.backend.count(Method::GET, "/api/workspaces/w1/shows"), 2);

    let toast = h.toasts.last().unwrap();
    assert_eq!(toast.kind, ToastKind::Success);
    assert_eq!(toast.message, "Show created!");
}

#[tokio::test]
async fn test_invalid_show_never_reaches_server() {
    let h = logged_in().await;
    let err = h.client.create_show(new_show("")).await.unwrap_err();
    assert_matches!(err, ClientError::Validation(_));
    assert_eq!(h.backend.count(Method::POST, "/shows"), 0);
    assert_eq!(h.toasts.last().unwrap().kind, ToastKind::Error);
}

// ---- Test: plan limits ----

#[tokio::test]
async fn test_plan_limit_opens_upgrade_modal() {
    let h = logged_in().await;
    h.backend.show_limit_reached.store(true, Ordering::SeqCst);

    let err = h.client.create_show(new_show("Second Show")).await.unwrap_err();
    assert_matches!(
        &err,
        ClientError::PlanLimit { resource, limit: Some(1), .. } if resource == "shows"
    );

    let ui = h.client.stores().ui.snapshot();
    assert!(ui.upgrade_modal_open);
    assert_eq!(ui.upgrade_reason.as_deref(), Some("shows"));

    let toast = h.toasts.last().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(
        toast.message,
        "Your Starter plan allows 1 show. Upgrade to create more."
    );
}

#[tokio::test]
async fn test_plan_gate_prefers_server_limits() {
    let h = logged_in().await;
    h.client.create_show(new_show("Moon Pals")).await.unwrap();
    let gate = h.client.plan_gate().await.unwrap();
    assert!(gate.is_at_show_limit());
    // The starter catalog allows one seat; the server reports three.
    assert!(!gate.is_at_team_limit());
    assert_eq!(
        gate.team_remaining(),
        studioai_core::plan::Remaining::Count(2)
    );
}

// ---- Test: review actions ----

#[tokio::test]
async fn test_blank_reject_reason_sends_nothing() {
    let h = logged_in().await;
    let err = h.client.reject_episode("s1", "e1", "   ").await.unwrap_err();
    assert_matches!(err, ClientError::Validation(_));
    assert_eq!(h.backend.count(Method::POST, "/reject"), 0);
    assert_eq!(h.toasts.last().unwrap().kind, ToastKind::Error);
}

#[tokio::test]
async fn test_reject_with_reason_refreshes_review_queue() {
    let h = logged_in().await;
    let mut queue = h.client.review_queue().unwrap().observe();
    queue.wait_for(|s| s.data.is_some()).await.unwrap();

    h.client
        .reject_episode("s1", "e1", "Audio is out of sync")
        .await
        .unwrap();
    assert_eq!(h.backend.count(Method::POST, "/episodes/e1/reject"), 1);
    assert_eq!(h.backend.count(Method::GET, "/api/workspaces/w1/review"), 2);
    assert_eq!(h.toasts.last().unwrap().message, "Episode rejected");
}

#[tokio::test]
async fn test_second_approve_while_pending_is_refused() {
    let h = logged_in().await;
    let (first, second) = tokio::join!(
        h.client.approve_episode("s1", "e1"),
        h.client.approve_episode("s1", "e1"),
    );
    let published = first.unwrap();
    assert_eq!(published.status.as_str(), "PUBLISHED");
    assert_matches!(second, Err(ClientError::MutationPending(_)));
    assert_eq!(h.backend.count(Method::POST, "/approve"), 1);

    // The slot is free again once the first call finished.
    h.client.approve_episode("s1", "e1").await.unwrap();
    assert_eq!(h.backend.count(Method::POST, "/approve"), 2);
}

#[tokio::test]
async fn test_review_uses_parent_show_of_episode() {
    let h = logged_in().await;
    let episode = h.client.episode("s1", "e1").unwrap().fetch().await.unwrap();
    h.client
        .review_episode(&episode, studioai_core::approval::Decision::Approve)
        .await
        .unwrap();
    assert_eq!(
        h.backend
            .count(Method::POST, "/api/workspaces/w1/shows/s1/episodes/e1/approve"),
        1
    );
}

// ---- Test: payload selection ----

#[tokio::test]
async fn test_character_payload_follows_attachment() {
    let h = logged_in().await;
    let plain = CharacterDraft {
        name: "Pip".into(),
        ..Default::default()
    };
    h.client.create_character("s1", plain.clone()).await.unwrap();

    let with_image = CharacterDraft {
        reference_image: Some(FileUpload::new("pip.png", "image/png", vec![137, 80, 78, 71])),
        ..plain
    };
    h.client.create_character("s1", with_image).await.unwrap();

    let requests = h.backend.requests_to(Method::POST, "/shows/s1/characters");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert!(requests[1]
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_emotion_upload_requires_file() {
    let h = logged_in().await;
    let err = h
        .client
        .upload_emotion_ref("s1", "c1", EmotionReferenceUpload::default())
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::Validation("Select an emotion image first".into()));
    assert_eq!(h.backend.count(Method::POST, "/emotion-refs"), 0);

    let upload = EmotionReferenceUpload {
        file: Some(FileUpload::new("happy.png", "image/png", vec![1, 2, 3])),
        ..Default::default()
    };
    h.client.upload_emotion_ref("s1", "c1", upload).await.unwrap();
    let sent = h.backend.requests_to(Method::POST, "/emotion-refs");
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data"));
}

// ---- Test: read retries ----

#[tokio::test]
async fn test_read_retries_once_after_server_error() {
    let h = logged_in().await;
    h.backend.pipeline_failures.store(1, Ordering::SeqCst);
    let jobs = h.client.pipeline().unwrap().fetch().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].progress_percent(), 42);
    assert_eq!(h.backend.count(Method::GET, "/api/pipeline/workspace/w1"), 2);
}

#[tokio::test]
async fn test_read_gives_up_after_one_retry() {
    let h = logged_in().await;
    h.backend.pipeline_failures.store(5, Ordering::SeqCst);
    let err = h.client.pipeline().unwrap().fetch().await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 503, .. });
    assert_eq!(err.user_message("Failed"), "Render server unavailable");
    assert_eq!(h.backend.count(Method::GET, "/api/pipeline/workspace/w1"), 2);
}

// ---- Test: failed writes against a missing target ----

#[tokio::test]
async fn test_not_found_write_marks_target_stale() {
    let h = logged_in().await;
    h.client.episode("s1", "e1").unwrap().fetch().await.unwrap();
    let key = keys::episode("w1", "s1", "e1");
    assert_eq!(h.client.queries().is_stale(&key), Some(false));

    // The fake server has no DELETE route for episodes, so it answers 404.
    let err = h.client.delete_episode("s1", "e1").await.unwrap_err();
    assert_matches!(err, ClientError::NotFound(_));

    assert_eq!(h.client.queries().is_stale(&key), Some(true));
    assert_eq!(h.toasts.last().unwrap().kind, ToastKind::Error);
}

#[tokio::test]
async fn test_not_found_write_refetches_observed_target() {
    let h = logged_in().await;
    let mut observer = h.client.episode("s1", "e1").unwrap().observe();
    observer.wait_for(|s| s.data.is_some()).await.unwrap();

    h.client.delete_episode("s1", "e1").await.unwrap_err();
    assert_eq!(h.backend.count(Method::GET, "/api/workspaces/w1/shows/s1/episodes/e1"), 2);
}

// ---- Test: billing sessions ----

#[tokio::test]
async fn test_checkout_posts_plan_and_interval() {
    let h = logged_in().await;
    let session = h
        .client
        .start_checkout(
            PlanTier::Pro,
            BillingInterval::Yearly,
            "https://app.example.com/billing/plans",
            "https://app.example.com/pricing",
        )
        .await
        .unwrap();
    assert_eq!(session.url, "https://checkout.example.com/c/cs_1");
    assert_eq!(session.session_id.as_deref(), Some("cs_1"));

    let sent = h.backend.requests_to(Method::POST, "/api/billing/checkout");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body["workspaceId"], "w1");
    assert_eq!(sent[0].body["plan"], "pro");
    assert_eq!(sent[0].body["interval"], "yearly");
    assert_eq!(sent[0].body["cancelUrl"], "https://app.example.com/pricing");
}

#[tokio::test]
async fn test_checkout_for_current_plan_is_refused_locally() {
    let h = logged_in().await;
    let err = h
        .client
        .start_checkout(PlanTier::Starter, BillingInterval::Monthly, "https://a", "https://b")
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Validation(_));
    assert_eq!(h.backend.count(Method::POST, "/api/billing/checkout"), 0);
}

#[tokio::test]
async fn test_portal_session_carries_return_url() {
    let h = logged_in().await;
    let session = h
        .client
        .open_billing_portal("https://app.example.com/billing/plans")
        .await
        .unwrap();
    assert_eq!(session.url, "https://billing.example.com/p/1");
    assert_eq!(session.session_id, None);

    let sent = h.backend.requests_to(Method::POST, "/api/billing/portal");
    assert_eq!(sent[0].body["returnUrl"], "https://app.example.com/billing/plans");
    // Opening a hosted page raises no toast.
    assert!(h.toasts.last().is_none());
}

// ---- Test: recent activity ----

#[tokio::test]
async fn test_recent_activity_reads_workspace_logs_newest_first() {
    let h = logged_in().await;
    let page = h.client.recent_activity().unwrap().fetch().await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].headline(), "Episode published");
    assert_eq!(page.items[0].episode_title(), Some("The Moon Trip"));
    assert_eq!(page.items[1].headline(), "render_queued");

    let sent = h
        .backend
        .requests_to(Method::GET, "/api/collections/pipeline_logs/records");
    let query = sent[0].query.clone().unwrap_or_default();
    assert!(query.contains("perPage=20"));
    assert!(query.contains("sort=-%40rowid"));
    assert!(query.contains("expand=episode"));
    assert!(query.contains("w1"));
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer tok-1"));
}

// ---- Test: workspace scoping ----

#[tokio::test]
async fn test_switching_workspace_drops_previous_data() {
    let h = logged_in().await;
    h.client.shows().unwrap().fetch().await.unwrap();
    assert!(h
        .client
        .queries()
        .get_query_data::<Vec<Show>>(&keys::shows("w1"))
        .is_some());

    let next = h.client.stores().session.snapshot().workspaces[1].clone();
    h.client.switch_workspace(next);

    assert_eq!(h.client.workspace_id().unwrap(), "w2");
    assert!(h
        .client
        .queries()
        .get_query_data::<Vec<Show>>(&keys::shows("w1"))
        .is_none());

    tokio::time::timeout(Duration::from_secs(2), h.client.shows().unwrap().fetch())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(h.backend.count(Method::GET, "/api/workspaces/w2/shows"), 1);
}
