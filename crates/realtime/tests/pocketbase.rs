//! Integration tests for the PocketBase SSE transport against an in-process
//! axum server that speaks the realtime protocol.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::Stream;
use studioai_realtime::event::{topic, workspace_filter};
use studioai_realtime::reconnect::ReconnectConfig;
use studioai_realtime::{PocketBaseRealtime, RealtimeBridge, RecordEvent, SubscriptionState};
use tokio::sync::mpsc;

#[derive(Default)]
struct FakePocketBase {
    connects: AtomicUsize,
    posts: Mutex<Vec<(Option<String>, serde_json::Value)>>,
    stream: Mutex<Option<mpsc::UnboundedSender<(String, String)>>>,
}

impl FakePocketBase {
    fn push(&self, event: &str, data: serde_json::Value) {
        if let Some(tx) = self.stream.lock().unwrap().as_ref() {
            let _ = tx.send((event.to_string(), data.to_string()));
        }
    }

    fn close_stream(&self) {
        self.stream.lock().unwrap().take();
    }

    fn last_post(&self) -> Option<(Option<String>, serde_json::Value)> {
        self.posts.lock().unwrap().last().cloned()
    }
}

async fn open_stream(
    State(pb): State<Arc<FakePocketBase>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let n = pb.connects.fetch_add(1, Ordering::SeqCst) + 1;
    let client_id = format!("client-{n}");
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send((
        "PB_CONNECT".to_string(),
        serde_json::json!({ "clientId": client_id }).to_string(),
    ))
    .unwrap();
    *pb.stream.lock().unwrap() = Some(tx);

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|(event, data)| (Ok(Event::default().event(event).data(data)), rx))
    });
    Sse::new(stream)
}

async fn register(
    State(pb): State<Arc<FakePocketBase>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    pb.posts.lock().unwrap().push((auth, body));
    StatusCode::NO_CONTENT
}

async fn spawn_server() -> (String, Arc<FakePocketBase>) {
    let pb = Arc::new(FakePocketBase::default());
    let app = Router::new()
        .route("/api/realtime", get(open_stream).post(register))
        .with_state(pb.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), pb)
}

fn fast_transport(base_url: &str) -> Arc<PocketBaseRealtime> {
    Arc::new(PocketBaseRealtime::with_config(
        base_url,
        ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
        },
        Duration::from_secs(2),
    ))
}

async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(3), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ---- Test: handshake, registration and delivery ----

#[tokio::test]
async fn registers_topic_and_delivers_events() {
    let (base_url, pb) = spawn_server().await;
    let transport = fast_transport(&base_url);
    transport.set_auth_token(Some("tok-123".into()));
    let bridge = RealtimeBridge::new(transport.clone());

    let filter = workspace_filter("w1");
    let expected_topic = topic("episodes", Some(&filter));
    let (tx, mut rx) = mpsc::unbounded_channel::<RecordEvent>();
    let mut sub = bridge.subscribe("episodes", Some(&filter), move |event| {
        let _ = tx.send(event);
    });

    assert_eq!(sub.ready().await, SubscriptionState::Active);
    assert_eq!(transport.client_id().as_deref(), Some("client-1"));

    let (auth, body) = pb.last_post().unwrap();
    assert_eq!(auth.as_deref(), Some("tok-123"));
    assert_eq!(body["clientId"], "client-1");
    assert_eq!(body["subscriptions"], serde_json::json!([expected_topic]));

    pb.push(
        &expected_topic,
        serde_json::json!({"action": "update", "record": {"id": "e1", "workspace": "w1"}}),
    );
    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.record_id(), Some("e1"));

    sub.unsubscribe().await;
    let (_, body) = pb.last_post().unwrap();
    assert_eq!(body["subscriptions"], serde_json::json!([]));

    transport.shutdown().await;
}

// ---- Test: topics survive a dropped stream ----

#[tokio::test]
async fn reconnects_and_restores_topics() {
    let (base_url, pb) = spawn_server().await;
    let transport = fast_transport(&base_url);
    let bridge = RealtimeBridge::new(transport.clone());

    let mut sub = bridge.subscribe("render_jobs", None, |_| {});
    assert_eq!(sub.ready().await, SubscriptionState::Active);

    pb.close_stream();
    eventually(|| pb.connects.load(Ordering::SeqCst) >= 2).await;
    eventually(|| {
        pb.last_post()
            .map(|(_, body)| body["clientId"] == "client-2")
            .unwrap_or(false)
    })
    .await;

    let (_, body) = pb.last_post().unwrap();
    assert_eq!(body["subscriptions"], serde_json::json!(["render_jobs/*"]));

    drop(sub);
    transport.shutdown().await;
}

// ---- Test: unreachable server ----

#[tokio::test]
async fn subscribe_times_out_without_handshake() {
    let transport = Arc::new(PocketBaseRealtime::with_config(
        "http://127.0.0.1:9",
        ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        },
        Duration::from_millis(200),
    ));
    let bridge = RealtimeBridge::new(transport.clone());

    let mut sub = bridge.subscribe("episodes", None, |_| {});
    assert!(matches!(sub.ready().await, SubscriptionState::Failed(_)));
    transport.shutdown().await;
}
