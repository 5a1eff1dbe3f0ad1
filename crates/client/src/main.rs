//! `studioai-watch` -- follow a workspace's render pipeline from a terminal.
//!
//! Restores the session persisted under `STUDIOAI_STATE_DIR`, reports plan
//! usage, then logs every pipeline snapshot until Ctrl-C. Realtime changes
//! to render jobs, episodes and notifications trigger an immediate refetch
//! on top of the 10 s polling.
//!
//! # Environment variables
//!
//! See [`studioai_client::config`].

use std::sync::Arc;
use std::time::Duration;

use studioai_client::store::FileStorage;
use studioai_client::{ClientConfig, StudioClient};
use studioai_core::models::render_job::RenderJob;
use studioai_realtime::{PocketBaseRealtime, RealtimeBridge, RealtimeTransport};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const GC_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studioai_client=info,studioai_realtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    let state_file = config.state_file();

    let storage = FileStorage::open(state_file.clone()).unwrap_or_else(|e| {
        tracing::error!(path = %state_file.display(), error = %e, "Cannot open state file");
        std::process::exit(1);
    });

    let client = StudioClient::new(config, Arc::new(storage)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Cannot build client");
        std::process::exit(1);
    });

    if !client.stores().session.is_authenticated() {
        tracing::error!(path = %state_file.display(), "No saved session, log in first");
        std::process::exit(1);
    }
    let Some(workspace) = client.stores().workspace.active_workspace() else {
        tracing::error!("No active workspace selected");
        std::process::exit(1);
    };

    tracing::info!(
        workspace_id = %workspace.id,
        workspace = %workspace.name,
        api_url = %client.config().api_url,
        "Starting studioai-watch",
    );

    match client.plan_gate().await {
        Ok(gate) => tracing::info!(
            plan = %gate.plan(),
            shows = ?gate.shows_remaining(),
            episodes = ?gate.episodes_remaining(),
            team = ?gate.team_remaining(),
            "Plan usage",
        ),
        Err(e) => tracing::warn!(error = %e, "Could not load plan usage"),
    }

    let realtime = Arc::new(PocketBaseRealtime::new(client.config().pb_url.clone()));
    realtime.set_auth_token(client.stores().session.token());
    let transport: Arc<dyn RealtimeTransport> = realtime.clone();
    let bridge = RealtimeBridge::new(transport);

    let subscriptions = match client.follow_workspace(&bridge) {
        Ok(subs) => subs,
        Err(e) => {
            tracing::error!(error = %e, "Cannot follow workspace");
            std::process::exit(1);
        }
    };

    let gc_cancel = CancellationToken::new();
    let gc = tokio::spawn(client.queries().clone().gc_loop(GC_INTERVAL, gc_cancel.clone()));

    let mut observer = match client.pipeline() {
        Ok(query) => query.observe(),
        Err(e) => {
            tracing::error!(error = %e, "Cannot observe pipeline");
            std::process::exit(1);
        }
    };

    loop {
        tokio::select! {
            snapshot = observer.changed() => {
                let Some(snapshot) = snapshot else { break };
                if let Some(error) = &snapshot.error {
                    tracing::warn!(error = %error, "Pipeline fetch failed");
                } else if let Some(jobs) = &snapshot.data {
                    if !snapshot.is_fetching {
                        log_jobs(jobs);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    drop(observer);
    gc_cancel.cancel();
    let _ = gc.await;
    for sub in subscriptions {
        sub.unsubscribe().await;
    }
    realtime.shutdown().await;
}

fn log_jobs(jobs: &[RenderJob]) {
    let active = jobs.iter().filter(|j| j.status.is_active()).count();
    tracing::info!(total = jobs.len(), active, "Pipeline snapshot");
    for job in jobs.iter().filter(|j| j.status.is_active()) {
        tracing::info!(
            job_id = %job.id,
            episode = %job.episode,
            status = %job.status,
            progress = job.progress_percent(),
            "Render job",
        );
    }
}
