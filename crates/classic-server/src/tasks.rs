//! Background loops. Each runs as its own task until the shutdown flag
//! flips.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::server::ServerState;
use crate::session::Session;

/// A ticker whose first tick is one period from now.
fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Accept connections and register a session for each.
pub fn spawn_accept(
    state: Arc<ServerState>,
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let write_timeout = Duration::from_millis(state.config.network.write_timeout_ms);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => match Session::new(stream, write_timeout) {
                        Ok(session) => {
                            info!("New connection from {peer}");
                            state.register_session(Arc::new(session)).await;
                        }
                        Err(e) => warn!("Failed to set up connection from {peer}: {e}"),
                    },
                    Err(e) => warn!("Accept error: {e}"),
                },
                _ = shutdown.changed() => break,
            }
        }
        debug!("Accept loop stopped");
    })
}

/// Sweep every connection for readable data and dispatch it.
pub fn spawn_poll(state: Arc<ServerState>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    let mut interval = ticker(Duration::from_millis(state.config.network.poll_interval_ms));
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for session in state.sessions().await {
                        state.poll_session(&session).await;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("Poll loop stopped");
    })
}

/// Ping every connection periodically.
pub fn spawn_keepalive(
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let mut interval = ticker(Duration::from_secs(state.config.network.keepalive_interval));
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interval.tick() => state.ping_all().await,
                _ = shutdown.changed() => break,
            }
        }
        debug!("Keepalive loop stopped");
    })
}

/// Save the world periodically. Failures are logged and retried next cycle.
pub fn spawn_autosave(
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) -> Option<JoinHandle<()>> {
    let secs = state.config.world.autosave_interval;
    if secs == 0 {
        info!("Autosave disabled");
        return None;
    }
    let mut interval = ticker(Duration::from_secs(secs));
    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interval.tick() => autosave(&state).await,
                _ = shutdown.changed() => break,
            }
        }
        debug!("Autosave loop stopped");
    }))
}

async fn autosave(state: &ServerState) {
    state.broadcast_message("Autosaving the world...").await;
    if let Err(e) = state.save_world() {
        error!("Autosave failed: {e}");
    }
}
