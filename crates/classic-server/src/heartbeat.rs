//! Periodic announcement to a server list.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use classic_proto::packets::PROTOCOL_VERSION;

use crate::server::ServerState;

#[derive(Debug, Error)]
pub enum HeartbeatError {
    #[error("invalid heartbeat URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Server metadata sent with each heartbeat.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub port: u16,
    pub max_players: u32,
    pub name: String,
    pub public: bool,
    pub salt: String,
    pub users: usize,
}

/// Build the heartbeat request URL.
pub fn heartbeat_url(base: &str, announcement: &Announcement) -> Result<Url, HeartbeatError> {
    Url::parse_with_params(
        base,
        &[
            ("port", announcement.port.to_string()),
            ("max", announcement.max_players.to_string()),
            ("name", announcement.name.clone()),
            ("public", announcement.public.to_string()),
            ("version", PROTOCOL_VERSION.to_string()),
            ("salt", announcement.salt.clone()),
            ("users", announcement.users.to_string()),
        ],
    )
    .map_err(|e| HeartbeatError::InvalidUrl(format!("{base}: {e}")))
}

/// Send one heartbeat and return the response body.
pub async fn send_heartbeat(client: &reqwest::Client, url: Url) -> Result<String, HeartbeatError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Start the heartbeat loop if enabled in the config.
pub fn spawn(state: Arc<ServerState>, mut shutdown: watch::Receiver<bool>) -> Option<JoinHandle<()>> {
    let section = &state.config.heartbeat;
    if !section.enabled {
        return None;
    }
    let period = Duration::from_secs(section.interval);
    let client = match reqwest::Client::builder().timeout(period).build() {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to create heartbeat client: {e}");
            return None;
        }
    };
    info!("Heartbeat enabled: {} every {}s", section.url, section.interval);

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut announced = false;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let announcement = Announcement {
                        port: state.config.server.port,
                        max_players: state.config.server.max_players,
                        name: state.config.server.name.clone(),
                        public: state.config.heartbeat.public,
                        salt: state.salt().to_string(),
                        users: state.player_count().await,
                    };
                    let result = match heartbeat_url(&state.config.heartbeat.url, &announcement) {
                        Ok(url) => send_heartbeat(&client, url).await,
                        Err(e) => Err(e),
                    };
                    match result {
                        Ok(body) if !announced => {
                            info!("Heartbeat accepted: {}", body.trim());
                            announced = true;
                        }
                        Ok(body) => debug!("Heartbeat sent, response: {}", body.trim()),
                        Err(e) => warn!("Heartbeat failed: {e}"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("Heartbeat loop stopped");
    }))
}
