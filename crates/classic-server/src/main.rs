mod config;
mod connection;
mod heartbeat;
mod permissions;
mod player;
mod server;
mod session;
mod tasks;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use config::ServerConfig;
use permissions::PermissionManager;
use server::ServerState;
use tokio::net::TcpListener;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "server.toml";

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = if Path::new(&config_path).exists() {
        match ServerConfig::load(&config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load {config_path}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("{config_path} not found, using defaults");
        ServerConfig::default()
    };
    let config = Arc::new(config);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "Classic server v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.address,
        config.server.port
    );
    info!("Name: {}", config.server.name);
    info!("MOTD: {}", config.server.motd);
    info!("Max players: {}", config.server.max_players);
    info!("Verify names: {}", config.server.verify_names);

    let addr: SocketAddr = match format!("{}:{}", config.server.address, config.server.port).parse()
    {
        Ok(a) => a,
        Err(e) => {
            error!("Invalid bind address {}: {e}", config.server.address);
            std::process::exit(1);
        }
    };

    let dimensions = match config.world.dimensions() {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let world = classic_world::storage::load_or_generate(Path::new(&config.world.save_file), dimensions);
    let permissions = PermissionManager::load(&config.server.ops_file);
    let salt = server::generate_salt();
    info!("Salt: {salt}");

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("Listening on {addr}");

    let state = Arc::new(ServerState::new(config, world, permissions, salt));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let mut handles = vec![
        tasks::spawn_accept(state.clone(), listener, shutdown_rx.clone()),
        tasks::spawn_poll(state.clone(), shutdown_rx.clone()),
        tasks::spawn_keepalive(state.clone(), shutdown_rx.clone()),
    ];
    handles.extend(tasks::spawn_autosave(state.clone(), shutdown_rx.clone()));
    handles.extend(heartbeat::spawn(state.clone(), shutdown_rx.clone()));

    for handle in handles {
        if let Err(e) = handle.await {
            error!("Background task failed: {e}");
        }
    }

    info!("Closing {} connections", state.connection_count().await);
    state.disconnect_everyone("Server closing").await;
    info!("Saving world before shutdown...");
    if let Err(e) = state.save_world() {
        error!("Final save failed: {e}");
    }
    info!("Server shut down.");
}
