//! Shared server state: connection and player registries, the world, and
//! the broadcast and disconnect primitives.
//!
//! Lock order is connections, then players. The world lock is a plain
//! `RwLock` and is never held across an `.await`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use classic_command::{CommandRegistry, OnlinePlayer};
use classic_proto::packets::{DespawnPlayer, Disconnect, Message, Ping};
use classic_proto::encode_packet;
use classic_world::{storage, World, WorldError};

use crate::config::ServerConfig;
use crate::permissions::PermissionManager;
use crate::player::{spawn_point, AddPlayerError, PlayerRegistry};
use crate::session::Session;

/// Length of the name-verification salt.
pub const SALT_LENGTH: usize = 16;

/// Generate a fresh alphanumeric salt.
pub fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

pub struct ServerState {
    pub config: Arc<ServerConfig>,
    salt: String,
    connections: Mutex<HashMap<SocketAddr, Arc<Session>>>,
    players: Mutex<PlayerRegistry>,
    world: RwLock<World>,
    permissions: std::sync::Mutex<PermissionManager>,
    pub(crate) commands: CommandRegistry,
}

impl ServerState {
    pub fn new(
        config: Arc<ServerConfig>,
        world: World,
        permissions: PermissionManager,
        salt: String,
    ) -> Self {
        Self {
            config,
            salt,
            connections: Mutex::new(HashMap::new()),
            players: Mutex::new(PlayerRegistry::new()),
            world: RwLock::new(world),
            permissions: std::sync::Mutex::new(permissions),
            commands: CommandRegistry::new(),
        }
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub(crate) fn world(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn world_mut(&self) -> RwLockWriteGuard<'_, World> {
        self.world.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawn position for the loaded world.
    pub fn spawn_point(&self) -> [f32; 3] {
        spawn_point(self.world().dimensions())
    }

    pub(crate) async fn players(&self) -> tokio::sync::MutexGuard<'_, PlayerRegistry> {
        self.players.lock().await
    }

    pub fn is_op(&self, name: &str) -> bool {
        self.permissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_op(name)
    }

    /// Update the operator list. Returns false when nothing changed.
    pub fn set_op(&self, name: &str, op: bool) -> bool {
        self.permissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_op(name, op)
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    pub async fn register_session(&self, session: Arc<Session>) {
        let addr = session.address();
        self.connections.lock().await.insert(addr, session);
        debug!("Connection registered: {addr}");
    }

    /// Snapshot of every live session.
    pub async fn sessions(&self) -> Vec<Arc<Session>> {
        self.connections.lock().await.values().cloned().collect()
    }

    pub async fn session(&self, addr: &SocketAddr) -> Option<Arc<Session>> {
        self.connections.lock().await.get(addr).cloned()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Register an identified player and return its id.
    ///
    /// The player starts unspawned: it receives no broadcasts until
    /// [`ServerState::mark_spawned`].
    pub async fn add_player(
        &self,
        session: Arc<Session>,
        name: &str,
        position: [f32; 3],
    ) -> Result<u8, AddPlayerError> {
        let is_op = self.is_op(name);
        let capacity = self.config.server.max_players as usize;
        let result = self
            .players
            .lock()
            .await
            .insert(session, name, position, is_op, capacity);
        if let Err(e) = &result {
            warn!("Rejected player {name}: {e}");
        }
        result
    }

    pub async fn player_count(&self) -> usize {
        self.players.lock().await.len()
    }

    /// Names and positions of every spawned player.
    pub async fn online_players(&self) -> Vec<OnlinePlayer> {
        self.players
            .lock()
            .await
            .iter()
            .filter(|p| p.spawned)
            .map(|p| OnlinePlayer {
                name: p.name.clone(),
                position: p.position,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Send `data` to every spawned player not in `except`.
    ///
    /// The player lock is held for the whole call. Peers whose send fails
    /// are disconnected after delivery to the rest has finished.
    pub async fn broadcast(&self, data: &[u8], except: &[SocketAddr]) {
        let failed = self.deliver(data, except).await;
        self.disconnect_all(failed).await;
    }

    async fn deliver(&self, data: &[u8], except: &[SocketAddr]) -> Vec<SocketAddr> {
        let players = self.players.lock().await;
        let mut failed = Vec::new();
        for player in players.iter() {
            let addr = player.address();
            if !player.spawned || except.contains(&addr) {
                continue;
            }
            if let Err(e) = player.session.send(data).await {
                debug!("Send to {} ({addr}) failed: {e}", player.name);
                failed.push(addr);
            }
        }
        failed
    }

    /// Send a chat line from the server to every spawned player.
    pub async fn broadcast_message(&self, text: &str) {
        self.broadcast(&encode_packet(&Message::server(text)), &[])
            .await;
    }

    /// Send `data` to one connection; a failure disconnects it.
    pub async fn send_to(&self, addr: SocketAddr, data: &[u8]) {
        let Some(session) = self.session(&addr).await else {
            return;
        };
        if let Err(e) = session.send(data).await {
            debug!("Send to {addr} failed: {e}");
            self.disconnect(addr).await;
        }
    }

    /// Send a disconnect packet then tear the connection down.
    pub async fn reject(&self, session: &Session, reason: &str) {
        info!("Disconnecting {}: {reason}", session.address());
        let _ = session.send(&encode_packet(&Disconnect::new(reason))).await;
        self.disconnect(session.address()).await;
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Remove a connection and its player, if any. Safe to call repeatedly
    /// and concurrently; only the call that removes the player announces it.
    pub async fn disconnect(&self, addr: SocketAddr) {
        self.disconnect_all(vec![addr]).await;
    }

    async fn disconnect_all(&self, mut pending: Vec<SocketAddr>) {
        while let Some(addr) = pending.pop() {
            let (session, player) = {
                let mut connections = self.connections.lock().await;
                let mut players = self.players.lock().await;
                (connections.remove(&addr), players.remove_by_addr(&addr))
            };
            if let Some(session) = &session {
                session.shutdown().await;
                debug!("Connection closed: {addr}");
            }
            let Some(player) = player else {
                continue;
            };
            info!("Player {} has quit", player.name);
            if !player.spawned {
                continue;
            }
            let despawn = encode_packet(&DespawnPlayer {
                player_id: player.id,
            });
            pending.extend(self.deliver(&despawn, &[]).await);
            let quit = encode_packet(&Message::server(format!("{} has quit", player.name)));
            pending.extend(self.deliver(&quit, &[]).await);
        }
    }

    /// Disconnect a player with a reason and tell everyone else.
    /// Returns false when no such player exists.
    pub async fn kick(&self, id: u8, reason: &str) -> bool {
        let (session, name) = match self.players.lock().await.get(id) {
            Some(p) => (p.session.clone(), p.name.clone()),
            None => return false,
        };
        let addr = session.address();
        info!("Kicking player {name} for {reason}");
        let _ = session.send(&encode_packet(&Disconnect::new(reason))).await;
        let notice = encode_packet(&Message::server(format!("Player {name} kicked, {reason}")));
        self.broadcast(&notice, &[addr]).await;
        self.disconnect(addr).await;
        true
    }

    /// Ping every connection; failures disconnect.
    pub async fn ping_all(&self) {
        let ping = encode_packet(&Ping);
        let mut failed = Vec::new();
        for session in self.sessions().await {
            if let Err(e) = session.send(&ping).await {
                debug!("Keepalive to {} failed: {e}", session.address());
                failed.push(session.address());
            }
        }
        self.disconnect_all(failed).await;
    }

    /// Tell every connection the server is going away and close it.
    pub async fn disconnect_everyone(&self, reason: &str) {
        let packet = encode_packet(&Disconnect::new(reason));
        for session in self.sessions().await {
            let _ = session.send(&packet).await;
            self.disconnect(session.address()).await;
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn save_path(&self) -> PathBuf {
        PathBuf::from(&self.config.world.save_file)
    }

    /// Compressed snapshot of the current world.
    pub fn world_snapshot(&self) -> Result<Bytes, WorldError> {
        Ok(Bytes::from(self.world().encode()?))
    }

    /// Write the world to the save file.
    pub fn save_world(&self) -> Result<(), WorldError> {
        let path = self.save_path();
        info!("Saving the world to {}", path.display());
        let snapshot = self.world_snapshot()?;
        storage::save_snapshot(&path, &snapshot)
    }
}
