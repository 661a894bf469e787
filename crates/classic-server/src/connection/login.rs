use super::*;

use classic_proto::auth;
use classic_proto::packets::player::SELF_ID;
use classic_proto::packets::PROTOCOL_VERSION;
use tracing::info;


impl ServerState {
    pub(super) async fn handle_identification(
        &self,
        session: &Arc<Session>,
        packet: PlayerIdentification,
    ) {
        if session.state() != LoginState::Unauthenticated {
            debug!("Ignoring repeated identification from {}", session.address());
            return;
        }
        let addr = session.address();
        let name = packet.username;

        if packet.protocol_version != PROTOCOL_VERSION {
            debug!(
                "{name} ({addr}) uses protocol version {}",
                packet.protocol_version
            );
        }
        if name.is_empty() {
            self.reject(session, "Invalid name").await;
            return;
        }
        if self.config.server.verify_names
            && !auth::verify(self.salt(), &name, &packet.verification_key)
        {
            info!("Unable to verify player {name} ({addr})");
            self.reject(session, "Unable to verify name").await;
            return;
        }

        let spawn_at = self.spawn_point();
        let id = match self.add_player(session.clone(), &name, spawn_at).await {
            Ok(id) => id,
            Err(e) => {
                self.reject(session, &e.to_string()).await;
                return;
            }
        };
        info!("Player {name} joined from {addr} with id {id}");

        if let Err(e) = self.send_level(session, self.is_op(&name)).await {
            debug!("Level stream to {addr} failed: {e}");
            self.disconnect(addr).await;
            return;
        }

        let teleport = encode_packet(&PositionAndOrientation::at(
            SELF_ID,
            spawn_at,
            0,
            0,
        ));
        if session.send(&teleport).await.is_err() {
            self.disconnect(addr).await;
            return;
        }

        // Mark spawned and snapshot the others in one critical section so a
        // concurrent join sees exactly one of the two spawn directions.
        let others: Vec<SpawnPlayer> = {
            let mut players = self.players().await;
            match players.get_by_addr_mut(&addr) {
                Some(player) => player.spawned = true,
                None => return,
            }
            players
                .iter()
                .filter(|p| p.spawned && p.id != id)
                .map(|p| SpawnPlayer::at(p.id as i8, p.name.clone(), p.position, p.yaw, p.pitch))
                .collect()
        };
        session.set_state(LoginState::Active);

        let spawn = encode_packet(&SpawnPlayer::at(id as i8, name.clone(), spawn_at, 0, 0));
        self.broadcast(&spawn, &[addr]).await;
        for other in &others {
            self.send_to(addr, &encode_packet(other)).await;
        }
        self.broadcast_message(&format!("{name} has joined!")).await;
    }

    /// Server identification, then the world as init + chunks + finalize.
    async fn send_level(&self, session: &Session, is_op: bool) -> std::io::Result<()> {
        let ident = ServerIdentification::new(
            &self.config.server.name,
            &self.config.server.motd,
            is_op,
        );
        session.send(&encode_packet(&ident)).await?;

        let (snapshot, dims) = {
            let world = self.world();
            (world.encode(), world.dimensions())
        };
        let snapshot = snapshot.map_err(std::io::Error::other)?;

        session.send(&encode_packet(&LevelInitialize)).await?;
        for chunk in level_chunks(&Bytes::from(snapshot)) {
            session.send(&encode_packet(&chunk)).await?;
        }
        session
            .send(&encode_packet(&LevelFinalize {
                x: dims.width as i16,
                y: dims.height as i16,
                z: dims.depth as i16,
            }))
            .await
    }

    /// Tell an online player its operator status changed.
    pub(super) async fn send_user_type(&self, name: &str, op: bool) {
        let addr = match self.players().await.find_by_name(name) {
            Some(p) => p.address(),
            None => return,
        };
        self.send_to(addr, &encode_packet(&UpdateUserType::new(op)))
            .await;
    }
}
