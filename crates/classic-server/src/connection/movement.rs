use super::*;

use classic_proto::packets::player::SELF_ID;

impl ServerState {
    pub(super) async fn handle_position(
        &self,
        session: &Arc<Session>,
        packet: PositionAndOrientation,
    ) {
        if session.state() != LoginState::Active {
            return;
        }
        let addr = session.address();

        let id = {
            let mut players = self.players().await;
            let Some(player) = players.get_by_addr_mut(&addr) else {
                return;
            };
            player.position = packet.position();
            player.yaw = packet.yaw;
            player.pitch = packet.pitch;
            player.id
        };

        let retagged = PositionAndOrientation {
            player_id: id as i8,
            ..packet
        };
        self.broadcast(&encode_packet(&retagged), &[addr]).await;
    }

    /// Move a player: the player is told with the self id, everyone else
    /// with its real id.
    pub(super) async fn teleport(&self, addr: SocketAddr, position: [f32; 3]) {
        let (id, yaw, pitch) = {
            let mut players = self.players().await;
            let Some(player) = players.get_by_addr_mut(&addr) else {
                return;
            };
            player.position = position;
            (player.id, player.yaw, player.pitch)
        };
        let own = PositionAndOrientation::at(SELF_ID, position, yaw, pitch);
        self.send_to(addr, &encode_packet(&own)).await;
        let others = PositionAndOrientation::at(id as i8, position, yaw, pitch);
        self.broadcast(&encode_packet(&others), &[addr]).await;
    }
}
