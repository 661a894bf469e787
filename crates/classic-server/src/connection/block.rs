use super::*;

impl ServerState {
    pub(super) async fn handle_set_block(&self, session: &Arc<Session>, packet: SetBlock) {
        if session.state() != LoginState::Active {
            return;
        }
        let (x, y, z) = (packet.x as i32, packet.y as i32, packet.z as i32);
        let block_type = packet.resulting_block();
        {
            let mut world = self.world_mut();
            if !world.in_bounds(x, y, z) {
                debug!(
                    "Ignoring out-of-bounds block edit ({x}, {y}, {z}) from {}",
                    session.address()
                );
                return;
            }
            world.set_block(x as usize, y as usize, z as usize, block_type);
        }

        let update = BlockUpdate {
            x: packet.x,
            y: packet.y,
            z: packet.z,
            block_type,
        };
        self.broadcast(&encode_packet(&update), &[]).await;
    }
}
