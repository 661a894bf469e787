//! Protocol handling: turns decoded client packets into state changes and
//! broadcasts.

mod block;
mod chat;
mod login;
mod movement;

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use tracing::{debug, warn};

use classic_proto::packets::{
    level_chunks, BlockUpdate, LevelFinalize, LevelInitialize, Message,
    PlayerIdentification, PositionAndOrientation, ServerIdentification, SetBlock, SpawnPlayer,
    UpdateUserType,
};
use classic_proto::{encode_packet, ClientPacket};

use crate::server::ServerState;
use crate::session::{LoginState, Session};

impl ServerState {
    /// Read whatever `session` has ready and handle it. I/O failures
    /// disconnect the session.
    pub async fn poll_session(&self, session: &Arc<Session>) {
        match session.receive_available() {
            Ok(Some(batch)) => self.handle_batch(session, batch).await,
            Ok(None) => {}
            Err(e) => {
                debug!("Read from {} failed: {e}", session.address());
                self.disconnect(session.address()).await;
            }
        }
    }

    /// Decode and dispatch every whole packet in `batch`.
    ///
    /// A trailing partial packet is kept on the session for the next read.
    /// An unknown packet id discards the rest of the batch; the connection
    /// stays open.
    pub async fn handle_batch(&self, session: &Arc<Session>, mut batch: Bytes) {
        while batch.has_remaining() {
            if session.state() == LoginState::Disconnected {
                return;
            }
            match ClientPacket::decode(&mut batch) {
                Ok(packet) => self.handle_packet(session, packet).await,
                Err(e) if e.is_incomplete() => {
                    session.keep_remainder(&batch);
                    return;
                }
                Err(e) => {
                    warn!(
                        "Malformed packet from {}: {e}, dropping {} buffered bytes",
                        session.address(),
                        batch.remaining()
                    );
                    return;
                }
            }
        }
    }

    async fn handle_packet(&self, session: &Arc<Session>, packet: ClientPacket) {
        match packet {
            ClientPacket::Identification(p) => self.handle_identification(session, p).await,
            ClientPacket::Position(p) => self.handle_position(session, p).await,
            ClientPacket::SetBlock(p) => self.handle_set_block(session, p).await,
            ClientPacket::Message(p) => self.handle_message(session, p).await,
        }
    }

    /// Send a server chat line to one connection.
    pub(crate) async fn send_message(&self, addr: SocketAddr, text: &str) {
        self.send_to(addr, &encode_packet(&Message::server(text)))
            .await;
    }
}

#[cfg(test)]
mod tests;
