//! Packet definitions and the per-direction id tables.

pub mod block;
pub mod identification;
pub mod level;
pub mod message;
pub mod player;

pub use block::{BlockUpdate, SetBlock, SetBlockMode};
pub use identification::{
    PlayerIdentification, ServerIdentification, UpdateUserType, PROTOCOL_VERSION,
};
pub use level::{level_chunks, LevelDataChunk, LevelFinalize, LevelInitialize};
pub use message::{Disconnect, Message, Ping};
pub use player::{DespawnPlayer, PositionAndOrientation, SpawnPlayer};

use bytes::{Buf, Bytes};

use crate::codec::{decode_packet, encode_packet, ensure_remaining, Direction, Packet};
use crate::error::ProtoError;

/// Packet ids. The two directions share the byte space but not the layouts.
pub mod id {
    pub const IDENTIFICATION: u8 = 0x00;
    pub const PING: u8 = 0x01;
    pub const LEVEL_INITIALIZE: u8 = 0x02;
    pub const LEVEL_DATA_CHUNK: u8 = 0x03;
    pub const LEVEL_FINALIZE: u8 = 0x04;
    pub const SET_BLOCK: u8 = 0x05;
    pub const BLOCK_UPDATE: u8 = 0x06;
    pub const SPAWN_PLAYER: u8 = 0x07;
    pub const POSITION_AND_ORIENTATION: u8 = 0x08;
    pub const DESPAWN_PLAYER: u8 = 0x0C;
    pub const MESSAGE: u8 = 0x0D;
    pub const DISCONNECT: u8 = 0x0E;
    pub const UPDATE_USER_TYPE: u8 = 0x0F;
}

/// Total wire size of a packet id in the given direction, or `None` when the
/// id is not registered there.
pub fn wire_size(packet_id: u8, direction: Direction) -> Option<usize> {
    let size = match direction {
        Direction::ClientToServer => match packet_id {
            id::IDENTIFICATION => PlayerIdentification::wire_size(),
            id::SET_BLOCK => SetBlock::wire_size(),
            id::POSITION_AND_ORIENTATION => PositionAndOrientation::wire_size(),
            id::MESSAGE => Message::wire_size(),
            _ => return None,
        },
        Direction::ServerToClient => match packet_id {
            id::IDENTIFICATION => ServerIdentification::wire_size(),
            id::PING => Ping::wire_size(),
            id::LEVEL_INITIALIZE => LevelInitialize::wire_size(),
            id::LEVEL_DATA_CHUNK => LevelDataChunk::wire_size(),
            id::LEVEL_FINALIZE => LevelFinalize::wire_size(),
            id::BLOCK_UPDATE => BlockUpdate::wire_size(),
            id::SPAWN_PLAYER => SpawnPlayer::wire_size(),
            id::POSITION_AND_ORIENTATION => PositionAndOrientation::wire_size(),
            id::DESPAWN_PLAYER => DespawnPlayer::wire_size(),
            id::MESSAGE => Message::wire_size(),
            id::DISCONNECT => Disconnect::wire_size(),
            id::UPDATE_USER_TYPE => UpdateUserType::wire_size(),
            _ => return None,
        },
    };
    Some(size)
}

/// Peek the id at the front of `buf` and check it against the direction's
/// table and the number of buffered bytes, without consuming anything.
fn peek_id(buf: &impl Buf, direction: Direction) -> Result<u8, ProtoError> {
    ensure_remaining(buf, 1)?;
    let packet_id = buf.chunk()[0];
    let size = wire_size(packet_id, direction).ok_or(ProtoError::UnknownPacketId {
        id: packet_id,
        direction,
    })?;
    ensure_remaining(buf, size)?;
    Ok(packet_id)
}

/// Packets a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    Identification(PlayerIdentification),
    SetBlock(SetBlock),
    Position(PositionAndOrientation),
    Message(Message),
}

impl ClientPacket {
    /// Decode the next packet from `buf`.
    ///
    /// Nothing is consumed on error, so an incomplete packet can be retried
    /// once more bytes arrive.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let packet_id = peek_id(buf, Direction::ClientToServer)?;
        Ok(match packet_id {
            id::IDENTIFICATION => Self::Identification(decode_packet(buf)?),
            id::SET_BLOCK => Self::SetBlock(decode_packet(buf)?),
            id::POSITION_AND_ORIENTATION => Self::Position(decode_packet(buf)?),
            id::MESSAGE => Self::Message(decode_packet(buf)?),
            other => {
                return Err(ProtoError::UnknownPacketId {
                    id: other,
                    direction: Direction::ClientToServer,
                })
            }
        })
    }

    pub fn encode(&self) -> Bytes {
        match self {
            Self::Identification(p) => encode_packet(p),
            Self::SetBlock(p) => encode_packet(p),
            Self::Position(p) => encode_packet(p),
            Self::Message(p) => encode_packet(p),
        }
    }
}

/// Packets the server may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerPacket {
    Identification(ServerIdentification),
    Ping(Ping),
    LevelInitialize(LevelInitialize),
    LevelDataChunk(LevelDataChunk),
    LevelFinalize(LevelFinalize),
    BlockUpdate(BlockUpdate),
    SpawnPlayer(SpawnPlayer),
    Position(PositionAndOrientation),
    DespawnPlayer(DespawnPlayer),
    Message(Message),
    Disconnect(Disconnect),
    UpdateUserType(UpdateUserType),
}

impl ServerPacket {
    /// Decode the next packet from `buf`. Nothing is consumed on error.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let packet_id = peek_id(buf, Direction::ServerToClient)?;
        Ok(match packet_id {
            id::IDENTIFICATION => Self::Identification(decode_packet(buf)?),
            id::PING => Self::Ping(decode_packet(buf)?),
            id::LEVEL_INITIALIZE => Self::LevelInitialize(decode_packet(buf)?),
            id::LEVEL_DATA_CHUNK => Self::LevelDataChunk(decode_packet(buf)?),
            id::LEVEL_FINALIZE => Self::LevelFinalize(decode_packet(buf)?),
            id::BLOCK_UPDATE => Self::BlockUpdate(decode_packet(buf)?),
            id::SPAWN_PLAYER => Self::SpawnPlayer(decode_packet(buf)?),
            id::POSITION_AND_ORIENTATION => Self::Position(decode_packet(buf)?),
            id::DESPAWN_PLAYER => Self::DespawnPlayer(decode_packet(buf)?),
            id::MESSAGE => Self::Message(decode_packet(buf)?),
            id::DISCONNECT => Self::Disconnect(decode_packet(buf)?),
            id::UPDATE_USER_TYPE => Self::UpdateUserType(decode_packet(buf)?),
            other => {
                return Err(ProtoError::UnknownPacketId {
                    id: other,
                    direction: Direction::ServerToClient,
                })
            }
        })
    }

    pub fn encode(&self) -> Bytes {
        match self {
            Self::Identification(p) => encode_packet(p),
            Self::Ping(p) => encode_packet(p),
            Self::LevelInitialize(p) => encode_packet(p),
            Self::LevelDataChunk(p) => encode_packet(p),
            Self::LevelFinalize(p) => encode_packet(p),
            Self::BlockUpdate(p) => encode_packet(p),
            Self::SpawnPlayer(p) => encode_packet(p),
            Self::Position(p) => encode_packet(p),
            Self::DespawnPlayer(p) => encode_packet(p),
            Self::Message(p) => encode_packet(p),
            Self::Disconnect(p) => encode_packet(p),
            Self::UpdateUserType(p) => encode_packet(p),
        }
    }
}
