//! PositionAndOrientation (0x08) — Bidirectional.
//! SpawnPlayer (0x07), DespawnPlayer (0x0C) — Server → Client.
//!
//! Positions travel as fixed-point shorts in 1/32 block units.

use bytes::{Buf, BufMut};

use crate::codec::{
    ensure_remaining, read_string, write_string, Packet, ProtoDecode, ProtoEncode, STRING_LENGTH,
};
use crate::error::ProtoError;

/// Signed player id a client uses to refer to itself.
pub const SELF_ID: i8 = -1;

/// Fixed-point units per block.
pub const UNITS_PER_BLOCK: f32 = 32.0;

/// Convert a block coordinate to wire units, saturating at the i16 range.
pub fn to_fixed(v: f32) -> i16 {
    (v * UNITS_PER_BLOCK) as i16
}

/// Convert wire units back to a block coordinate.
pub fn from_fixed(v: i16) -> f32 {
    v as f32 / UNITS_PER_BLOCK
}

/// A player's position and look direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionAndOrientation {
    /// Sender's id; clients always send -1, the server re-tags it.
    pub player_id: i8,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub yaw: u8,
    pub pitch: u8,
}

impl PositionAndOrientation {
    /// Build from block coordinates.
    pub fn at(player_id: i8, position: [f32; 3], yaw: u8, pitch: u8) -> Self {
        Self {
            player_id,
            x: to_fixed(position[0]),
            y: to_fixed(position[1]),
            z: to_fixed(position[2]),
            yaw,
            pitch,
        }
    }

    /// Position in block coordinates.
    pub fn position(&self) -> [f32; 3] {
        [from_fixed(self.x), from_fixed(self.y), from_fixed(self.z)]
    }
}

impl Packet for PositionAndOrientation {
    const ID: u8 = super::id::POSITION_AND_ORIENTATION;
    const BODY_SIZE: usize = 9;
}

impl ProtoEncode for PositionAndOrientation {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.player_id);
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.yaw);
        buf.put_u8(self.pitch);
    }
}

impl ProtoDecode for PositionAndOrientation {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            player_id: buf.get_i8(),
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            yaw: buf.get_u8(),
            pitch: buf.get_u8(),
        })
    }
}

/// Makes a player visible to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnPlayer {
    pub player_id: i8,
    pub name: String,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub yaw: u8,
    pub pitch: u8,
}

impl SpawnPlayer {
    pub fn at(player_id: i8, name: impl Into<String>, position: [f32; 3], yaw: u8, pitch: u8) -> Self {
        Self {
            player_id,
            name: name.into(),
            x: to_fixed(position[0]),
            y: to_fixed(position[1]),
            z: to_fixed(position[2]),
            yaw,
            pitch,
        }
    }
}

impl Packet for SpawnPlayer {
    const ID: u8 = super::id::SPAWN_PLAYER;
    const BODY_SIZE: usize = 1 + STRING_LENGTH + 6 + 2;
}

impl ProtoEncode for SpawnPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.player_id);
        write_string(buf, &self.name);
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.yaw);
        buf.put_u8(self.pitch);
    }
}

impl ProtoDecode for SpawnPlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            player_id: buf.get_i8(),
            name: read_string(buf)?,
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            yaw: buf.get_u8(),
            pitch: buf.get_u8(),
        })
    }
}

/// Removes a player from a client's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DespawnPlayer {
    pub player_id: u8,
}

impl Packet for DespawnPlayer {
    const ID: u8 = super::id::DESPAWN_PLAYER;
    const BODY_SIZE: usize = 1;
}

impl ProtoEncode for DespawnPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.player_id);
    }
}

impl ProtoDecode for DespawnPlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            player_id: buf.get_u8(),
        })
    }
}
