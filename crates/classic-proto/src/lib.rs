//! Minecraft Classic protocol types and packet definitions.

pub mod auth;
pub mod codec;
pub mod error;
pub mod packets;

pub use codec::{decode_packet, encode_packet, Direction, Packet, ProtoDecode, ProtoEncode};
pub use error::ProtoError;
pub use packets::{ClientPacket, ServerPacket};
