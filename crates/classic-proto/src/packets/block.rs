//! SetBlock (0x05) — Client → Server.
//! BlockUpdate (0x06) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, Packet, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Block type id of air.
pub const AIR: u8 = 0;

/// Whether a block edit destroys or places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetBlockMode {
    Destroy,
    Place,
}

impl SetBlockMode {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Destroy,
            _ => Self::Place,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Destroy => 0,
            Self::Place => 1,
        }
    }
}

/// A block edit requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlock {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub mode: u8,
    pub block_type: u8,
}

impl SetBlock {
    pub fn mode(&self) -> SetBlockMode {
        SetBlockMode::from_u8(self.mode)
    }

    /// The block that ends up at the target position.
    pub fn resulting_block(&self) -> u8 {
        match self.mode() {
            SetBlockMode::Destroy => AIR,
            SetBlockMode::Place => self.block_type,
        }
    }
}

impl Packet for SetBlock {
    const ID: u8 = super::id::SET_BLOCK;
    const BODY_SIZE: usize = 8;
}

impl ProtoEncode for SetBlock {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.mode);
        buf.put_u8(self.block_type);
    }
}

impl ProtoDecode for SetBlock {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            mode: buf.get_u8(),
            block_type: buf.get_u8(),
        })
    }
}

/// Tells clients that a block changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockUpdate {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub block_type: u8,
}

impl Packet for BlockUpdate {
    const ID: u8 = super::id::BLOCK_UPDATE;
    const BODY_SIZE: usize = 7;
}

impl ProtoEncode for BlockUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.block_type);
    }
}

impl ProtoDecode for BlockUpdate {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            block_type: buf.get_u8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_packet, encode_packet};

    #[test]
    fn destroy_coerces_to_air() {
        let pkt = SetBlock {
            x: 1,
            y: 2,
            z: 3,
            mode: 0,
            block_type: 5,
        };
        assert_eq!(pkt.mode(), SetBlockMode::Destroy);
        assert_eq!(pkt.resulting_block(), AIR);
    }

    #[test]
    fn place_keeps_block_type() {
        let pkt = SetBlock {
            x: 1,
            y: 2,
            z: 3,
            mode: 1,
            block_type: 5,
        };
        assert_eq!(pkt.resulting_block(), 5);
    }

    #[test]
    fn set_block_big_endian() {
        let pkt = SetBlock {
            x: 9999,
            y: -1,
            z: 0,
            mode: 1,
            block_type: 1,
        };
        let bytes = encode_packet(&pkt);
        assert_eq!(
            &bytes[..],
            &[0x05, 0x27, 0x0F, 0xFF, 0xFF, 0x00, 0x00, 0x01, 0x01]
        );
        let decoded: SetBlock = decode_packet(&mut bytes.clone()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn block_update_roundtrip() {
        let pkt = BlockUpdate {
            x: 255,
            y: 63,
            z: 0,
            block_type: 49,
        };
        let bytes = encode_packet(&pkt);
        assert_eq!(bytes.len(), 8);
        let decoded: BlockUpdate = decode_packet(&mut bytes.clone()).unwrap();
        assert_eq!(decoded, pkt);
    }
}
