//! PlayerIdentification (0x00) — Client → Server.
//! ServerIdentification (0x00) — Server → Client.
//! UpdateUserType (0x0F) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{
    ensure_remaining, read_string, write_string, Packet, ProtoDecode, ProtoEncode, STRING_LENGTH,
};
use crate::error::ProtoError;

/// Protocol version spoken by this server.
pub const PROTOCOL_VERSION: u8 = 7;

/// User type byte for regular players.
pub const USER_TYPE_NORMAL: u8 = 0x00;

/// User type byte for operators (allows breaking bedrock client-side).
pub const USER_TYPE_OP: u8 = 0x64;

/// First packet a client sends after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentification {
    pub protocol_version: u8,
    pub username: String,
    /// Hex MD5 digest of `salt ‖ username`, or garbage when unverified.
    pub verification_key: String,
    pub reserved: u8,
}

impl Packet for PlayerIdentification {
    const ID: u8 = super::id::IDENTIFICATION;
    const BODY_SIZE: usize = 1 + STRING_LENGTH + STRING_LENGTH + 1;
}

impl ProtoEncode for PlayerIdentification {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.protocol_version);
        write_string(buf, &self.username);
        write_string(buf, &self.verification_key);
        buf.put_u8(self.reserved);
    }
}

impl ProtoDecode for PlayerIdentification {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            protocol_version: buf.get_u8(),
            username: read_string(buf)?,
            verification_key: read_string(buf)?,
            reserved: buf.get_u8(),
        })
    }
}

/// Reply to a successful identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentification {
    pub protocol_version: u8,
    pub name: String,
    pub motd: String,
    pub user_type: u8,
}

impl ServerIdentification {
    pub fn new(name: impl Into<String>, motd: impl Into<String>, is_op: bool) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            name: name.into(),
            motd: motd.into(),
            user_type: if is_op { USER_TYPE_OP } else { USER_TYPE_NORMAL },
        }
    }
}

impl Packet for ServerIdentification {
    const ID: u8 = super::id::IDENTIFICATION;
    const BODY_SIZE: usize = 1 + STRING_LENGTH + STRING_LENGTH + 1;
}

impl ProtoEncode for ServerIdentification {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.protocol_version);
        write_string(buf, &self.name);
        write_string(buf, &self.motd);
        buf.put_u8(self.user_type);
    }
}

impl ProtoDecode for ServerIdentification {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            protocol_version: buf.get_u8(),
            name: read_string(buf)?,
            motd: read_string(buf)?,
            user_type: buf.get_u8(),
        })
    }
}

/// Changes the client's operator status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateUserType {
    pub user_type: u8,
}

impl UpdateUserType {
    pub fn new(is_op: bool) -> Self {
        Self {
            user_type: if is_op { USER_TYPE_OP } else { USER_TYPE_NORMAL },
        }
    }
}

impl Packet for UpdateUserType {
    const ID: u8 = super::id::UPDATE_USER_TYPE;
    const BODY_SIZE: usize = 1;
}

impl ProtoEncode for UpdateUserType {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.user_type);
    }
}

impl ProtoDecode for UpdateUserType {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            user_type: buf.get_u8(),
        })
    }
}
