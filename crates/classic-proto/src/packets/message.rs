//! Message (0x0D) — Bidirectional.
//! Ping (0x01), Disconnect (0x0E) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{
    ensure_remaining, read_string, write_string, Packet, ProtoDecode, ProtoEncode, STRING_LENGTH,
};
use crate::error::ProtoError;

/// Player id used for messages that originate from the server itself.
pub const SERVER_MESSAGE_ID: u8 = 0;

/// A chat line.
///
/// Clients send an unused byte in place of `player_id`; the server sets it
/// to the speaking player's id, or [`SERVER_MESSAGE_ID`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub player_id: u8,
    pub text: String,
}

impl Message {
    /// A message from the server.
    pub fn server(text: impl Into<String>) -> Self {
        Self {
            player_id: SERVER_MESSAGE_ID,
            text: text.into(),
        }
    }
}

impl Packet for Message {
    const ID: u8 = super::id::MESSAGE;
    const BODY_SIZE: usize = 1 + STRING_LENGTH;
}

impl ProtoEncode for Message {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.player_id);
        write_string(buf, &self.text);
    }
}

impl ProtoDecode for Message {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            player_id: buf.get_u8(),
            text: read_string(buf)?,
        })
    }
}

/// Keepalive probe; carries no fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ping;

impl Packet for Ping {
    const ID: u8 = super::id::PING;
    const BODY_SIZE: usize = 0;
}

impl ProtoEncode for Ping {
    fn proto_encode(&self, _buf: &mut impl BufMut) {}
}

impl ProtoDecode for Ping {
    fn proto_decode(_buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self)
    }
}

/// Sent by the server right before it drops a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub reason: String,
}

impl Disconnect {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Packet for Disconnect {
    const ID: u8 = super::id::DISCONNECT;
    const BODY_SIZE: usize = STRING_LENGTH;
}

impl ProtoEncode for Disconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.reason);
    }
}

impl ProtoDecode for Disconnect {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            reason: read_string(buf)?,
        })
    }
}
