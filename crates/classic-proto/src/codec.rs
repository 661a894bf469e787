//! Protocol encoding/decoding traits and fixed-width field helpers.
//!
//! Every Classic packet is a one-byte id followed by a fixed layout of
//! fields, so the number of bytes a packet occupies is known from its id
//! alone. All multi-byte integers are big-endian.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtoError;

/// Width of a string field on the wire.
pub const STRING_LENGTH: usize = 64;

/// Width of a byte-array field on the wire.
pub const BLOB_LENGTH: usize = 1024;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// A fixed-layout packet body with its one-byte id.
pub trait Packet: ProtoEncode + ProtoDecode {
    /// Leading type byte.
    const ID: u8;
    /// Size of the body in bytes, excluding the id.
    const BODY_SIZE: usize;

    /// Total size on the wire.
    fn wire_size() -> usize {
        1 + Self::BODY_SIZE
    }
}

/// Which identifier table a packet id is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientToServer => f.write_str("serverbound"),
            Self::ServerToClient => f.write_str("clientbound"),
        }
    }
}

/// Encode a packet as `id + body`.
pub fn encode_packet<P: Packet>(packet: &P) -> Bytes {
    let mut buf = BytesMut::with_capacity(P::wire_size());
    buf.put_u8(P::ID);
    packet.proto_encode(&mut buf);
    buf.freeze()
}

/// Decode a packet whose id must be `P::ID`.
///
/// The buffer is left untouched when the id does not match or the body
/// is incomplete.
pub fn decode_packet<P: Packet>(buf: &mut impl Buf) -> Result<P, ProtoError> {
    ensure_remaining(buf, P::wire_size())?;
    let id = buf.chunk()[0];
    if id != P::ID {
        return Err(ProtoError::UnexpectedPacketId {
            expected: P::ID,
            got: id,
        });
    }
    buf.advance(1);
    P::proto_decode(buf)
}

/// Fail with [`ProtoError::BufferTooShort`] unless `needed` bytes remain.
pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Write a 64-byte space-padded ASCII string. Longer input is truncated and
/// non-ASCII characters become `?`.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    let mut written = 0;
    for ch in s.chars().take(STRING_LENGTH) {
        buf.put_u8(if ch.is_ascii() { ch as u8 } else { b'?' });
        written += 1;
    }
    buf.put_bytes(b' ', STRING_LENGTH - written);
}

/// Read a 64-byte string field and strip its trailing padding.
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    ensure_remaining(buf, STRING_LENGTH)?;
    let mut raw = [0u8; STRING_LENGTH];
    buf.copy_to_slice(&mut raw);
    let text: String = raw
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect();
    Ok(text.trim_end().to_string())
}

/// Write a 1024-byte blob, truncating or zero-padding `data`.
pub fn write_blob(buf: &mut impl BufMut, data: &[u8]) {
    let len = data.len().min(BLOB_LENGTH);
    buf.put_slice(&data[..len]);
    buf.put_bytes(0, BLOB_LENGTH - len);
}

/// Read a 1024-byte blob.
pub fn read_blob(buf: &mut impl Buf) -> Result<Bytes, ProtoError> {
    ensure_remaining(buf, BLOB_LENGTH)?;
    Ok(buf.copy_to_bytes(BLOB_LENGTH))
}
