//! LevelInitialize (0x02), LevelDataChunk (0x03), LevelFinalize (0x04) — Server → Client.
//!
//! The world snapshot is streamed as one init packet, a run of data chunks
//! of at most 1024 bytes each, and a finalize packet carrying the world size.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{
    ensure_remaining, read_blob, write_blob, Packet, ProtoDecode, ProtoEncode, BLOB_LENGTH,
};
use crate::error::ProtoError;

/// Announces the start of a level stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelInitialize;

impl Packet for LevelInitialize {
    const ID: u8 = super::id::LEVEL_INITIALIZE;
    const BODY_SIZE: usize = 0;
}

impl ProtoEncode for LevelInitialize {
    fn proto_encode(&self, _buf: &mut impl BufMut) {}
}

impl ProtoDecode for LevelInitialize {
    fn proto_decode(_buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self)
    }
}

/// One slice of the compressed level snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDataChunk {
    /// Number of meaningful bytes in `data`.
    pub length: i16,
    /// Always 1024 bytes on the wire; zero-padded past `length`.
    pub data: Bytes,
    pub percent: u8,
}

impl LevelDataChunk {
    /// The meaningful prefix of `data`.
    pub fn payload(&self) -> &[u8] {
        let len = (self.length.max(0) as usize).min(self.data.len());
        &self.data[..len]
    }
}

impl Packet for LevelDataChunk {
    const ID: u8 = super::id::LEVEL_DATA_CHUNK;
    const BODY_SIZE: usize = 2 + BLOB_LENGTH + 1;
}

impl ProtoEncode for LevelDataChunk {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.length);
        write_blob(buf, &self.data);
        buf.put_u8(self.percent);
    }
}

impl ProtoDecode for LevelDataChunk {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            length: buf.get_i16(),
            data: read_blob(buf)?,
            percent: buf.get_u8(),
        })
    }
}

/// Ends the level stream and tells the client the world dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFinalize {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Packet for LevelFinalize {
    const ID: u8 = super::id::LEVEL_FINALIZE;
    const BODY_SIZE: usize = 6;
}

impl ProtoEncode for LevelFinalize {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
    }
}

impl ProtoDecode for LevelFinalize {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::BODY_SIZE)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
        })
    }
}

/// Split a level snapshot into data chunk packets.
///
/// Chunk `i` (1-based) of `n` reports `round(100 * i / n)` percent, so the
/// last chunk always reports 100. An empty snapshot yields no chunks.
pub fn level_chunks(snapshot: &Bytes) -> Vec<LevelDataChunk> {
    let total = snapshot.len().div_ceil(BLOB_LENGTH);
    (0..total)
        .map(|i| {
            let start = i * BLOB_LENGTH;
            let end = (start + BLOB_LENGTH).min(snapshot.len());
            let percent = ((100 * (i + 1)) as f64 / total as f64).round() as u8;
            LevelDataChunk {
                length: (end - start) as i16,
                data: snapshot.slice(start..end),
                percent,
            }
        })
        .collect()
}
