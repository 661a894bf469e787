//! World snapshot codec.
//!
//! A snapshot is a gzip stream of a 4-byte big-endian block count followed
//! by the raw grid. This is also the payload of the level data stream sent
//! to joining clients.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::WorldError;
use crate::world::{Dimensions, World};

impl World {
    /// Serialize the world into a compressed snapshot.
    pub fn encode(&self) -> Result<Vec<u8>, WorldError> {
        let blocks = self.blocks();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&(blocks.len() as u32).to_be_bytes())?;
        encoder.write_all(blocks)?;
        Ok(encoder.finish()?)
    }

    /// Rebuild a world of the given dimensions from a snapshot.
    ///
    /// The length prefix is skipped; the remaining byte count must match
    /// the dimensions.
    pub fn decode(dimensions: Dimensions, data: &[u8]) -> Result<Self, WorldError> {
        let mut raw = Vec::with_capacity(dimensions.volume() + 4);
        GzDecoder::new(data).read_to_end(&mut raw)?;
        if raw.len() < 4 {
            return Err(WorldError::SnapshotTooShort(raw.len()));
        }
        let blocks = raw.split_off(4);
        World::from_blocks(dimensions, blocks)
    }
}
