//! Protocol-level errors.

use thiserror::Error;

use crate::codec::Direction;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("unknown {direction} packet id: 0x{id:02X}")]
    UnknownPacketId { id: u8, direction: Direction },

    #[error("unexpected packet id: expected 0x{expected:02X}, got 0x{got:02X}")]
    UnexpectedPacketId { expected: u8, got: u8 },
}

impl ProtoError {
    /// Whether more bytes could turn this failure into a successful decode.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::BufferTooShort { .. })
    }
}
