//! World loading and saving errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot too short: {0} bytes")]
    SnapshotTooShort(usize),

    #[error("snapshot holds {actual} blocks, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("invalid world dimensions {width}x{height}x{depth}")]
    InvalidDimensions { width: usize, height: usize, depth: usize },
}
