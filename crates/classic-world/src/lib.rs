//! World management: the voxel grid, generation, snapshots, and storage.

pub mod error;
pub mod flat_generator;
pub mod serializer;
pub mod storage;
pub mod world;

pub use error::WorldError;
pub use world::{Dimensions, World};
