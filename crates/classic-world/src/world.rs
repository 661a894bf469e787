//! Dense voxel grid.
//!
//! Blocks are stored in one flat byte array, Y-major then Z then X, which is
//! the order clients expect in the level stream. For the usual square
//! footprint this is `x + depth * (z + width * y)`. The store does no bounds
//! checking of its own beyond what slice indexing enforces; callers validate
//! coordinates with [`World::in_bounds`] first.

use crate::error::WorldError;
use crate::flat_generator;

/// Largest extent along any axis; coordinates travel as signed shorts.
pub const MAX_EXTENT: usize = i16::MAX as usize;

/// World size in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Dimensions {
    pub const DEFAULT: Self = Self {
        width: 256,
        height: 64,
        depth: 256,
    };

    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self, WorldError> {
        let valid = [width, height, depth]
            .iter()
            .all(|&d| (1..=MAX_EXTENT).contains(&d))
            && width
                .checked_mul(height)
                .and_then(|v| v.checked_mul(depth))
                .is_some_and(|v| v <= u32::MAX as usize);
        if !valid {
            return Err(WorldError::InvalidDimensions {
                width,
                height,
                depth,
            });
        }
        Ok(Self {
            width,
            height,
            depth,
        })
    }

    /// Number of blocks in the grid.
    pub fn volume(&self) -> usize {
        self.width * self.height * self.depth
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The shared block grid.
#[derive(Clone, PartialEq, Eq)]
pub struct World {
    dimensions: Dimensions,
    blocks: Vec<u8>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("dimensions", &self.dimensions)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

impl World {
    /// Wrap an existing block array. Fails if its length does not match.
    pub fn from_blocks(dimensions: Dimensions, blocks: Vec<u8>) -> Result<Self, WorldError> {
        if blocks.len() != dimensions.volume() {
            return Err(WorldError::SizeMismatch {
                expected: dimensions.volume(),
                actual: blocks.len(),
            });
        }
        Ok(Self { dimensions, blocks })
    }

    /// An all-air world.
    pub fn empty(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            blocks: vec![0; dimensions.volume()],
        }
    }

    /// A freshly generated flat world.
    pub fn generate(dimensions: Dimensions) -> Self {
        let mut world = Self::empty(dimensions);
        flat_generator::generate_flat(&mut world);
        world
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    /// Whether a signed coordinate triple lies inside the grid.
    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        let d = self.dimensions;
        (0..d.width as i32).contains(&x)
            && (0..d.height as i32).contains(&y)
            && (0..d.depth as i32).contains(&z)
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dimensions.width * (z + self.dimensions.depth * y)
    }

    /// Block at an in-range position.
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> u8 {
        self.blocks[self.index(x, y, z)]
    }

    /// Overwrite the block at an in-range position.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: u8) {
        let index = self.index(x, y, z);
        self.blocks[index] = block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dimensions {
        Dimensions::new(8, 4, 8).unwrap()
    }

    fn oblong() -> Dimensions {
        Dimensions::new(5, 3, 7).unwrap()
    }

    #[test]
    fn set_then_get() {
        let mut world = World::empty(small());
        world.set_block(3, 2, 5, 7);
        assert_eq!(world.get_block(3, 2, 5), 7);
    }

    #[test]
    fn set_touches_only_one_block() {
        let dims = small();
        let mut world = World::empty(dims);
        world.set_block(1, 1, 1, 9);
        let changed = world.blocks().iter().filter(|&&b| b != 0).count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn addressing_is_a_bijection() {
        let dims = oblong();
        let mut world = World::empty(dims);
        let mut value = 0u8;
        for y in 0..dims.height {
            for z in 0..dims.depth {
                for x in 0..dims.width {
                    world.set_block(x, y, z, value);
                    value = value.wrapping_add(1);
                }
            }
        }
        let mut value = 0u8;
        for y in 0..dims.height {
            for z in 0..dims.depth {
                for x in 0..dims.width {
                    assert_eq!(world.get_block(x, y, z), value);
                    value = value.wrapping_add(1);
                }
            }
        }
    }

    #[test]
    fn index_layout() {
        let world = World::empty(Dimensions::DEFAULT);
        assert_eq!(world.index(0, 0, 0), 0);
        assert_eq!(world.index(1, 0, 0), 1);
        assert_eq!(world.index(0, 0, 1), 256);
        assert_eq!(world.index(0, 1, 0), 256 * 256);
    }

    #[test]
    fn bounds() {
        let world = World::empty(small());
        assert!(world.in_bounds(0, 0, 0));
        assert!(world.in_bounds(7, 3, 7));
        assert!(!world.in_bounds(8, 0, 0));
        assert!(!world.in_bounds(0, 4, 0));
        assert!(!world.in_bounds(0, 0, -1));
        assert!(!world.in_bounds(9999, 0, 0));
    }

    #[test]
    fn invalid_dimensions() {
        assert!(Dimensions::new(0, 64, 256).is_err());
        assert!(Dimensions::new(40000, 64, 256).is_err());
        assert_eq!(Dimensions::new(256, 64, 256).unwrap(), Dimensions::DEFAULT);
    }

    #[test]
    fn from_blocks_checks_length() {
        assert!(World::from_blocks(small(), vec![0; 10]).is_err());
        assert!(World::from_blocks(small(), vec![0; 256]).is_ok());
    }
}
