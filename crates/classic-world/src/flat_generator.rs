//! Flat world generator.
//!
//! Generates the default Classic flat world, with the ground surface at
//! half the world height:
//! - below the surface: dirt
//! - surface layer: grass
//! - above: air

use tracing::info;

use crate::world::World;

pub const AIR: u8 = 0;
pub const GRASS: u8 = 2;
pub const DIRT: u8 = 3;

/// Y coordinate of the grass layer for a world of the given height.
pub fn surface_height(height: usize) -> usize {
    height / 2
}

/// Fill `world` with flat terrain. Deterministic for given dimensions.
pub fn generate_flat(world: &mut World) {
    let dims = world.dimensions();
    let surface = surface_height(dims.height);
    info!(
        "Generating flat world {}x{}x{}",
        dims.width, dims.height, dims.depth
    );

    for y in 0..dims.height {
        let block = match y.cmp(&surface) {
            std::cmp::Ordering::Less => DIRT,
            std::cmp::Ordering::Equal => GRASS,
            std::cmp::Ordering::Greater => AIR,
        };
        if block == AIR {
            continue;
        }
        for z in 0..dims.depth {
            for x in 0..dims.width {
                world.set_block(x, y, z, block);
            }
        }
    }
}
