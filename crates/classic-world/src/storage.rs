//! Save file handling.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::WorldError;
use crate::world::{Dimensions, World};

/// Load the world from `path`, generating a new one when the file is
/// missing or unreadable.
pub fn load_or_generate(path: &Path, dimensions: Dimensions) -> World {
    match load(path, dimensions) {
        Ok(world) => {
            info!("Loaded world from {}", path.display());
            world
        }
        Err(WorldError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Save file {} not found, creating a new world", path.display());
            World::generate(dimensions)
        }
        Err(e) => {
            warn!("Failed to load {}: {e}, creating a new world", path.display());
            World::generate(dimensions)
        }
    }
}

/// Read and decode a saved world.
pub fn load(path: &Path, dimensions: Dimensions) -> Result<World, WorldError> {
    let data = std::fs::read(path)?;
    World::decode(dimensions, &data)
}

/// Write an already-encoded snapshot to `path`.
///
/// The data goes to a sibling temporary file first and is renamed into
/// place, so a crash mid-write never truncates the previous save.
pub fn save_snapshot(path: &Path, snapshot: &[u8]) -> Result<(), WorldError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    std::fs::write(&tmp, snapshot)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Encode and write `world` to `path`.
pub fn save(path: &Path, world: &World) -> Result<(), WorldError> {
    save_snapshot(path, &world.encode()?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
