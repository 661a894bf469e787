//! Player registry.
//!
//! Players are indexed by id and by peer address. Both indexes live in one
//! struct so they are always updated in the same critical section.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

use classic_world::flat_generator::surface_height;
use classic_world::Dimensions;
use thiserror::Error;

use crate::session::Session;

/// Lowest id handed to a player; 0 tags server messages.
pub const FIRST_PLAYER_ID: u8 = 1;

/// Highest id handed to a player; 255 reads as -1 ("self") in signed fields.
pub const MAX_PLAYER_ID: u8 = 254;

/// Where new players appear, in block coordinates: centred on the map,
/// a few blocks above the generated surface and never above the grid.
pub fn spawn_point(dimensions: Dimensions) -> [f32; 3] {
    let y = (surface_height(dimensions.height) + 3).min(dimensions.height - 1);
    [
        (dimensions.width / 2).saturating_sub(1) as f32,
        y as f32,
        (dimensions.depth / 2).saturating_sub(1) as f32,
    ]
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddPlayerError {
    #[error("Server full")]
    ServerFull,
    #[error("Name already in use")]
    DuplicateName,
}

/// An identified participant.
#[derive(Debug)]
pub struct Player {
    pub id: u8,
    pub name: String,
    pub session: Arc<Session>,
    pub position: [f32; 3],
    pub yaw: u8,
    pub pitch: u8,
    /// Set once the level stream and spawn packets are out; only spawned
    /// players receive broadcasts.
    pub spawned: bool,
}

impl Player {
    pub fn address(&self) -> SocketAddr {
        self.session.address()
    }
}

#[derive(Debug)]
pub struct PlayerRegistry {
    by_id: BTreeMap<u8, Player>,
    by_addr: HashMap<SocketAddr, u8>,
    /// Next never-used id. Wider than u8 so it can step past the last id.
    next_id: u16,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_addr: HashMap::new(),
            next_id: FIRST_PLAYER_ID as u16,
        }
    }

    /// Pick an id: the lowest free one below the counter, otherwise the
    /// counter itself. `None` when the id space is exhausted.
    fn allocate_id(&mut self) -> Option<u8> {
        let next = self.next_id.min(MAX_PLAYER_ID as u16 + 1) as u8;
        if let Some(id) = (FIRST_PLAYER_ID..next).find(|id| !self.by_id.contains_key(id)) {
            return Some(id);
        }
        if self.next_id > MAX_PLAYER_ID as u16 {
            return None;
        }
        let id = self.next_id as u8;
        self.next_id += 1;
        Some(id)
    }

    /// Register a new player. The capacity limit is waived for operators.
    pub fn insert(
        &mut self,
        session: Arc<Session>,
        name: &str,
        position: [f32; 3],
        is_op: bool,
        capacity: usize,
    ) -> Result<u8, AddPlayerError> {
        if self.find_by_name(name).is_some() {
            return Err(AddPlayerError::DuplicateName);
        }
        if !is_op && self.by_id.len() >= capacity {
            return Err(AddPlayerError::ServerFull);
        }
        let id = self.allocate_id().ok_or(AddPlayerError::ServerFull)?;
        self.by_addr.insert(session.address(), id);
        self.by_id.insert(
            id,
            Player {
                id,
                name: name.to_string(),
                session,
                position,
                yaw: 0,
                pitch: 0,
                spawned: false,
            },
        );
        Ok(id)
    }

    pub fn remove_by_addr(&mut self, addr: &SocketAddr) -> Option<Player> {
        let id = self.by_addr.remove(addr)?;
        self.by_id.remove(&id)
    }

    pub fn get(&self, id: u8) -> Option<&Player> {
        self.by_id.get(&id)
    }

    pub fn get_by_addr(&self, addr: &SocketAddr) -> Option<&Player> {
        self.by_addr.get(addr).and_then(|id| self.by_id.get(id))
    }

    pub fn get_by_addr_mut(&mut self, addr: &SocketAddr) -> Option<&mut Player> {
        let id = *self.by_addr.get(addr)?;
        self.by_id.get_mut(&id)
    }

    /// Names compare case-insensitively, as clients display them.
    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.by_id
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
