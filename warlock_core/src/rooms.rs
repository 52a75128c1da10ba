//! RoomRegistry - rooms keyed by room code
//!
//! Only insert/remove touch the shared map. Each room sits behind its own
//! `Mutex`, so whoever holds it is the single worker resolving that room;
//! different rooms resolve in parallel.

use crate::room::GameRoom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Room '{0}' already exists")]
    DuplicateRoom(String),
    #[error("Room registry lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// A room shared between the registry and whoever is resolving it
pub type SharedRoom = Arc<Mutex<GameRoom>>;

/// Explicit room registry. Create one at startup and pass it by reference.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, SharedRoom>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room under its own code
    pub fn insert(&self, room: GameRoom) -> Result<SharedRoom> {
        let code = room.code().to_string();
        let mut rooms = self.rooms.write().map_err(|_| RegistryError::LockPoisoned)?;
        if rooms.contains_key(&code) {
            return Err(RegistryError::DuplicateRoom(code));
        }
        let shared = Arc::new(Mutex::new(room));
        rooms.insert(code.clone(), Arc::clone(&shared));
        info!(room = %code, "room registered");
        Ok(shared)
    }

    /// Tear a room down. Callers must not do this mid-resolution; holders
    /// of the returned handle keep the room alive until they drop it.
    pub fn remove(&self, code: &str) -> Result<Option<SharedRoom>> {
        let mut rooms = self.rooms.write().map_err(|_| RegistryError::LockPoisoned)?;
        let removed = rooms.remove(code);
        if removed.is_some() {
            info!(room = code, "room removed");
        }
        Ok(removed)
    }

    pub fn get(&self, code: &str) -> Option<SharedRoom> {
        self.rooms
            .read()
            .ok()
            .and_then(|rooms| rooms.get(code).cloned())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms
            .read()
            .map(|rooms| rooms.contains_key(code))
            .unwrap_or(false)
    }

    /// Room codes, sorted
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .rooms
            .read()
            .map(|rooms| rooms.keys().cloned().collect())
            .unwrap_or_default();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.rooms.read().map(|rooms| rooms.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::PlayerAction;
    use crate::config::{default_abilities, GameConstants};
    use crate::types::Race;
    use rand::rngs::mock::StepRng;

    fn room(code: &str) -> GameRoom {
        let mut constants = GameConstants::default();
        constants.crit.chance = 0.0;
        constants.ultra_fail.chance = 0.0;
        constants.monster.base_damage = 0;
        let mut room = GameRoom::new(code, constants, default_abilities());
        room.join("a", "Ann", Race::Human, "Warrior").unwrap();
        room.join("b", "Bob", Race::Elf, "Warrior").unwrap();
        room.assign_warlock("b").unwrap();
        room
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = RoomRegistry::new();
        registry.insert(room("AAAA")).unwrap();
        registry.insert(room("BBBB")).unwrap();

        assert_eq!(
            registry.insert(room("AAAA")).unwrap_err(),
            RegistryError::DuplicateRoom("AAAA".to_string())
        );
        assert_eq!(registry.codes(), vec!["AAAA".to_string(), "BBBB".to_string()]);
        assert!(registry.get("AAAA").is_some());

        assert!(registry.remove("AAAA").unwrap().is_some());
        assert!(!registry.contains("AAAA"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rooms_resolve_in_parallel() {
        let registry = RoomRegistry::new();
        for code in ["R1", "R2", "R3"] {
            registry.insert(room(code)).unwrap();
        }

        std::thread::scope(|scope| {
            for code in registry.codes() {
                let shared = registry.get(&code).unwrap();
                scope.spawn(move || {
                    let mut room = shared.lock().unwrap();
                    room.submit_action(PlayerAction::new("a", "slash").at_monster()).unwrap();
                    room.process_round(&mut StepRng::new(u64::MAX, 0)).unwrap();
                });
            }
        });

        for code in registry.codes() {
            let shared = registry.get(&code).unwrap();
            let room = shared.lock().unwrap();
            assert_eq!(room.round(), 1);
            assert_eq!(room.monster().hp, 67);
        }
    }
}
