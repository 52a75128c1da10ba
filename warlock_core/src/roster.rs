//! PlayerRoster - player queries, targeting and grouping

use crate::player::Player;
use crate::types::{PlayerId, Side};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All players in a room, iterated in id order so resolution is deterministic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRoster {
    players: BTreeMap<PlayerId, Player>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_players(players: impl IntoIterator<Item = Player>) -> Self {
        let mut roster = PlayerRoster::new();
        for player in players {
            roster.insert(player);
        }
        roster
    }

    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    pub fn remove(&mut self, id: &str) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    /// Borrow two distinct players mutably at once
    pub fn pair_mut(&mut self, first: &str, second: &str) -> Option<(&mut Player, &mut Player)> {
        if first == second {
            return None;
        }
        let mut a = None;
        let mut b = None;
        for (id, player) in self.players.iter_mut() {
            if id == first {
                a = Some(player);
            } else if id == second {
                b = Some(player);
            }
        }
        a.zip(b)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().cloned().collect()
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_alive)
    }

    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.alive_players().map(|p| p.id.clone()).collect()
    }

    pub fn alive_count(&self) -> usize {
        self.alive_players().count()
    }

    /// Living warlocks, derived from player flags
    pub fn alive_warlock_count(&self) -> usize {
        self.alive_players().filter(|p| p.is_warlock).count()
    }

    /// (good, evil) living counts
    pub fn side_counts(&self) -> (usize, usize) {
        let evil = self.alive_warlock_count();
        (self.alive_count() - evil, evil)
    }

    /// Living player ids grouped by side
    pub fn group_by_side(&self) -> BTreeMap<Side, Vec<PlayerId>> {
        let mut groups: BTreeMap<Side, Vec<PlayerId>> = BTreeMap::new();
        for player in self.alive_players() {
            groups.entry(player.side()).or_default().push(player.id.clone());
        }
        groups
    }

    pub fn pending_death_ids(&self) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.pending_death)
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.players.values().find(|p| p.name == name)
    }

    /// Whether an id names a living player
    pub fn is_valid_target(&self, id: &str) -> bool {
        self.get(id).map(|p| p.is_targetable()).unwrap_or(false)
    }

    /// Random living player not in `exclude`
    pub fn random_alive_target(&self, exclude: &[&str], rng: &mut dyn RngCore) -> Option<PlayerId> {
        let candidates: Vec<&Player> = self
            .alive_players()
            .filter(|p| !exclude.contains(&p.id.as_str()))
            .collect();
        candidates.choose(rng).map(|p| p.id.clone())
    }

    /// Random living, visible player for the monster to hit
    pub fn random_monster_target(&self, rng: &mut dyn RngCore) -> Option<PlayerId> {
        let candidates: Vec<&Player> = self
            .alive_players()
            .filter(|p| !p.pending_death && !p.is_invisible())
            .collect();
        candidates.choose(rng).map(|p| p.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Race;
    use rand::rngs::mock::StepRng;

    fn roster() -> PlayerRoster {
        let mut dead = Player::new("c", "Cid", Race::Orc, "Warrior");
        dead.is_alive = false;
        PlayerRoster::from_players(vec![
            Player::new("a", "Ann", Race::Human, "Priest"),
            Player::new("b", "Bob", Race::Elf, "Assassin").warlock(),
            dead,
            Player::new("d", "Dee", Race::Dwarf, "Warrior"),
        ])
    }

    #[test]
    fn test_counts_and_groups() {
        let roster = roster();
        assert_eq!(roster.alive_count(), 3);
        assert_eq!(roster.alive_warlock_count(), 1);
        assert_eq!(roster.side_counts(), (2, 1));

        let groups = roster.group_by_side();
        assert_eq!(groups[&Side::Good], vec!["a".to_string(), "d".to_string()]);
        assert_eq!(groups[&Side::Evil], vec!["b".to_string()]);
    }

    #[test]
    fn test_pair_mut() {
        let mut roster = roster();
        let (a, d) = roster.pair_mut("a", "d").unwrap();
        a.stats.hp = 1;
        d.stats.hp = 2;
        assert_eq!(roster.get("a").unwrap().hp(), 1);
        assert!(roster.pair_mut("a", "a").is_none());
        assert!(roster.pair_mut("a", "zzz").is_none());
    }

    #[test]
    fn test_random_targets_skip_dead_and_excluded() {
        let roster = roster();
        let mut rng = StepRng::new(0, 0);
        // first candidate in id order after exclusions
        assert_eq!(roster.random_alive_target(&["a"], &mut rng), Some("b".to_string()));
        assert_eq!(roster.random_alive_target(&["a", "b", "d"], &mut rng), None);
        assert!(!roster.is_valid_target("c"));
        assert_eq!(roster.find_by_name("Dee").map(|p| p.id.as_str()), Some("d"));
    }
}
