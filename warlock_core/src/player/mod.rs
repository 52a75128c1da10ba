//! Player - aggregate of stats, abilities and effects
//!
//! Behaviour is split across three independently testable parts; `Player`
//! owns them and delegates.

mod abilities;
mod effects;
mod stats;

pub use abilities::PlayerAbilities;
pub use effects::{ClassEffects, CounterAttack, EffectInstance, PlayerEffects, RacialEffects, Undying};
pub use stats::PlayerStats;

use crate::config::{AbilityCatalog, GameConstants, RacialConstants};
use crate::types::{ActorRef, PlayerId, Race, Side, StatusEffectKind};
use serde::{Deserialize, Serialize};

/// A player in a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    // === Identity ===
    pub id: PlayerId,
    pub name: String,

    // === Parts ===
    pub stats: PlayerStats,
    pub abilities: PlayerAbilities,
    pub effects: PlayerEffects,

    // === Flags ===
    pub is_alive: bool,
    pub is_warlock: bool,
    /// Reduced to 0 hp this round; finalized (or saved) at end of round
    pub pending_death: bool,
    pub death_attacker: Option<String>,
    /// Rounds this player stays publicly revealed as a warlock
    pub recently_detected: u32,
}

impl Player {
    /// Create a bare player with 100 hp and no abilities
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, race: Race, class: impl Into<String>) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            stats: PlayerStats::new(100, class, race),
            abilities: PlayerAbilities::default(),
            effects: PlayerEffects::default(),
            is_alive: true,
            is_warlock: false,
            pending_death: false,
            death_attacker: None,
            recently_detected: 0,
        }
    }

    /// Create a player set up from game constants and the ability catalog
    pub fn from_config(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        race: Race,
        class: impl Into<String>,
        constants: &GameConstants,
        catalog: &AbilityCatalog,
    ) -> Self {
        let class = class.into();
        let mut player = Player::new(id, name, race, class.clone());

        player.stats = PlayerStats::new(constants.player.base_hp, class.clone(), race);
        player.stats.armor = constants.player.base_armor;
        player.stats.damage_modifier = constants.player.damage_modifier_for(&class);

        let unlocked = catalog
            .class_abilities_for(&class)
            .into_iter()
            .map(|def| def.id.clone())
            .collect();
        player.abilities = PlayerAbilities::new(unlocked);
        if let Some(racial) = catalog.racial_for(race) {
            player.abilities = player.abilities.with_racial(racial.id.clone(), racial.uses);
        }

        player.apply_racial_passives(&constants.racial);
        player
    }

    /// Install the passive effects granted by this player's race
    pub fn apply_racial_passives(&mut self, racial: &RacialConstants) {
        let effects = &mut self.effects.racial_effects;
        match self.stats.race {
            Race::Dwarf => effects.stone_armor = Some(racial.stone_armor_initial),
            Race::Elf => effects.moonbeam = true,
            Race::Skeleton => {
                effects.undying = Some(Undying {
                    resurrected_hp: racial.undying_hp,
                    active: true,
                })
            }
            Race::Human | Race::Orc => {}
        }
    }

    pub fn warlock(mut self) -> Self {
        self.is_warlock = true;
        self
    }

    pub fn hp(&self) -> u32 {
        self.stats.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.max_hp
    }

    pub fn side(&self) -> Side {
        if self.is_warlock {
            Side::Evil
        } else {
            Side::Good
        }
    }

    pub fn actor_ref(&self) -> ActorRef {
        ActorRef {
            id: self.id.clone(),
            name: self.name.clone(),
            is_warlock: self.is_warlock,
        }
    }

    /// Alive players (including those pending death) can be hit and healed
    pub fn is_targetable(&self) -> bool {
        self.is_alive
    }

    /// Base armor + shield + stone armor pool
    pub fn effective_armor(&self) -> i32 {
        self.stats.armor + self.effects.shield_armor() + self.effects.racial_effects.stone_armor_value()
    }

    pub fn is_stunned(&self) -> bool {
        self.effects.has(StatusEffectKind::Stunned)
    }

    pub fn is_invisible(&self) -> bool {
        self.effects.has(StatusEffectKind::Invisible)
    }

    /// Can submit an action this round
    pub fn can_act(&self) -> bool {
        self.is_alive && !self.is_stunned()
    }

    /// Flag the player as dying without touching `is_alive`
    pub fn mark_pending_death(&mut self, attacker: &str) {
        if !self.pending_death {
            self.pending_death = true;
            self.death_attacker = Some(attacker.to_string());
        }
    }

    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.stats.take_damage(amount)
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        self.stats.heal(amount)
    }
}
