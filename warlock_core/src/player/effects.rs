//! PlayerEffects - timed status effects plus class/racial effect slots

use crate::types::{PlayerId, StatusEffectKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One active timed effect on a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectInstance {
    pub kind: StatusEffectKind,
    /// Rounds left; an instance never survives processing at 0
    pub turns: u32,
    /// Per-tick damage (poison)
    pub damage: u32,
    /// Armor granted (shielded)
    pub armor: i32,
    /// Incoming damage increase as a fraction (vulnerable)
    pub damage_increase: f64,
    /// Stackable instances add damage on reapplication instead of replacing it
    pub stackable: bool,
    pub source: Option<PlayerId>,
}

impl EffectInstance {
    pub fn new(kind: StatusEffectKind, turns: u32) -> Self {
        EffectInstance {
            kind,
            turns,
            damage: 0,
            armor: 0,
            damage_increase: 0.0,
            stackable: false,
            source: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.turns > 0
    }
}

/// A retaliation effect (Spirit Guard, Sanctuary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterAttack {
    /// Display name of the granting ability
    pub name: String,
    pub damage: u32,
    /// Warlock attackers get revealed when struck
    pub reveals_warlocks: bool,
    /// Only warlock attackers are struck
    pub warlock_only: bool,
    pub turns: u32,
}

/// Class-granted effects, keyed by purpose rather than by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassEffects {
    pub counter_attack: Option<CounterAttack>,
}

/// One-shot resurrection (Skeleton)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Undying {
    pub resurrected_hp: u32,
    pub active: bool,
}

/// Race-granted passives and temporary racial buffs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RacialEffects {
    /// Dwarf armor pool; degrades by one per damage instance and may go negative
    pub stone_armor: Option<i32>,
    /// Stone Resolve: the next damage instance is fully blocked
    pub immune_next_damage: bool,
    pub undying: Option<Undying>,
    /// Elf passive: attackers are revealed while badly wounded
    pub moonbeam: bool,
    /// Orc: next damaging ability is multiplied
    pub blood_rage: bool,
}

impl RacialEffects {
    pub fn stone_armor_value(&self) -> i32 {
        self.stone_armor.unwrap_or(0)
    }

    /// Degrade the stone armor pool after taking a hit. Returns the new value.
    pub fn degrade_stone_armor(&mut self) -> Option<i32> {
        if let Some(pool) = self.stone_armor.as_mut() {
            *pool -= 1;
            return Some(*pool);
        }
        None
    }

    pub fn has_active_undying(&self) -> bool {
        self.undying.map(|u| u.active).unwrap_or(false)
    }
}

/// All effects carried by a player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerEffects {
    pub status_effects: BTreeMap<StatusEffectKind, EffectInstance>,
    pub class_effects: ClassEffects,
    pub racial_effects: RacialEffects,
}

impl PlayerEffects {
    pub fn has(&self, kind: StatusEffectKind) -> bool {
        self.status_effects
            .get(&kind)
            .map(|e| e.is_active())
            .unwrap_or(false)
    }

    pub fn get(&self, kind: StatusEffectKind) -> Option<&EffectInstance> {
        self.status_effects.get(&kind)
    }

    /// Armor currently granted by a shield
    pub fn shield_armor(&self) -> i32 {
        self.get(StatusEffectKind::Shielded)
            .filter(|e| e.is_active())
            .map(|e| e.armor)
            .unwrap_or(0)
    }

    /// Incoming damage increase from vulnerability (0.0 when not vulnerable)
    pub fn vulnerability(&self) -> f64 {
        self.get(StatusEffectKind::Vulnerable)
            .filter(|e| e.is_active())
            .map(|e| e.damage_increase)
            .unwrap_or(0.0)
    }

    pub fn clear_status_effects(&mut self) {
        self.status_effects.clear();
    }
}
