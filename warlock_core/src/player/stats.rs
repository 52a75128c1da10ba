//! PlayerStats - hit points, armor and the damage/healing budget

use crate::types::Race;
use serde::{Deserialize, Serialize};

/// Numeric state of a player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub hp: u32,
    pub max_hp: u32,
    /// Base armor; may be negative
    pub armor: i32,
    /// Outgoing damage multiplier from class/race
    pub damage_modifier: f64,
    pub class: String,
    pub race: Race,
}

impl PlayerStats {
    pub fn new(max_hp: u32, class: impl Into<String>, race: Race) -> Self {
        PlayerStats {
            hp: max_hp,
            max_hp,
            armor: 0,
            damage_modifier: 1.0,
            class: class.into(),
            race,
        }
    }

    /// Healing done by this player scales inversely with their damage:
    /// hard hitters heal less, support classes heal more.
    pub fn healing_modifier(&self) -> f64 {
        (2.0 - self.damage_modifier).clamp(0.5, 1.5)
    }

    /// Subtract hp, never below zero. Returns the hp actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Add hp, never above max. Returns the hp actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.missing_hp());
        self.hp += restored;
        restored
    }

    pub fn missing_hp(&self) -> u32 {
        self.max_hp.saturating_sub(self.hp)
    }

    /// Current hp as a fraction of max
    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64
    }

    /// Raise max hp and heal by the same amount (level up)
    pub fn grow_max_hp(&mut self, amount: u32) {
        self.max_hp = self.max_hp.saturating_add(amount);
        self.heal(amount);
    }
}
