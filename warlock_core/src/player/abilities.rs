//! PlayerAbilities - unlocked abilities, cooldowns and racial uses

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerAbilities {
    /// Class ability types this player may submit
    pub unlocked: Vec<String>,
    /// Rounds remaining per ability type
    #[serde(default)]
    cooldowns: BTreeMap<String, u32>,
    pub racial_ability: Option<String>,
    pub racial_uses: u32,
}

impl PlayerAbilities {
    pub fn new(unlocked: Vec<String>) -> Self {
        PlayerAbilities {
            unlocked,
            ..Default::default()
        }
    }

    pub fn with_racial(mut self, ability_type: impl Into<String>, uses: u32) -> Self {
        self.racial_ability = Some(ability_type.into());
        self.racial_uses = uses;
        self
    }

    pub fn has_ability(&self, ability_type: &str) -> bool {
        self.unlocked.iter().any(|a| a == ability_type)
    }

    pub fn cooldown_remaining(&self, ability_type: &str) -> u32 {
        self.cooldowns.get(ability_type).copied().unwrap_or(0)
    }

    pub fn is_ready(&self, ability_type: &str) -> bool {
        self.cooldown_remaining(ability_type) == 0
    }

    /// Start a cooldown of `rounds` full rounds. The round the ability was
    /// used in is ticked at its own end, so one extra round is stored.
    pub fn start_cooldown(&mut self, ability_type: &str, rounds: u32) {
        if rounds > 0 {
            self.cooldowns.insert(ability_type.to_string(), rounds + 1);
        }
    }

    /// End-of-round decrement; finished cooldowns are dropped
    pub fn tick_cooldowns(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }

    pub fn reset_cooldowns(&mut self) {
        self.cooldowns.clear();
    }

    pub fn can_use_racial(&self, ability_type: &str) -> bool {
        self.racial_ability.as_deref() == Some(ability_type) && self.racial_uses > 0
    }

    pub fn consume_racial_use(&mut self) {
        self.racial_uses = self.racial_uses.saturating_sub(1);
    }
}
