//! DamageOutcome - what happened to one damage instance

use serde::{Deserialize, Serialize};

/// How a damage instance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageResolution {
    /// Damage reached hp
    #[default]
    Hit,
    /// Target was invisible
    Missed,
    /// Consumed a one-shot immunity
    Blocked,
    /// Target was missing or already dead; nothing happened
    Rejected,
}

/// Result of pushing damage through the combat pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DamageOutcome {
    pub resolution: DamageResolution,

    // === Damage Breakdown ===
    /// Damage before armor
    pub raw_damage: u32,
    /// Armor the hit was reduced by (comeback armor included)
    pub armor: i32,
    /// Damage after armor and modifiers
    pub final_damage: u32,
    /// Hp actually lost (final damage clamped to remaining hp)
    pub damage_dealt: u32,

    // === Modifiers ===
    pub vulnerability: f64,
    pub coordination_bonus: f64,
    pub comeback_bonus: f64,

    // === State Changes ===
    pub hp_before: u32,
    pub hp_after: u32,

    // === Side Effects ===
    /// Damage reflected back at the attacker by a counter-attack
    pub counter_damage: u32,
    pub moonbeam_triggered: bool,
    pub conversion_queued: bool,

    // === Flags ===
    pub is_killing_blow: bool,
}

impl DamageOutcome {
    pub fn new(raw_damage: u32) -> Self {
        DamageOutcome {
            raw_damage,
            ..Default::default()
        }
    }

    pub fn with_resolution(raw_damage: u32, resolution: DamageResolution) -> Self {
        DamageOutcome {
            resolution,
            ..DamageOutcome::new(raw_damage)
        }
    }

    /// Whether damage reached hp
    pub fn landed(&self) -> bool {
        self.resolution == DamageResolution::Hit
    }

    /// Total multiplier applied after armor
    pub fn multiplier(&self) -> f64 {
        1.0 + self.vulnerability + self.coordination_bonus + self.comeback_bonus
    }

    pub fn hp_change(&self) -> i64 {
        self.hp_after as i64 - self.hp_before as i64
    }

    pub fn summary(&self) -> String {
        match self.resolution {
            DamageResolution::Missed => return "Missed".to_string(),
            DamageResolution::Blocked => return "Blocked".to_string(),
            DamageResolution::Rejected => return "No target".to_string(),
            DamageResolution::Hit => {}
        }

        let mut parts = vec![format!("{} damage taken", self.damage_dealt)];
        if self.raw_damage > self.final_damage {
            parts.push(format!("{} reduced by armor", self.raw_damage - self.final_damage));
        }
        if self.coordination_bonus > 0.0 {
            parts.push(format!("+{:.0}% coordination", self.coordination_bonus * 100.0));
        }
        if self.counter_damage > 0 {
            parts.push(format!("{} countered", self.counter_damage));
        }
        if self.is_killing_blow {
            parts.push("FATAL".to_string());
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_summary() {
        let mut outcome = DamageOutcome::new(50);
        outcome.final_damage = 25;
        outcome.damage_dealt = 25;
        outcome.hp_before = 100;
        outcome.hp_after = 75;

        assert!(outcome.landed());
        assert_eq!(outcome.hp_change(), -25);
        assert_eq!(outcome.summary(), "25 damage taken, 25 reduced by armor");
    }

    #[test]
    fn test_non_hits() {
        let missed = DamageOutcome::with_resolution(10, DamageResolution::Missed);
        assert!(!missed.landed());
        assert_eq!(missed.summary(), "Missed");
        assert!((missed.multiplier() - 1.0).abs() < f64::EPSILON);
    }
}
