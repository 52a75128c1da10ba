//! WarlockSystem - corruption spread and win conditions

use crate::config::WarlockConstants;
use crate::events::{EventKind, GameEvent, RoundLog};
use crate::player::Player;
use crate::roster::PlayerRoster;
use crate::types::{ActorRef, PlayerId, Side};
use rand::{Rng, RngCore};
use serde_json::json;
use std::fmt;
use tracing::info;

/// Per-attempt conversion chance as a function of the current game state.
///
/// Implementations must be non-decreasing in `warlock_count`: more warlocks
/// never make corruption harder to spread.
pub trait ConversionFormula: fmt::Debug + Send + Sync {
    fn chance(&self, base_chance: f64, warlock_count: usize, alive_count: usize) -> f64;
}

/// `base + per_warlock_bonus * (warlocks - 1)`, capped
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledConversion {
    pub per_warlock_bonus: f64,
    pub max_chance: f64,
}

impl ConversionFormula for ScaledConversion {
    fn chance(&self, base_chance: f64, warlock_count: usize, _alive_count: usize) -> f64 {
        let extra = warlock_count.saturating_sub(1) as f64;
        (base_chance + self.per_warlock_bonus * extra).clamp(0.0, self.max_chance)
    }
}

/// A conversion queued while actions resolve, evaluated at end of round
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionAttempt {
    pub actor: ActorRef,
    pub target_id: PlayerId,
    pub is_aoe: bool,
}

/// Pure win check: Good wins when no warlocks remain, Evil when every
/// living player is a warlock. `None` means the game goes on.
///
/// The warlock count must never exceed the living players; debug builds
/// panic on that drift, release builds still call it for Evil.
pub fn check_win_conditions(warlock_count: usize, alive_count: usize) -> Option<Side> {
    debug_assert!(
        warlock_count <= alive_count,
        "warlock count {} exceeds living players {}",
        warlock_count,
        alive_count
    );
    if alive_count == 0 {
        return None;
    }
    if warlock_count == 0 {
        return Some(Side::Good);
    }
    if warlock_count >= alive_count {
        return Some(Side::Evil);
    }
    None
}

#[derive(Debug)]
pub struct WarlockSystem {
    /// Living warlocks
    count: usize,
    base_chance: f64,
    aoe_dampening: f64,
    formula: Box<dyn ConversionFormula>,
}

impl WarlockSystem {
    pub fn new(constants: &WarlockConstants) -> Self {
        WarlockSystem {
            count: 0,
            base_chance: constants.base_conversion_chance,
            aoe_dampening: constants.aoe_dampening,
            formula: Box::new(ScaledConversion {
                per_warlock_bonus: constants.per_warlock_bonus,
                max_chance: constants.max_conversion_chance,
            }),
        }
    }

    /// Swap in a different chance formula
    pub fn with_formula(mut self, formula: impl ConversionFormula + 'static) -> Self {
        self.formula = Box::new(formula);
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Re-derive the count from player flags
    pub fn sync_with(&mut self, roster: &PlayerRoster) {
        self.count = roster.alive_warlock_count();
    }

    pub fn increment_warlock_count(&mut self) {
        self.count += 1;
    }

    /// Called when a warlock dies or is cured
    pub fn decrement_warlock_count(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    /// Chance for one attempt right now
    pub fn conversion_chance(&self, is_aoe: bool, alive_count: usize) -> f64 {
        let chance = self.formula.chance(self.base_chance, self.count, alive_count);
        if is_aoe {
            chance * self.aoe_dampening
        } else {
            chance
        }
    }

    /// Roll a conversion of `target` by `actor`. Returns true on success.
    pub fn attempt_conversion(
        &mut self,
        actor: &ActorRef,
        target: &mut Player,
        is_aoe: bool,
        alive_count: usize,
        rng: &mut dyn RngCore,
        log: &mut RoundLog,
    ) -> bool {
        if !actor.is_warlock
            || actor.id == target.id
            || !target.is_alive
            || target.pending_death
            || target.is_warlock
        {
            return false;
        }

        let chance = self.conversion_chance(is_aoe, alive_count);
        if rng.gen::<f64>() >= chance {
            return false;
        }

        target.is_warlock = true;
        self.increment_warlock_count();
        info!(actor = %actor.id, target = %target.id, warlocks = self.count, "player converted");
        log.push(
            GameEvent::private(
                EventKind::Conversion,
                format!("{} has corrupted you. You are now a Warlock.", actor.name),
            )
            .with_source(actor.id.clone())
            .with_target(target.id.clone())
            .with_details(json!({ "chance": chance, "aoe": is_aoe })),
        );
        true
    }

    /// Evaluate queued attempts against the end-of-round roster. Attempts
    /// from actors who died or are no longer warlocks are dropped.
    pub fn resolve_conversions(
        &mut self,
        attempts: Vec<ConversionAttempt>,
        roster: &mut PlayerRoster,
        rng: &mut dyn RngCore,
        log: &mut RoundLog,
    ) -> Vec<PlayerId> {
        let mut converted = Vec::new();
        for attempt in attempts {
            let actor = match roster.get(&attempt.actor.id) {
                Some(actor) if actor.is_alive && actor.is_warlock => actor.actor_ref(),
                _ => continue,
            };
            let alive_count = roster.alive_count();
            let Some(target) = roster.get_mut(&attempt.target_id) else {
                continue;
            };
            if self.attempt_conversion(&actor, target, attempt.is_aoe, alive_count, rng, log) {
                converted.push(attempt.target_id);
            }
        }
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Race;
    use rand::rngs::mock::StepRng;

    fn always() -> StepRng {
        StepRng::new(0, 0)
    }

    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_win_conditions() {
        assert_eq!(check_win_conditions(0, 3), Some(Side::Good));
        assert_eq!(check_win_conditions(2, 2), Some(Side::Evil));
        assert_eq!(check_win_conditions(1, 3), None);
        assert_eq!(check_win_conditions(0, 0), None);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds living players")]
    fn test_win_check_catches_count_drift() {
        check_win_conditions(3, 2);
    }

    #[test]
    fn test_chance_grows_with_warlocks() {
        let mut system = WarlockSystem::new(&WarlockConstants::default());
        system.count = 1;
        let one = system.conversion_chance(false, 6);
        system.count = 3;
        let three = system.conversion_chance(false, 6);
        system.count = 50;
        let many = system.conversion_chance(false, 60);

        assert!((one - 0.2).abs() < 1e-9);
        assert!(three > one);
        assert!((many - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_aoe_is_dampened() {
        let mut system = WarlockSystem::new(&WarlockConstants::default());
        system.count = 1;
        let single = system.conversion_chance(false, 4);
        let area = system.conversion_chance(true, 4);
        assert!((area - single * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_successful_conversion() {
        let mut system = WarlockSystem::new(&WarlockConstants::default());
        system.count = 1;
        let actor = Player::new("w", "Wex", Race::Orc, "Warrior").warlock().actor_ref();
        let mut target = Player::new("t", "Tam", Race::Human, "Priest");
        let mut log = RoundLog::new();

        assert!(system.attempt_conversion(&actor, &mut target, false, 4, &mut always(), &mut log));
        assert!(target.is_warlock);
        assert_eq!(system.count(), 2);
        assert!(log.public_events().next().is_none());
        assert_eq!(log.private_events_for("t").count(), 1);
    }

    #[test]
    fn test_failed_roll_and_invalid_targets() {
        let mut system = WarlockSystem::new(&WarlockConstants::default());
        system.count = 1;
        let actor = Player::new("w", "Wex", Race::Orc, "Warrior").warlock().actor_ref();
        let mut log = RoundLog::new();

        let mut target = Player::new("t", "Tam", Race::Human, "Priest");
        assert!(!system.attempt_conversion(&actor, &mut target, false, 4, &mut never(), &mut log));

        let mut dying = Player::new("d", "Dru", Race::Human, "Priest");
        dying.pending_death = true;
        assert!(!system.attempt_conversion(&actor, &mut dying, false, 4, &mut always(), &mut log));

        let good_actor = Player::new("g", "Gil", Race::Human, "Warrior").actor_ref();
        assert!(!system.attempt_conversion(&good_actor, &mut target, false, 4, &mut always(), &mut log));

        assert_eq!(system.count(), 1);
        assert!(log.is_empty());
    }

    #[derive(Debug)]
    struct Certain;

    impl ConversionFormula for Certain {
        fn chance(&self, _base: f64, _warlocks: usize, _alive: usize) -> f64 {
            1.0
        }
    }

    #[test]
    fn test_pluggable_formula() {
        let system = WarlockSystem::new(&WarlockConstants::default()).with_formula(Certain);
        assert!((system.conversion_chance(false, 5) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_skips_dead_actor() {
        let mut system = WarlockSystem::new(&WarlockConstants::default());
        let mut dead = Player::new("w", "Wex", Race::Orc, "Warrior").warlock();
        dead.is_alive = false;
        let actor = dead.actor_ref();
        let mut roster = PlayerRoster::from_players(vec![
            dead,
            Player::new("t", "Tam", Race::Human, "Priest"),
            Player::new("v", "Vi", Race::Elf, "Oracle").warlock(),
        ]);
        system.sync_with(&roster);
        let mut log = RoundLog::new();

        let attempts = vec![ConversionAttempt {
            actor,
            target_id: "t".to_string(),
            is_aoe: false,
        }];
        let converted = system.resolve_conversions(attempts, &mut roster, &mut always(), &mut log);

        assert!(converted.is_empty());
        assert_eq!(system.count(), 1);
    }

    #[test]
    fn test_decrement_never_underflows() {
        let mut system = WarlockSystem::new(&WarlockConstants::default());
        system.decrement_warlock_count();
        assert_eq!(system.count(), 0);
    }
}
