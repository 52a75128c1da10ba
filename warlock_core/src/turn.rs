//! TurnResolver - per-round coordination bookkeeping, pending deaths and
//! comeback balancing
//!
//! Coordination is tracked as `target -> {actors}` so a repeat hit from the
//! same actor never inflates the count. Damage and healing are tracked
//! separately: three players healing an ally does not boost the next attack
//! on that ally.

use crate::config::{ComebackConstants, CoordinationConstants};
use crate::events::{EventKind, GameEvent, RoundLog};
use crate::roster::PlayerRoster;
use crate::types::{PlayerId, Side};
use crate::warlock::WarlockSystem;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Distinct actors per target for one round
#[derive(Debug, Clone, Default)]
pub struct CoordinationTracker {
    targets: BTreeMap<String, BTreeSet<PlayerId>>,
}

impl CoordinationTracker {
    pub fn reset(&mut self) {
        self.targets.clear();
    }

    /// Record `actor -> target`, returning the target's actor count
    pub fn track(&mut self, actor: &str, target: &str) -> usize {
        let actors = self.targets.entry(target.to_string()).or_default();
        actors.insert(actor.to_string());
        actors.len()
    }

    pub fn count(&self, target: &str) -> usize {
        self.targets.get(target).map(BTreeSet::len).unwrap_or(0)
    }

    /// Count the target would have if `actor` were recorded now
    pub fn peek(&self, actor: &str, target: &str) -> usize {
        match self.targets.get(target) {
            Some(actors) if actors.contains(actor) => actors.len(),
            Some(actors) => actors.len() + 1,
            None => 1,
        }
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.targets
            .iter()
            .map(|(target, actors)| (target.clone(), actors.len()))
            .collect()
    }
}

/// Snapshot of this round's damage coordination for UI/analytics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationStats {
    /// Distinct attackers per target
    pub targets: BTreeMap<String, usize>,
    pub max_coordination: usize,
    /// Targets hit by more than one attacker
    pub coordinated_targets: usize,
}

#[derive(Debug, Clone)]
pub struct TurnResolver {
    coordination: CoordinationConstants,
    comeback: ComebackConstants,
    damage_tracker: CoordinationTracker,
    healing_tracker: CoordinationTracker,
    /// Side currently receiving comeback bonuses
    comeback_side: Option<Side>,
    round: u32,
}

impl TurnResolver {
    pub fn new(coordination: CoordinationConstants, comeback: ComebackConstants) -> Self {
        TurnResolver {
            coordination,
            comeback,
            damage_tracker: CoordinationTracker::default(),
            healing_tracker: CoordinationTracker::default(),
            comeback_side: None,
            round: 0,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Start a new round: clear trackers and log the turn start.
    /// Returns the new round number.
    pub fn reset_coordination_tracking(&mut self, log: &mut RoundLog) -> u32 {
        self.damage_tracker.reset();
        self.healing_tracker.reset();
        self.round += 1;
        info!(round = self.round, "round started");
        log.push(
            GameEvent::public(EventKind::TurnStarted, format!("Round {} begins.", self.round))
                .with_details(json!({ "round": self.round })),
        );
        self.round
    }

    // === Coordination ===

    pub fn track_coordination(&mut self, actor_id: &str, target_id: &str) -> usize {
        self.damage_tracker.track(actor_id, target_id)
    }

    pub fn track_healing_coordination(&mut self, healer_id: &str, target_id: &str) -> usize {
        self.healing_tracker.track(healer_id, target_id)
    }

    pub fn get_coordination_count(&self, target_id: &str) -> usize {
        self.damage_tracker.count(target_id)
    }

    pub fn get_healing_coordination_count(&self, target_id: &str) -> usize {
        self.healing_tracker.count(target_id)
    }

    /// `min((count - 1) * bonus_per_extra_actor, max_bonus)`; a lone actor gets 0
    pub fn coordination_bonus(&self, count: usize) -> f64 {
        let extra = count.saturating_sub(1) as f64;
        (extra * self.coordination.bonus_per_extra_actor).min(self.coordination.max_bonus)
    }

    /// Bonus `actor` would earn hitting `target` now, without recording it
    pub fn damage_bonus_for(&self, actor_id: &str, target_id: &str) -> f64 {
        self.coordination_bonus(self.damage_tracker.peek(actor_id, target_id))
    }

    pub fn healing_bonus_for(&self, healer_id: &str, target_id: &str) -> f64 {
        self.coordination_bonus(self.healing_tracker.peek(healer_id, target_id))
    }

    pub fn get_coordination_stats(&self) -> CoordinationStats {
        let targets = self.damage_tracker.counts();
        let max_coordination = targets.values().copied().max().unwrap_or(0);
        let coordinated_targets = targets.values().filter(|&&count| count > 1).count();
        CoordinationStats {
            targets,
            max_coordination,
            coordinated_targets,
        }
    }

    // === Pending deaths ===

    /// Resolve every pending death. A player healed back above 0 hp since the
    /// fatal blow survives; Undying saves the player once; anyone else dies
    /// for good. Returns the ids that died this pass.
    pub fn process_pending_deaths(
        &self,
        roster: &mut PlayerRoster,
        warlocks: &mut WarlockSystem,
        log: &mut RoundLog,
    ) -> Vec<PlayerId> {
        let mut deaths = Vec::new();

        for id in roster.pending_death_ids() {
            let Some(player) = roster.get_mut(&id) else {
                continue;
            };
            player.pending_death = false;
            if !player.is_alive {
                continue;
            }
            if player.hp() > 0 {
                debug!(player = %player.id, hp = player.hp(), "pending death cleared by healing");
                player.death_attacker = None;
                continue;
            }
            let attacker = player
                .death_attacker
                .clone()
                .unwrap_or_else(|| "unknown causes".to_string());

            let saved = match player.effects.racial_effects.undying.as_mut() {
                Some(undying) if undying.active => {
                    undying.active = false;
                    Some(undying.resurrected_hp)
                }
                _ => None,
            };

            if let Some(resurrected_hp) = saved {
                player.stats.hp = resurrected_hp.clamp(1, player.stats.max_hp.max(1));
                player.is_alive = true;
                player.death_attacker = None;
                info!(player = %player.id, hp = player.stats.hp, "player resurrected");
                log.push(
                    GameEvent::public(
                        EventKind::Resurrected,
                        format!(
                            "{} was struck down by {} but refuses to die! (Undying)",
                            player.name, attacker
                        ),
                    )
                    .with_target(player.id.clone())
                    .with_details(json!({ "hp": player.stats.hp })),
                );
                continue;
            }

            player.stats.hp = 0;
            player.is_alive = false;
            player.effects.clear_status_effects();
            player.effects.class_effects.counter_attack = None;
            if player.is_warlock {
                warlocks.decrement_warlock_count();
            }
            info!(player = %player.id, killer = %attacker, "player died");
            log.push(
                GameEvent::public(
                    EventKind::Death,
                    format!("{} has been slain by {}.", player.name, attacker),
                )
                .with_target(player.id.clone())
                .with_details(json!({ "attacker": attacker })),
            );
            deaths.push(id);
        }

        deaths
    }

    // === Comeback ===

    /// Re-evaluate which side (if any) gets comeback bonuses. The losing side
    /// is boosted while it holds at most `ratio_threshold` of the living
    /// players and at least `min_alive` players remain.
    pub fn update_comeback_status(&mut self, roster: &PlayerRoster, log: &mut RoundLog) -> Option<Side> {
        let (good, evil) = roster.side_counts();
        let alive = good + evil;

        let next = if alive < self.comeback.min_alive || good == 0 || evil == 0 {
            None
        } else {
            let (losing, smaller) = if good < evil {
                (Side::Good, good)
            } else {
                (Side::Evil, evil)
            };
            let ratio = smaller as f64 / alive as f64;
            (ratio <= self.comeback.ratio_threshold).then_some(losing)
        };

        if next != self.comeback_side {
            info!(from = ?self.comeback_side, to = ?next, "comeback status changed");
            let message = if next.is_some() {
                "The outnumbered grow desperate. Comeback bonuses are active."
            } else {
                "The balance settles. Comeback bonuses have ended."
            };
            log.push(
                GameEvent::public(EventKind::ComebackChanged, message)
                    .with_details(json!({ "active": next.is_some() })),
            );
            self.comeback_side = next;
        }
        self.comeback_side
    }

    pub fn get_comeback_status(&self) -> Option<Side> {
        self.comeback_side
    }

    fn is_boosted(&self, side: Side) -> bool {
        self.comeback_side == Some(side)
    }

    pub fn comeback_damage_bonus(&self, side: Side) -> f64 {
        if self.is_boosted(side) {
            self.comeback.damage_bonus
        } else {
            0.0
        }
    }

    pub fn comeback_healing_bonus(&self, side: Side) -> f64 {
        if self.is_boosted(side) {
            self.comeback.healing_bonus
        } else {
            0.0
        }
    }

    pub fn comeback_armor_bonus(&self, side: Side) -> i32 {
        if self.is_boosted(side) {
            self.comeback.armor_bonus
        } else {
            0
        }
    }
}

impl Default for TurnResolver {
    fn default() -> Self {
        TurnResolver::new(CoordinationConstants::default(), ComebackConstants::default())
    }
}
