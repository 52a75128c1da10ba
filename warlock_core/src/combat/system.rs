//! CombatSystem - the single surface ability handlers and the room use
//!
//! Owns every subsystem and runs damage through a fixed pipeline:
//! invisibility → immunity → armor → modifiers → racial resistance hook →
//! hp mutation → death marking → counter-attack → moonbeam → coordination →
//! conversion queue. Immunity short-circuits before any hp or coordination
//! change.

use super::result::{DamageOutcome, DamageResolution};
use crate::config::GameConstants;
use crate::damage::{apply_damage_modifier, reduce_by_armor};
use crate::effects::{EffectManager, HealSource, StatusEffectManager};
use crate::events::{EventKind, GameEvent, RoundLog};
use crate::monster::Monster;
use crate::roster::PlayerRoster;
use crate::turn::{CoordinationStats, TurnResolver};
use crate::types::{DamageSource, PlayerId, MONSTER_TARGET};
use crate::warlock::{ConversionAttempt, WarlockSystem};
use rand::RngCore;
use serde_json::json;
use tracing::debug;

#[derive(Debug)]
pub struct CombatSystem {
    constants: GameConstants,
    status_effects: StatusEffectManager,
    effects: EffectManager,
    warlocks: WarlockSystem,
    turns: TurnResolver,
    /// Conversions queued by warlock damage this round
    pending_conversions: Vec<ConversionAttempt>,
}

impl CombatSystem {
    pub fn new(constants: GameConstants) -> Self {
        CombatSystem {
            status_effects: StatusEffectManager::new(constants.effects.clone()),
            effects: EffectManager::new(constants.racial.clone(), constants.player.detection_turns),
            warlocks: WarlockSystem::new(&constants.warlock),
            turns: TurnResolver::new(constants.coordination.clone(), constants.comeback.clone()),
            pending_conversions: Vec::new(),
            constants,
        }
    }

    // === Accessors ===

    pub fn constants(&self) -> &GameConstants {
        &self.constants
    }

    pub fn status_effects(&self) -> &StatusEffectManager {
        &self.status_effects
    }

    pub fn effects(&self) -> &EffectManager {
        &self.effects
    }

    pub fn warlocks(&self) -> &WarlockSystem {
        &self.warlocks
    }

    pub fn warlocks_mut(&mut self) -> &mut WarlockSystem {
        &mut self.warlocks
    }

    pub fn turns(&self) -> &TurnResolver {
        &self.turns
    }

    pub fn turns_mut(&mut self) -> &mut TurnResolver {
        &mut self.turns
    }

    pub fn pending_conversions(&self) -> &[ConversionAttempt] {
        &self.pending_conversions
    }

    /// Start a round: reset coordination and drop stale conversion attempts
    pub fn begin_round(&mut self, log: &mut RoundLog) -> u32 {
        self.pending_conversions.clear();
        self.turns.reset_coordination_tracking(log)
    }

    // === Damage ===

    /// Push `raw_damage` from `source` into a player through the full pipeline
    pub fn apply_damage_to_player(
        &mut self,
        roster: &mut PlayerRoster,
        target_id: &str,
        raw_damage: u32,
        source: &DamageSource,
        is_aoe: bool,
        log: &mut RoundLog,
    ) -> DamageOutcome {
        let actor = source.actor().cloned();
        let mut outcome = DamageOutcome::new(raw_damage);

        let Some(target) = roster.get_mut(target_id) else {
            debug!(target = target_id, "damage aimed at unknown player");
            outcome.resolution = DamageResolution::Rejected;
            return outcome;
        };
        if !target.is_alive {
            debug!(target = target_id, "damage aimed at dead player");
            outcome.resolution = DamageResolution::Rejected;
            return outcome;
        }
        outcome.hp_before = target.hp();
        outcome.hp_after = target.hp();

        // Step 1: Invisible targets cannot be hit by others
        let self_inflicted = actor.as_ref().map(|a| a.id == target.id).unwrap_or(false);
        if target.is_invisible() && !self_inflicted {
            log.push(
                GameEvent::public(
                    EventKind::AttackMissed,
                    format!("{}'s attack finds nothing. {} is nowhere to be seen.", source.name(), target.name),
                )
                .with_target(target.id.clone()),
            );
            outcome.resolution = DamageResolution::Missed;
            return outcome;
        }

        // Step 2: One-shot immunity short-circuits everything below
        if self.effects.check_immunity_effects(target, source.name(), log) {
            outcome.resolution = DamageResolution::Blocked;
            return outcome;
        }

        // Step 3: Armor
        outcome.armor = target.effective_armor() + self.turns.comeback_armor_bonus(target.side());
        let reduced = reduce_by_armor(raw_damage, outcome.armor, &self.constants.armor);

        // Step 4: Modifiers
        outcome.vulnerability = target.effects.vulnerability();
        if let Some(actor) = &actor {
            outcome.coordination_bonus = self.turns.damage_bonus_for(&actor.id, target_id);
            outcome.comeback_bonus = self.turns.comeback_damage_bonus(actor.side());
        }
        outcome.final_damage = apply_damage_modifier(reduced, outcome.multiplier());
        if reduced > 0 {
            outcome.final_damage = outcome.final_damage.max(1);
        }

        // Step 5: Racial resistance hook
        if let Some(pool) = target.effects.racial_effects.degrade_stone_armor() {
            log.push(
                GameEvent::private(EventKind::StatusTick, format!("Your stone armor weakens to {}.", pool))
                    .with_target(target.id.clone()),
            );
        }

        // Step 6: Hp mutation
        outcome.damage_dealt = target.take_damage(outcome.final_damage);
        outcome.hp_after = target.hp();
        let mut event = GameEvent::public(
            EventKind::Damage,
            format!("{} deals {} damage to {}.", source.name(), outcome.damage_dealt, target.name),
        )
        .with_target(target.id.clone())
        .with_details(json!({
            "raw": raw_damage,
            "armor": outcome.armor,
            "final": outcome.final_damage,
            "coordination_bonus": outcome.coordination_bonus,
            "hp": outcome.hp_after,
        }));
        if let Some(actor) = &actor {
            event = event.with_source(actor.id.clone());
        }
        log.push(event);

        // Step 7: Death marking
        if target.hp() == 0 {
            target.mark_pending_death(source.name());
            outcome.is_killing_blow = true;
        }

        let Some(actor) = actor else {
            return outcome;
        };
        if actor.id == target_id {
            return outcome;
        }

        // Step 8: Counter-attacks
        if let Some((target, attacker)) = roster.pair_mut(target_id, &actor.id) {
            outcome.counter_damage = self.effects.handle_counter_attacks(target, attacker, log);
        }

        // Step 9: Passive detection
        if let Some(target) = roster.get(target_id) {
            outcome.moonbeam_triggered = self.effects.handle_moonbeam_detection(target, &actor, log);
        }

        // Step 10: Coordination
        self.turns.track_coordination(&actor.id, target_id);

        // Step 11: Conversion, evaluated at end of round
        let convertible = roster
            .get(target_id)
            .map(|t| t.is_alive && !t.pending_death && !t.is_warlock)
            .unwrap_or(false);
        if actor.is_warlock && convertible {
            self.pending_conversions.push(ConversionAttempt {
                actor,
                target_id: target_id.to_string(),
                is_aoe,
            });
            outcome.conversion_queued = true;
        }

        outcome
    }

    /// Damage the monster. Defeat is reported through `is_killing_blow`;
    /// the caller decides when to level up.
    pub fn apply_damage_to_monster(
        &mut self,
        monster: &mut Monster,
        raw_damage: u32,
        source: &DamageSource,
        log: &mut RoundLog,
    ) -> DamageOutcome {
        let mut outcome = DamageOutcome::new(raw_damage);
        if !monster.is_alive() {
            outcome.resolution = DamageResolution::Rejected;
            return outcome;
        }
        outcome.hp_before = monster.hp;

        if let Some(actor) = source.actor() {
            outcome.coordination_bonus = self.turns.damage_bonus_for(&actor.id, MONSTER_TARGET);
            outcome.comeback_bonus = self.turns.comeback_damage_bonus(actor.side());
        }
        outcome.final_damage = apply_damage_modifier(raw_damage, outcome.multiplier());
        outcome.damage_dealt = monster.take_damage(outcome.final_damage);
        outcome.hp_after = monster.hp;

        let mut event = GameEvent::public(
            EventKind::MonsterDamaged,
            format!("{} deals {} damage to the Monster.", source.name(), outcome.damage_dealt),
        )
        .with_target(MONSTER_TARGET)
        .with_details(json!({ "final": outcome.final_damage, "hp": monster.hp }));
        if let Some(actor) = source.actor() {
            event = event.with_source(actor.id.clone());
            self.turns.track_coordination(&actor.id, MONSTER_TARGET);
        }
        log.push(event);

        if !monster.is_alive() {
            outcome.is_killing_blow = true;
            log.push(GameEvent::public(
                EventKind::MonsterDefeated,
                format!("{} lands the killing blow on the Monster!", source.name()),
            ));
        }
        outcome
    }

    /// Damage every other living player, and the monster if given
    pub fn apply_area_damage(
        &mut self,
        roster: &mut PlayerRoster,
        monster: Option<&mut Monster>,
        raw_damage: u32,
        source: &DamageSource,
        log: &mut RoundLog,
    ) -> Vec<DamageOutcome> {
        let mut outcomes = Vec::new();
        if let Some(monster) = monster {
            outcomes.push(self.apply_damage_to_monster(monster, raw_damage, source, log));
        }
        let actor_id = source.actor_id().map(str::to_string);
        for id in roster.alive_ids() {
            if actor_id.as_deref() == Some(id.as_str()) {
                continue;
            }
            outcomes.push(self.apply_damage_to_player(roster, &id, raw_damage, source, true, log));
        }
        outcomes
    }

    /// The monster hits one random visible player, then ages
    pub fn monster_attack(
        &mut self,
        monster: &mut Monster,
        roster: &mut PlayerRoster,
        rng: &mut dyn RngCore,
        log: &mut RoundLog,
    ) -> Option<DamageOutcome> {
        if !monster.is_alive() {
            return None;
        }
        let damage = monster.next_attack_damage(&self.constants.monster);
        let target = if damage > 0 {
            roster.random_monster_target(rng)
        } else {
            None
        };
        let mut outcome = None;
        if let Some(target_id) = target {
            let name = roster.get(&target_id).map(|p| p.name.clone()).unwrap_or_default();
            log.push(
                GameEvent::public(EventKind::MonsterAttack, format!("The Monster lashes out at {}!", name))
                    .with_target(target_id.clone())
                    .with_details(json!({ "damage": damage, "age": monster.age })),
            );
            outcome = Some(self.apply_damage_to_player(
                roster,
                &target_id,
                damage,
                &DamageSource::Monster,
                false,
                log,
            ));
        }
        monster.age_one_round();
        outcome
    }

    /// Respawn a defeated monster one level higher and reward the survivors
    pub fn level_up(&self, monster: &mut Monster, roster: &mut PlayerRoster, log: &mut RoundLog) {
        monster.respawn(&self.constants.monster);
        let gain = self.constants.player.level_up_hp;
        for player in roster.iter_mut().filter(|p| p.is_alive) {
            player.stats.grow_max_hp(gain);
        }
        log.push(
            GameEvent::public(
                EventKind::LevelUp,
                format!(
                    "Level {}! Everyone gains {} max hp. A stronger Monster rises ({} hp).",
                    monster.level, gain, monster.max_hp
                ),
            )
            .with_details(json!({ "level": monster.level, "monster_hp": monster.max_hp })),
        );
    }

    // === Healing ===

    /// Heal one player. Returns the hp actually restored.
    pub fn apply_healing(
        &mut self,
        roster: &mut PlayerRoster,
        healer_id: &str,
        target_id: &str,
        amount: u32,
        log: &mut RoundLog,
    ) -> u32 {
        let Some(healer) = roster.get(healer_id) else {
            return 0;
        };
        let source = HealSource::from_player(healer);
        let bonus = self.turns.healing_bonus_for(healer_id, target_id)
            + self.turns.comeback_healing_bonus(healer.side());

        let Some(target) = roster.get_mut(target_id) else {
            return 0;
        };
        if !target.is_alive {
            return 0;
        }
        let rejected = target.is_warlock && healer_id != target_id;
        let healed = self.effects.apply_healing(&source, target, amount, bonus, log);
        if !rejected {
            self.turns.track_healing_coordination(healer_id, target_id);
        }
        healed
    }

    /// Heal every living player. Returns the total restored.
    pub fn apply_area_healing(
        &mut self,
        roster: &mut PlayerRoster,
        healer_id: &str,
        amount: u32,
        log: &mut RoundLog,
    ) -> u32 {
        roster
            .alive_ids()
            .iter()
            .map(|id| self.apply_healing(roster, healer_id, id, amount, log))
            .sum()
    }

    // === End of round ===

    /// Timed effects, detection decay and class effect expiry
    pub fn process_end_of_round_effects(&self, roster: &mut PlayerRoster, log: &mut RoundLog) {
        self.status_effects.process_timed_effects(roster, log);
        self.effects.process_detection_penalties(roster, log);
        self.effects.expire_class_effects(roster, log);
    }

    pub fn process_pending_deaths(&mut self, roster: &mut PlayerRoster, log: &mut RoundLog) -> Vec<PlayerId> {
        self.turns.process_pending_deaths(roster, &mut self.warlocks, log)
    }

    /// Roll every queued conversion. Returns converted player ids.
    pub fn resolve_conversions(
        &mut self,
        roster: &mut PlayerRoster,
        rng: &mut dyn RngCore,
        log: &mut RoundLog,
    ) -> Vec<PlayerId> {
        let attempts = std::mem::take(&mut self.pending_conversions);
        self.warlocks.resolve_conversions(attempts, roster, rng, log)
    }

    // === Coordination getters ===

    pub fn get_coordination_count(&self, target_id: &str) -> usize {
        self.turns.get_coordination_count(target_id)
    }

    pub fn get_coordination_stats(&self) -> CoordinationStats {
        self.turns.get_coordination_stats()
    }
}
