//! StatusEffectManager - timed effect lifecycle
//!
//! Each effect instance is either absent or active with `turns > 0`.
//! `apply_effect` creates or refreshes, `remove_effect` drops explicitly, and
//! `process_timed_effects` decrements once per round, removing anything that
//! hits zero in the same pass.

use crate::config::EffectDefaults;
use crate::events::{EventKind, GameEvent, RoundLog};
use crate::player::{EffectInstance, Player};
use crate::roster::PlayerRoster;
use crate::types::{DamageSource, StatusEffectKind};
use serde_json::json;
use tracing::debug;

/// Parameters supplied by an ability; missing values use configured defaults
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectParams {
    pub damage: Option<u32>,
    pub armor: Option<i32>,
    pub damage_increase: Option<f64>,
    pub turns: Option<u32>,
}

impl EffectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn damage(mut self, damage: u32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn armor(mut self, armor: i32) -> Self {
        self.armor = Some(armor);
        self
    }

    pub fn damage_increase(mut self, increase: f64) -> Self {
        self.damage_increase = Some(increase);
        self
    }

    pub fn turns(mut self, turns: u32) -> Self {
        self.turns = Some(turns);
        self
    }
}

/// Owns effect defaults and drives every timed effect transition
#[derive(Debug, Clone, Default)]
pub struct StatusEffectManager {
    defaults: EffectDefaults,
}

impl StatusEffectManager {
    pub fn new(defaults: EffectDefaults) -> Self {
        StatusEffectManager { defaults }
    }

    pub fn defaults(&self) -> &EffectDefaults {
        &self.defaults
    }

    /// Build a fresh instance from params + defaults (before the timing offset)
    fn build_instance(&self, kind: StatusEffectKind, params: EffectParams, source: Option<&str>) -> EffectInstance {
        let defaults = self.defaults.for_kind(kind);
        EffectInstance {
            kind,
            turns: params.turns.unwrap_or(defaults.turns),
            damage: params.damage.unwrap_or(defaults.damage),
            armor: params.armor.unwrap_or(defaults.armor),
            damage_increase: params.damage_increase.unwrap_or(defaults.damage_increase),
            stackable: defaults.stackable,
            source: source.map(str::to_string),
        }
    }

    /// Apply or refresh an effect. Returns false if the target is dead or
    /// the effect would last zero turns.
    pub fn apply_effect(
        &self,
        player: &mut Player,
        kind: StatusEffectKind,
        params: EffectParams,
        source: Option<&str>,
        log: &mut RoundLog,
    ) -> bool {
        if !player.is_alive {
            return false;
        }

        let mut instance = self.build_instance(kind, params, source);
        if instance.turns == 0 {
            debug!(effect = %kind, player = %player.id, "ignoring zero-turn effect");
            return false;
        }
        if kind.has_application_offset() {
            instance.turns += 1;
        }

        let refreshing = player.effects.has(kind);
        let (event_kind, message) = if refreshing {
            let existing = player
                .effects
                .status_effects
                .entry(kind)
                .or_insert_with(|| EffectInstance::new(kind, 0));
            if existing.stackable {
                existing.damage += instance.damage;
                existing.armor += instance.armor;
                existing.damage_increase += instance.damage_increase;
                existing.turns = existing.turns.max(instance.turns);
            } else {
                *existing = instance;
            }
            (EventKind::StatusRefreshed, refreshed_message(&player.name, existing))
        } else {
            let message = applied_message(&player.name, &instance);
            player.effects.status_effects.insert(kind, instance);
            (EventKind::StatusApplied, message)
        };

        let turns = player.effects.get(kind).map(|e| e.turns).unwrap_or(0);
        log.push(
            GameEvent::public(event_kind, message)
                .with_target(player.id.clone())
                .with_details(json!({ "effect": kind.key(), "turns": turns })),
        );
        true
    }

    /// Apply by config key. Unknown keys are a no-op.
    pub fn apply_effect_by_key(
        &self,
        player: &mut Player,
        key: &str,
        params: EffectParams,
        source: Option<&str>,
        log: &mut RoundLog,
    ) -> bool {
        match StatusEffectKind::from_key(key) {
            Some(kind) => self.apply_effect(player, kind, params, source, log),
            None => {
                debug!(effect = key, player = %player.id, "unknown effect key, skipping");
                false
            }
        }
    }

    /// Explicitly remove an effect. Returns whether one was present.
    pub fn remove_effect(&self, player: &mut Player, kind: StatusEffectKind, log: &mut RoundLog) -> bool {
        if player.effects.status_effects.remove(&kind).is_some() {
            log.push(
                GameEvent::public(
                    EventKind::StatusExpired,
                    format!("{} is no longer {}.", player.name, kind),
                )
                .with_target(player.id.clone()),
            );
            return true;
        }
        false
    }

    pub fn has_effect(&self, player: &Player, kind: StatusEffectKind) -> bool {
        player.effects.has(kind)
    }

    pub fn is_player_stunned(&self, player: &Player) -> bool {
        player.is_alive && player.is_stunned()
    }

    /// End-of-round pass over every living player
    pub fn process_timed_effects(&self, roster: &mut PlayerRoster, log: &mut RoundLog) {
        for player in roster.iter_mut().filter(|p| p.is_alive) {
            self.process_player_effects(player, log);
        }
    }

    /// Tick one player's effects in the fixed processing order
    pub fn process_player_effects(&self, player: &mut Player, log: &mut RoundLog) {
        for kind in StatusEffectKind::processing_order() {
            if !player.effects.status_effects.contains_key(kind) {
                continue;
            }

            if *kind == StatusEffectKind::Poison {
                self.tick_poison(player, log);
            }

            let expired = match player.effects.status_effects.get_mut(kind) {
                Some(effect) => {
                    effect.turns = effect.turns.saturating_sub(1);
                    effect.turns == 0
                }
                None => false,
            };

            if expired {
                player.effects.status_effects.remove(kind);
                log.push(
                    GameEvent::public(EventKind::StatusExpired, expired_message(&player.name, *kind))
                        .with_target(player.id.clone())
                        .with_details(json!({ "effect": kind.key() })),
                );
            }
        }
    }

    /// Poison damage bypasses armor. A lethal tick marks pending death.
    fn tick_poison(&self, player: &mut Player, log: &mut RoundLog) {
        if player.pending_death {
            return;
        }
        let damage = match player.effects.get(StatusEffectKind::Poison) {
            Some(effect) if effect.is_active() => effect.damage,
            _ => return,
        };
        if damage == 0 {
            return;
        }

        let dealt = player.take_damage(damage);
        log.push(
            GameEvent::public(
                EventKind::StatusTick,
                format!("{} takes {} poison damage.", player.name, dealt),
            )
            .with_target(player.id.clone())
            .with_details(json!({ "effect": "poison", "damage": dealt, "hp": player.hp() })),
        );

        if let Some(pool) = player.effects.racial_effects.degrade_stone_armor() {
            log.push(
                GameEvent::private(
                    EventKind::StatusTick,
                    format!("Your stone armor weakens to {}.", pool),
                )
                .with_target(player.id.clone()),
            );
        }

        if player.hp() == 0 {
            player.mark_pending_death(DamageSource::Poison.name());
        }
    }
}

fn applied_message(name: &str, effect: &EffectInstance) -> String {
    match effect.kind {
        StatusEffectKind::Poison => format!(
            "{} is poisoned ({} damage per turn).",
            name, effect.damage
        ),
        StatusEffectKind::Shielded => format!("{} is shielded (+{} armor).", name, effect.armor),
        StatusEffectKind::Vulnerable => format!(
            "{} is vulnerable (+{:.0}% damage taken).",
            name,
            effect.damage_increase * 100.0
        ),
        StatusEffectKind::Invisible => format!("{} fades from sight.", name),
        StatusEffectKind::Stunned => format!("{} is stunned.", name),
    }
}

fn refreshed_message(name: &str, effect: &EffectInstance) -> String {
    format!("{}'s {} effect is renewed ({} turns).", name, effect.kind, effect.turns)
}

fn expired_message(name: &str, kind: StatusEffectKind) -> String {
    match kind {
        StatusEffectKind::Poison => format!("The poison affecting {} has worn off.", name),
        StatusEffectKind::Shielded => format!("{}'s shield fades.", name),
        StatusEffectKind::Vulnerable => format!("{} is no longer vulnerable.", name),
        StatusEffectKind::Invisible => format!("{} becomes visible again.", name),
        StatusEffectKind::Stunned => format!("{} is no longer stunned.", name),
    }
}
