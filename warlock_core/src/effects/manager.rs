//! EffectManager - immunities, counter-attacks, detection and healing
//!
//! None of these return errors. A missing effect is simply "nothing happens",
//! so one malformed ability cannot abort a round.

use crate::config::RacialConstants;
use crate::damage::apply_damage_modifier;
use crate::events::{EventKind, GameEvent, RoundLog};
use crate::player::Player;
use crate::roster::PlayerRoster;
use crate::types::{ActorRef, PlayerId};
use serde_json::json;
use tracing::debug;

/// The healer side of a heal
#[derive(Debug, Clone, PartialEq)]
pub struct HealSource {
    pub id: PlayerId,
    pub name: String,
    pub healing_modifier: f64,
}

impl HealSource {
    pub fn from_player(player: &Player) -> Self {
        HealSource {
            id: player.id.clone(),
            name: player.name.clone(),
            healing_modifier: player.stats.healing_modifier(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EffectManager {
    racial: RacialConstants,
    detection_turns: u32,
}

impl EffectManager {
    pub fn new(racial: RacialConstants, detection_turns: u32) -> Self {
        EffectManager {
            racial,
            detection_turns,
        }
    }

    /// Consume a one-shot immunity. Returns true if the hit is fully blocked.
    pub fn check_immunity_effects(&self, target: &mut Player, attacker_name: &str, log: &mut RoundLog) -> bool {
        if !target.effects.racial_effects.immune_next_damage {
            return false;
        }
        target.effects.racial_effects.immune_next_damage = false;
        log.push(
            GameEvent::public(
                EventKind::DamageBlocked,
                format!("{}'s Stone Resolve absorbs the attack from {}.", target.name, attacker_name),
            )
            .with_target(target.id.clone()),
        );
        true
    }

    /// Strike back at an attacker if the target holds a counter-attack.
    /// Returns the damage dealt to the attacker.
    pub fn handle_counter_attacks(&self, target: &Player, attacker: &mut Player, log: &mut RoundLog) -> u32 {
        let counter = match &target.effects.class_effects.counter_attack {
            Some(counter) if counter.turns > 0 => counter,
            _ => return 0,
        };
        if !attacker.is_alive || (counter.warlock_only && !attacker.is_warlock) {
            return 0;
        }

        let dealt = attacker.take_damage(counter.damage);
        log.push(
            GameEvent::public(
                EventKind::CounterAttack,
                format!(
                    "{}'s {} strikes back at {} for {} damage.",
                    target.name, counter.name, attacker.name, dealt
                ),
            )
            .with_source(target.id.clone())
            .with_target(attacker.id.clone())
            .with_details(json!({ "damage": dealt })),
        );

        if attacker.hp() == 0 {
            attacker.mark_pending_death(&target.name);
        }

        if counter.reveals_warlocks && attacker.is_warlock {
            // +1 so the reveal outlasts this round's decrement
            attacker.recently_detected = self.detection_turns + 1;
            log.push(
                GameEvent::public(
                    EventKind::WarlockDetected,
                    format!("{}'s {} reveals {} as a Warlock!", target.name, counter.name, attacker.name),
                )
                .with_source(target.id.clone())
                .with_target(attacker.id.clone()),
            );
        }

        dealt
    }

    /// Elf passive: when badly wounded, learn whether the attacker is a
    /// warlock. Private to the elf; no hp change. Returns whether it fired.
    pub fn handle_moonbeam_detection(&self, target: &Player, attacker: &ActorRef, log: &mut RoundLog) -> bool {
        let racial = &target.effects.racial_effects;
        if !racial.moonbeam || !target.is_alive || target.id == attacker.id {
            return false;
        }
        if target.stats.hp_fraction() > self.racial.moonbeam_threshold {
            return false;
        }

        let verdict = if attacker.is_warlock { "IS" } else { "is NOT" };
        log.push(
            GameEvent::private(
                EventKind::WarlockDetected,
                format!("Moonbeam reveals that {} {} a Warlock.", attacker.name, verdict),
            )
            .with_target(target.id.clone())
            .with_details(json!({ "attacker": attacker.id, "is_warlock": attacker.is_warlock })),
        );
        true
    }

    /// Heal a target, returning the hp actually restored.
    ///
    /// Warlocks reject healing from others (self-healing still works). The
    /// healer's modifier and any coordination bonus scale the amount before
    /// it is clamped to the target's missing hp.
    pub fn apply_healing(
        &self,
        healer: &HealSource,
        target: &mut Player,
        amount: u32,
        bonus: f64,
        log: &mut RoundLog,
    ) -> u32 {
        if !target.is_alive || amount == 0 {
            return 0;
        }

        if target.is_warlock && healer.id != target.id {
            // tell only the warlock; the healer must not learn anything
            log.push(
                GameEvent::private(
                    EventKind::HealBlocked,
                    format!("Your corruption rejects {}'s healing.", healer.name),
                )
                .with_target(target.id.clone()),
            );
            return 0;
        }

        let modified = apply_damage_modifier(amount, healer.healing_modifier * (1.0 + bonus));
        let healed = target.heal(modified);

        let message = if healer.id == target.id {
            format!("{} heals themself for {} hp.", healer.name, healed)
        } else {
            format!("{} heals {} for {} hp.", healer.name, target.name, healed)
        };
        log.push(
            GameEvent::public(EventKind::Heal, message)
                .with_source(healer.id.clone())
                .with_target(target.id.clone())
                .with_details(json!({ "amount": amount, "healed": healed, "bonus": bonus })),
        );
        healed
    }

    /// End-of-round decay of detection reveals
    pub fn process_detection_penalties(&self, roster: &mut PlayerRoster, log: &mut RoundLog) {
        for player in roster.iter_mut().filter(|p| p.recently_detected > 0) {
            player.recently_detected -= 1;
            if player.recently_detected == 0 && player.is_alive {
                log.push(
                    GameEvent::public(
                        EventKind::StatusExpired,
                        format!("{} is no longer marked as detected.", player.name),
                    )
                    .with_target(player.id.clone()),
                );
            }
        }
    }

    /// End-of-round decay of class effects (counter-attacks)
    pub fn expire_class_effects(&self, roster: &mut PlayerRoster, log: &mut RoundLog) {
        for player in roster.iter_mut() {
            let expired = match player.effects.class_effects.counter_attack.as_mut() {
                Some(counter) => {
                    counter.turns = counter.turns.saturating_sub(1);
                    counter.turns == 0
                }
                None => continue,
            };
            if expired {
                if let Some(counter) = player.effects.class_effects.counter_attack.take() {
                    debug!(player = %player.id, effect = %counter.name, "class effect expired");
                    if player.is_alive {
                        log.push(
                            GameEvent::public(
                                EventKind::StatusExpired,
                                format!("{}'s {} fades.", player.name, counter.name),
                            )
                            .with_target(player.id.clone()),
                        );
                    }
                }
            }
        }
    }
}
