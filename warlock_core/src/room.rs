//! GameRoom - one room's live state and the per-round pipeline
//!
//! Actions arrive one at a time through `submit_action`; `process_round`
//! then resolves the whole round in a single synchronous pass:
//!
//! 1. reset coordination, log turn start
//! 2. racial → defense → special → heal → attack, ties by player id
//! 3. monster attacks (or levels up if it was defeated)
//! 4. timed effects, detection decay, class effect expiry
//! 5. pending deaths (Undying saves)
//! 6. queued conversions
//! 7. cooldown tick, win check, comeback update

use crate::abilities::{AbilityContext, AbilityRegistry, PlayerAction};
use crate::combat::CombatSystem;
use crate::config::{AbilityCatalog, AbilityCategory, GameConstants};
use crate::events::{EventKind, GameEvent, RoundLog};
use crate::monster::Monster;
use crate::player::Player;
use crate::roster::PlayerRoster;
use crate::turn::CoordinationStats;
use crate::types::{PlayerId, Race, Side};
use crate::warlock::check_win_conditions;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

/// Why a submission (or a round) was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoomError {
    #[error("Player '{0}' is not in this room")]
    UnknownPlayer(PlayerId),
    #[error("Player '{0}' already joined")]
    DuplicatePlayer(PlayerId),
    #[error("Player '{0}' is dead")]
    PlayerDead(PlayerId),
    #[error("Player '{0}' is stunned")]
    PlayerStunned(PlayerId),
    #[error("Player '{0}' already submitted an action this round")]
    AlreadySubmitted(PlayerId),
    #[error("Unknown ability '{0}'")]
    UnknownAbility(String),
    #[error("Ability '{0}' is not available to this player")]
    AbilityNotAvailable(String),
    #[error("Ability '{ability}' is on cooldown for {remaining} more round(s)")]
    OnCooldown { ability: String, remaining: u32 },
    #[error("The game is over")]
    GameOver,
}

/// Everything a caller needs to broadcast after a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub log: RoundLog,
    pub deaths: Vec<PlayerId>,
    pub conversions: Vec<PlayerId>,
    pub winner: Option<Side>,
}

#[derive(Debug)]
pub struct GameRoom {
    code: String,
    roster: PlayerRoster,
    monster: Monster,
    combat: CombatSystem,
    registry: AbilityRegistry,
    pending_actions: BTreeMap<PlayerId, PlayerAction>,
    pending_racial: BTreeMap<PlayerId, PlayerAction>,
    winner: Option<Side>,
}

impl GameRoom {
    /// Create a room with the built-in ability handlers
    pub fn new(code: impl Into<String>, constants: GameConstants, catalog: AbilityCatalog) -> Self {
        let registry = AbilityRegistry::with_default_handlers(catalog, &constants);
        GameRoom::with_registry(code, constants, registry)
    }

    /// Create a room with a caller-supplied registry
    pub fn with_registry(code: impl Into<String>, constants: GameConstants, registry: AbilityRegistry) -> Self {
        GameRoom {
            code: code.into(),
            roster: PlayerRoster::new(),
            monster: Monster::new(&constants.monster),
            combat: CombatSystem::new(constants),
            registry,
            pending_actions: BTreeMap::new(),
            pending_racial: BTreeMap::new(),
            winner: None,
        }
    }

    // === Accessors ===

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.roster.get(id)
    }

    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    pub fn round(&self) -> u32 {
        self.combat.turns().round()
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn warlock_count(&self) -> usize {
        self.combat.warlocks().count()
    }

    // === Players ===

    /// Create a player from config and seat them
    pub fn join(
        &mut self,
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        race: Race,
        class: impl Into<String>,
    ) -> Result<(), RoomError> {
        let player = Player::from_config(
            id,
            name,
            race,
            class,
            self.combat.constants(),
            self.registry.catalog(),
        );
        self.add_player(player)
    }

    /// Seat an already-built player
    pub fn add_player(&mut self, player: Player) -> Result<(), RoomError> {
        if self.roster.contains(&player.id) {
            return Err(RoomError::DuplicatePlayer(player.id));
        }
        self.roster.insert(player);
        self.combat.warlocks_mut().sync_with(&self.roster);
        Ok(())
    }

    /// Secretly make a player a warlock (game setup)
    pub fn assign_warlock(&mut self, id: &str) -> Result<(), RoomError> {
        let player = self
            .roster
            .get_mut(id)
            .ok_or_else(|| RoomError::UnknownPlayer(id.to_string()))?;
        player.is_warlock = true;
        self.combat.warlocks_mut().sync_with(&self.roster);
        Ok(())
    }

    /// Drop a disconnected player between rounds. Win conditions are
    /// re-checked; an already decided game stays decided.
    pub fn remove_player(&mut self, id: &str) -> Option<Side> {
        if let Some(player) = self.roster.remove(id) {
            if player.is_alive && player.is_warlock {
                self.combat.warlocks_mut().decrement_warlock_count();
            }
            info!(room = %self.code, player = id, "player removed");
        }
        self.pending_actions.remove(id);
        self.pending_racial.remove(id);

        if self.winner.is_none() {
            self.winner = check_win_conditions(self.combat.warlocks().count(), self.roster.alive_count());
        }
        self.winner
    }

    pub fn is_player_stunned(&self, id: &str) -> bool {
        self.roster
            .get(id)
            .map(|p| self.combat.status_effects().is_player_stunned(p))
            .unwrap_or(false)
    }

    /// Coordination of the most recently resolved round
    pub fn get_coordination_stats(&self) -> CoordinationStats {
        self.combat.get_coordination_stats()
    }

    // === Submission ===

    /// Queue a class action for the next round
    pub fn submit_action(&mut self, action: PlayerAction) -> Result<(), RoomError> {
        let player = self.eligible_actor(&action.actor_id)?;
        if self.pending_actions.contains_key(&action.actor_id) {
            return Err(RoomError::AlreadySubmitted(action.actor_id));
        }
        let def = self
            .registry
            .definition(&action.ability_type)
            .ok_or_else(|| RoomError::UnknownAbility(action.ability_type.clone()))?;
        if def.is_racial() || !player.abilities.has_ability(&def.id) {
            return Err(RoomError::AbilityNotAvailable(def.id.clone()));
        }
        let remaining = player.abilities.cooldown_remaining(&def.id);
        if remaining > 0 {
            return Err(RoomError::OnCooldown {
                ability: def.id.clone(),
                remaining,
            });
        }

        self.pending_actions.insert(action.actor_id.clone(), action);
        Ok(())
    }

    /// Queue a racial action. Independent of the class action slot.
    pub fn submit_racial_action(&mut self, action: PlayerAction) -> Result<(), RoomError> {
        let player = self.eligible_actor(&action.actor_id)?;
        if self.pending_racial.contains_key(&action.actor_id) {
            return Err(RoomError::AlreadySubmitted(action.actor_id));
        }
        if self.registry.definition(&action.ability_type).is_none() {
            return Err(RoomError::UnknownAbility(action.ability_type));
        }
        if !player.abilities.can_use_racial(&action.ability_type) {
            return Err(RoomError::AbilityNotAvailable(action.ability_type));
        }

        self.pending_racial.insert(action.actor_id.clone(), action);
        Ok(())
    }

    fn eligible_actor(&self, id: &str) -> Result<&Player, RoomError> {
        if self.winner.is_some() {
            return Err(RoomError::GameOver);
        }
        let player = self
            .roster
            .get(id)
            .ok_or_else(|| RoomError::UnknownPlayer(id.to_string()))?;
        if !player.is_alive {
            return Err(RoomError::PlayerDead(id.to_string()));
        }
        if player.is_stunned() {
            return Err(RoomError::PlayerStunned(id.to_string()));
        }
        Ok(player)
    }

    /// Living, unstunned players who still owe a class action
    pub fn waiting_on(&self) -> Vec<PlayerId> {
        self.roster
            .alive_players()
            .filter(|p| !p.is_stunned() && !self.pending_actions.contains_key(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn ready_to_resolve(&self) -> bool {
        self.winner.is_none() && self.waiting_on().is_empty()
    }

    // === Resolution ===

    /// Resolve every queued action and the end-of-round pipeline
    pub fn process_round(&mut self, rng: &mut dyn RngCore) -> Result<RoundOutcome, RoomError> {
        if self.winner.is_some() {
            return Err(RoomError::GameOver);
        }
        let mut log = RoundLog::new();
        let round = self.combat.begin_round(&mut log);

        for (is_racial, action) in self.ordered_actions() {
            self.execute_action(&action, is_racial, rng, &mut log);
        }

        if self.monster.is_alive() {
            self.combat
                .monster_attack(&mut self.monster, &mut self.roster, rng, &mut log);
        } else {
            self.combat.level_up(&mut self.monster, &mut self.roster, &mut log);
        }

        self.combat.process_end_of_round_effects(&mut self.roster, &mut log);
        let deaths = self.combat.process_pending_deaths(&mut self.roster, &mut log);
        let conversions = self.combat.resolve_conversions(&mut self.roster, rng, &mut log);

        for player in self.roster.iter_mut().filter(|p| p.is_alive) {
            player.abilities.tick_cooldowns();
        }

        self.winner = check_win_conditions(self.combat.warlocks().count(), self.roster.alive_count());
        if let Some(winner) = self.winner {
            info!(room = %self.code, round, %winner, "game over");
            log.push(
                GameEvent::public(EventKind::GameOver, format!("Game over. {} wins!", winner))
                    .with_details(json!({ "winner": winner })),
            );
        } else {
            self.combat.turns_mut().update_comeback_status(&self.roster, &mut log);
        }

        info!(room = %self.code, round, deaths = deaths.len(), events = log.len(), "round resolved");
        Ok(RoundOutcome {
            round,
            log,
            deaths,
            conversions,
            winner: self.winner,
        })
    }

    /// Drain queued actions in resolution order
    fn ordered_actions(&mut self) -> Vec<(bool, PlayerAction)> {
        let racial = std::mem::take(&mut self.pending_racial)
            .into_values()
            .map(|action| (true, action));
        let class = std::mem::take(&mut self.pending_actions)
            .into_values()
            .map(|action| (false, action));

        let mut actions: Vec<(bool, PlayerAction)> = racial.chain(class).collect();
        actions.sort_by_key(|(is_racial, action)| {
            let category = if *is_racial {
                AbilityCategory::Racial
            } else {
                self.registry
                    .definition(&action.ability_type)
                    .map(|def| def.category)
                    .unwrap_or(AbilityCategory::Attack)
            };
            (category.resolution_priority(), action.actor_id.clone())
        });
        actions
    }

    fn execute_action(&mut self, action: &PlayerAction, is_racial: bool, rng: &mut dyn RngCore, log: &mut RoundLog) {
        let mut ctx = AbilityContext {
            roster: &mut self.roster,
            monster: &mut self.monster,
            combat: &mut self.combat,
            log: &mut *log,
            rng: &mut *rng,
            multiplier: 1.0,
        };
        let result = if is_racial {
            self.registry.execute_racial_ability(&mut ctx, action)
        } else {
            self.registry.execute_class_ability(&mut ctx, action)
        };

        match result {
            Ok(()) if !is_racial => {
                let cooldown = self
                    .registry
                    .definition(&action.ability_type)
                    .map(|def| def.cooldown)
                    .unwrap_or(0);
                if let Some(player) = self.roster.get_mut(&action.actor_id) {
                    player.abilities.start_cooldown(&action.ability_type, cooldown);
                }
            }
            Ok(()) => {}
            Err(err) => {
                warn!(room = %self.code, actor = %action.actor_id, ability = %action.ability_type, error = %err, "action failed");
                log.push(
                    GameEvent::private(
                        EventKind::ActionFailed,
                        format!("Your {} failed: {}", action.ability_type, err),
                    )
                    .with_source(action.actor_id.clone()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_abilities;
    use rand::rngs::mock::StepRng;

    fn quiet_constants() -> GameConstants {
        let mut constants = GameConstants::default();
        constants.crit.chance = 0.0;
        constants.ultra_fail.chance = 0.0;
        constants.monster.base_damage = 0;
        constants
    }

    fn room() -> GameRoom {
        let mut room = GameRoom::new("ABCD", quiet_constants(), default_abilities());
        room.join("a", "Ann", Race::Human, "Warrior").unwrap();
        room.join("b", "Bob", Race::Dwarf, "Priest").unwrap();
        room.join("c", "Cid", Race::Elf, "Pyromancer").unwrap();
        room.assign_warlock("c").unwrap();
        room
    }

    #[test]
    fn test_submission_validation() {
        let mut room = room();

        assert_eq!(
            room.submit_action(PlayerAction::new("zed", "slash")),
            Err(RoomError::UnknownPlayer("zed".to_string()))
        );
        assert_eq!(
            room.submit_action(PlayerAction::new("a", "fireball")),
            Err(RoomError::AbilityNotAvailable("fireball".to_string()))
        );
        assert_eq!(
            room.submit_action(PlayerAction::new("a", "meteor")),
            Err(RoomError::UnknownAbility("meteor".to_string()))
        );
        assert!(room.submit_action(PlayerAction::new("a", "slash").at_monster()).is_ok());
        assert_eq!(
            room.submit_action(PlayerAction::new("a", "slash")),
            Err(RoomError::AlreadySubmitted("a".to_string()))
        );
        assert_eq!(
            room.submit_racial_action(PlayerAction::new("a", "stone_resolve")),
            Err(RoomError::AbilityNotAvailable("stone_resolve".to_string()))
        );
        assert!(room.submit_racial_action(PlayerAction::new("a", "adaptability")).is_ok());
    }

    #[test]
    fn test_ready_when_everyone_submitted() {
        let mut room = room();
        assert!(!room.ready_to_resolve());
        room.submit_action(PlayerAction::new("a", "slash").at_monster()).unwrap();
        room.submit_action(PlayerAction::new("b", "heal").targeting("a")).unwrap();
        assert_eq!(room.waiting_on(), vec!["c".to_string()]);
        room.submit_action(PlayerAction::new("c", "fireball").at_monster()).unwrap();
        assert!(room.ready_to_resolve());
    }

    #[test]
    fn test_defense_resolves_before_attack() {
        let mut room = GameRoom::new("ORDR", quiet_constants(), default_abilities());
        // "a" sorts first but attacks; "z" shields and must still go first
        room.join("a", "Ann", Race::Human, "Pyromancer").unwrap();
        room.join("z", "Zed", Race::Human, "Warrior").unwrap();
        room.join("w", "Wil", Race::Human, "Warrior").unwrap();
        room.assign_warlock("a").unwrap();

        room.submit_action(PlayerAction::new("a", "fireball").targeting("w")).unwrap();
        room.submit_action(PlayerAction::new("z", "shield_wall").targeting("w")).unwrap();
        let outcome = room.process_round(&mut StepRng::new(u64::MAX, 0)).unwrap();

        // 30 * 1.2 = 36 raw, 3 armor -> 25
        assert_eq!(room.player("w").unwrap().hp(), 75);
        assert!(outcome.winner.is_none());
    }

    #[test]
    fn test_cooldown_blocks_next_round() {
        let mut room = room();
        room.submit_action(PlayerAction::new("b", "holy_light")).unwrap();
        room.process_round(&mut StepRng::new(u64::MAX, 0)).unwrap();

        assert_eq!(
            room.submit_action(PlayerAction::new("b", "holy_light")),
            Err(RoomError::OnCooldown {
                ability: "holy_light".to_string(),
                remaining: 2
            })
        );
    }

    #[test]
    fn test_failed_action_does_not_abort_round() {
        let mut room = room();
        room.submit_action(PlayerAction::new("a", "slash").targeting("b")).unwrap();
        room.submit_action(PlayerAction::new("c", "fireball").at_monster()).unwrap();
        room.roster.get_mut("b").unwrap().is_alive = false;

        let outcome = room.process_round(&mut StepRng::new(u64::MAX, 0)).unwrap();

        assert_eq!(outcome.log.count_of(EventKind::ActionFailed), 1);
        assert_eq!(room.monster().hp, 64);
    }

    #[test]
    fn test_removing_last_warlock_ends_game() {
        let mut room = room();
        assert_eq!(room.remove_player("c"), Some(Side::Good));
        assert_eq!(room.submit_action(PlayerAction::new("a", "slash")), Err(RoomError::GameOver));
        assert!(matches!(room.process_round(&mut StepRng::new(0, 0)), Err(RoomError::GameOver)));
    }
}
