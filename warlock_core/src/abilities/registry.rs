//! AbilityRegistry - handler dispatch with critical-hit and ultra-fail rolls

use super::handlers;
use super::{AbilityContext, AbilityError, AbilityHandler, ActionTarget, PlayerAction};
use crate::config::{AbilityCatalog, AbilityDef, CritConstants, GameConstants, TargetKind, UltraFailConstants};
use crate::events::{EventKind, GameEvent};
use crate::player::Player;
use crate::types::MONSTER_TARGET;
use rand::Rng;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

/// Maps handler keys to handlers, separately for class and racial abilities
#[derive(Debug, Clone)]
pub struct AbilityRegistry {
    catalog: AbilityCatalog,
    class_abilities: HashMap<String, AbilityHandler>,
    racial_abilities: HashMap<String, AbilityHandler>,
    crit: CritConstants,
    ultra_fail: UltraFailConstants,
    blood_rage_multiplier: f64,
}

impl AbilityRegistry {
    /// Empty registry; nothing executes until handlers are registered
    pub fn new(catalog: AbilityCatalog, constants: &GameConstants) -> Self {
        AbilityRegistry {
            catalog,
            class_abilities: HashMap::new(),
            racial_abilities: HashMap::new(),
            crit: constants.crit.clone(),
            ultra_fail: constants.ultra_fail.clone(),
            blood_rage_multiplier: constants.racial.blood_rage_multiplier,
        }
    }

    /// Registry with every built-in handler
    pub fn with_default_handlers(catalog: AbilityCatalog, constants: &GameConstants) -> Self {
        let mut registry = AbilityRegistry::new(catalog, constants);
        handlers::register_defaults(&mut registry);
        registry
    }

    pub fn register_class_ability(&mut self, key: impl Into<String>, handler: AbilityHandler) {
        self.class_abilities.insert(key.into(), handler);
    }

    pub fn register_racial_ability(&mut self, key: impl Into<String>, handler: AbilityHandler) {
        self.racial_abilities.insert(key.into(), handler);
    }

    pub fn has_class_handler(&self, key: &str) -> bool {
        self.class_abilities.contains_key(key)
    }

    pub fn has_racial_handler(&self, key: &str) -> bool {
        self.racial_abilities.contains_key(key)
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    pub fn definition(&self, ability_type: &str) -> Option<&AbilityDef> {
        self.catalog.get(ability_type)
    }

    /// Run a class ability: crit roll, ultra-fail roll, blood rage, then the handler
    pub fn execute_class_ability(
        &self,
        ctx: &mut AbilityContext<'_>,
        action: &PlayerAction,
    ) -> Result<(), AbilityError> {
        let def = self
            .catalog
            .get(&action.ability_type)
            .ok_or_else(|| AbilityError::UnknownAbility(action.ability_type.clone()))?;
        if def.is_racial() {
            return Err(AbilityError::NotAvailable(def.id.clone()));
        }
        let handler = *self
            .class_abilities
            .get(&def.handler)
            .ok_or_else(|| AbilityError::Unregistered(def.handler.clone()))?;

        let caster = self.caster(ctx, &action.actor_id)?;
        let mut target = resolve_target(ctx, &caster, def, action.target_id.as_deref())?;
        ctx.multiplier = 1.0;

        if handlers::is_offensive(def) || handlers::is_healing(def) {
            self.roll_critical(ctx, &caster, def);
        }
        if def.is_attack() && target == ActionTarget::Monster {
            if let Some(redirected) = self.roll_ultra_fail(ctx, &caster, def) {
                target = redirected;
            }
        }
        let blood_rage = handlers::is_offensive(def) && caster.effects.racial_effects.blood_rage;
        if blood_rage {
            ctx.multiplier *= self.blood_rage_multiplier;
        }

        log_ability_used(ctx, &caster, def, &target);
        debug!(actor = %caster.id, ability = %def.id, multiplier = ctx.multiplier, "executing class ability");
        handler(ctx, &caster, def, &target)?;

        // blood rage is only spent by an ability that went through
        if blood_rage {
            if let Some(player) = ctx.roster.get_mut(&caster.id) {
                player.effects.racial_effects.blood_rage = false;
            }
        }
        Ok(())
    }

    /// Run a racial ability, consuming one of the player's racial uses
    pub fn execute_racial_ability(
        &self,
        ctx: &mut AbilityContext<'_>,
        action: &PlayerAction,
    ) -> Result<(), AbilityError> {
        let def = self
            .catalog
            .get(&action.ability_type)
            .ok_or_else(|| AbilityError::UnknownAbility(action.ability_type.clone()))?;
        if !def.is_racial() {
            return Err(AbilityError::NotAvailable(def.id.clone()));
        }
        let handler = *self
            .racial_abilities
            .get(&def.handler)
            .ok_or_else(|| AbilityError::Unregistered(def.handler.clone()))?;

        let caster = self.caster(ctx, &action.actor_id)?;
        if !caster.abilities.can_use_racial(&def.id) {
            return Err(AbilityError::NotAvailable(def.id.clone()));
        }
        if let Some(player) = ctx.roster.get_mut(&caster.id) {
            player.abilities.consume_racial_use();
        }
        ctx.multiplier = 1.0;

        let target = ActionTarget::Player(caster.id.clone());
        log_ability_used(ctx, &caster, def, &target);
        debug!(actor = %caster.id, ability = %def.id, "executing racial ability");
        handler(ctx, &caster, def, &target)
    }

    /// Snapshot of a living actor. Players pending death still act.
    fn caster(&self, ctx: &AbilityContext<'_>, actor_id: &str) -> Result<Player, AbilityError> {
        let player = ctx
            .roster
            .get(actor_id)
            .ok_or_else(|| AbilityError::ActorNotFound(actor_id.to_string()))?;
        if !player.is_alive {
            return Err(AbilityError::ActorIncapacitated(actor_id.to_string()));
        }
        Ok(player.clone())
    }

    fn roll_critical(&self, ctx: &mut AbilityContext<'_>, caster: &Player, def: &AbilityDef) {
        if ctx.rng.gen::<f64>() >= self.crit.chance {
            return;
        }
        ctx.multiplier *= self.crit.multiplier;
        ctx.log.push(
            GameEvent::public(
                EventKind::CriticalHit,
                format!("Critical! {}'s {} surges with power.", caster.name, def.name),
            )
            .with_source(caster.id.clone())
            .with_details(json!({ "multiplier": self.crit.multiplier })),
        );
    }

    /// Occasionally an attack on the monster hits a random other player instead
    fn roll_ultra_fail(
        &self,
        ctx: &mut AbilityContext<'_>,
        caster: &Player,
        def: &AbilityDef,
    ) -> Option<ActionTarget> {
        if ctx.rng.gen::<f64>() >= self.ultra_fail.chance {
            return None;
        }
        let victim_id = ctx.roster.random_alive_target(&[caster.id.as_str()], ctx.rng)?;
        let victim_name = ctx
            .roster
            .get(&victim_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        ctx.log.push(
            GameEvent::public(
                EventKind::UltraFail,
                format!(
                    "Ultra fail! {}'s {} goes horribly wrong and strikes {} instead of the Monster!",
                    caster.name, def.name, victim_name
                ),
            )
            .with_source(caster.id.clone())
            .with_target(victim_id.clone()),
        );
        Some(ActionTarget::Player(victim_id))
    }

}

/// Turn a raw target id into a validated target for this definition.
/// Damaging abilities can never be aimed at the caster.
fn resolve_target(
    ctx: &AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    target_id: Option<&str>,
) -> Result<ActionTarget, AbilityError> {
    let player_target = |id: &str| -> Result<ActionTarget, AbilityError> {
        if handlers::is_offensive(def) && id == caster.id {
            Err(AbilityError::InvalidTarget(format!("{} cannot attack themself", caster.name)))
        } else if ctx.roster.is_valid_target(id) {
            Ok(ActionTarget::Player(id.to_string()))
        } else {
            Err(AbilityError::InvalidTarget(id.to_string()))
        }
    };

    match def.target {
        TargetKind::SelfOnly => Ok(ActionTarget::Player(caster.id.clone())),
        TargetKind::Monster => Ok(ActionTarget::Monster),
        TargetKind::Area => Ok(ActionTarget::Everyone),
        TargetKind::Single => match target_id {
            None => player_target(&caster.id),
            Some(MONSTER_TARGET) => Err(AbilityError::InvalidTarget(MONSTER_TARGET.to_string())),
            Some(id) => player_target(id),
        },
        TargetKind::Any => match target_id {
            None | Some(MONSTER_TARGET) => Ok(ActionTarget::Monster),
            Some(id) => player_target(id),
        },
    }
}

fn log_ability_used(ctx: &mut AbilityContext<'_>, caster: &Player, def: &AbilityDef, target: &ActionTarget) {
    let target_name = match target {
        ActionTarget::Monster => Some("the Monster".to_string()),
        ActionTarget::Everyone => None,
        ActionTarget::Player(id) if *id == caster.id => None,
        ActionTarget::Player(id) => ctx.roster.get(id).map(|p| p.name.clone()),
    };
    let message = match target_name {
        Some(name) => format!("{} uses {} on {}.", caster.name, def.name, name),
        None => format!("{} uses {}.", caster.name, def.name),
    };
    ctx.log.push(
        GameEvent::public(EventKind::AbilityUsed, message)
            .with_source(caster.id.clone())
            .with_details(json!({ "ability": def.id })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatSystem;
    use crate::config::default_abilities;
    use crate::events::RoundLog;
    use crate::monster::Monster;
    use crate::roster::PlayerRoster;
    use crate::types::Race;
    use rand::rngs::mock::StepRng;

    fn constants(crit: f64, ultra_fail: f64) -> GameConstants {
        let mut constants = GameConstants::default();
        constants.crit.chance = crit;
        constants.ultra_fail.chance = ultra_fail;
        constants
    }

    struct Fixture {
        roster: PlayerRoster,
        monster: Monster,
        combat: CombatSystem,
        log: RoundLog,
        rng: StepRng,
    }

    impl Fixture {
        fn new(constants: &GameConstants) -> Self {
            let catalog = default_abilities();
            Fixture {
                roster: PlayerRoster::from_players(vec![
                    Player::from_config("a", "Ann", Race::Human, "Warrior", constants, &catalog),
                    Player::from_config("b", "Bob", Race::Orc, "Priest", constants, &catalog),
                ]),
                monster: Monster::new(&constants.monster),
                combat: CombatSystem::new(constants.clone()),
                log: RoundLog::new(),
                rng: StepRng::new(0, 0),
            }
        }

        fn ctx(&mut self) -> AbilityContext<'_> {
            AbilityContext {
                roster: &mut self.roster,
                monster: &mut self.monster,
                combat: &mut self.combat,
                log: &mut self.log,
                rng: &mut self.rng,
                multiplier: 1.0,
            }
        }
    }

    #[test]
    fn test_unknown_and_unregistered() {
        let constants = constants(0.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        let registry = AbilityRegistry::new(default_abilities(), &constants);

        let missing = registry.execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "meteor"));
        assert_eq!(missing, Err(AbilityError::UnknownAbility("meteor".to_string())));

        let unregistered =
            registry.execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").at_monster());
        assert_eq!(unregistered, Err(AbilityError::Unregistered("attack".to_string())));
    }

    #[test]
    fn test_slash_hits_monster() {
        let constants = constants(0.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        registry
            .execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").at_monster())
            .unwrap();

        assert_eq!(fixture.monster.hp, 67);
        assert!(fixture.log.contains(EventKind::AbilityUsed));
        assert!(!fixture.log.contains(EventKind::CriticalHit));
    }

    #[test]
    fn test_critical_hit_multiplies() {
        let constants = constants(1.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        registry
            .execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").at_monster())
            .unwrap();

        // 33 * 1.5 = 49
        assert_eq!(fixture.monster.hp, 51);
        assert_eq!(fixture.log.count_of(EventKind::CriticalHit), 1);
    }

    #[test]
    fn test_ultra_fail_redirects_to_other_player() {
        let constants = constants(0.0, 1.0);
        let mut fixture = Fixture::new(&constants);
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        registry
            .execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").at_monster())
            .unwrap();

        assert_eq!(fixture.monster.hp, 100);
        assert_eq!(fixture.roster.get("b").unwrap().hp(), 67);
        assert_eq!(fixture.log.count_of(EventKind::UltraFail), 1);
    }

    #[test]
    fn test_dead_actor_and_bad_target() {
        let constants = constants(0.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        let bad = registry.execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").targeting("zed"));
        assert_eq!(bad, Err(AbilityError::InvalidTarget("zed".to_string())));

        fixture.roster.get_mut("a").unwrap().is_alive = false;
        let dead = registry.execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").at_monster());
        assert_eq!(dead, Err(AbilityError::ActorIncapacitated("a".to_string())));
    }

    #[test]
    fn test_racial_use_is_consumed() {
        let constants = constants(0.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        registry
            .execute_racial_ability(&mut fixture.ctx(), &PlayerAction::new("b", "blood_rage"))
            .unwrap();
        let again = registry.execute_racial_ability(&mut fixture.ctx(), &PlayerAction::new("b", "blood_rage"));

        assert_eq!(again, Err(AbilityError::NotAvailable("blood_rage".to_string())));
        let orc = fixture.roster.get("b").unwrap();
        assert!(orc.effects.racial_effects.blood_rage);
        assert_eq!(orc.hp(), 90);
    }

    #[test]
    fn test_self_attack_rejected_before_rolls() {
        let constants = constants(1.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        fixture.roster.get_mut("a").unwrap().effects.racial_effects.blood_rage = true;
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        let result =
            registry.execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").targeting("a"));

        assert!(matches!(result, Err(AbilityError::InvalidTarget(_))));
        assert!(fixture.roster.get("a").unwrap().effects.racial_effects.blood_rage);
        assert!(!fixture.log.contains(EventKind::CriticalHit));
        assert!(fixture.log.is_empty());
    }

    #[test]
    fn test_blood_rage_spent_on_landed_attack() {
        let constants = constants(0.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        fixture.roster.get_mut("a").unwrap().effects.racial_effects.blood_rage = true;
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        registry
            .execute_class_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash").at_monster())
            .unwrap();

        assert!(!fixture.roster.get("a").unwrap().effects.racial_effects.blood_rage);
        assert_eq!(fixture.monster.hp, 34);
    }

    #[test]
    fn test_class_ability_rejected_as_racial() {
        let constants = constants(0.0, 0.0);
        let mut fixture = Fixture::new(&constants);
        let registry = AbilityRegistry::with_default_handlers(default_abilities(), &constants);

        let result = registry.execute_racial_ability(&mut fixture.ctx(), &PlayerAction::new("a", "slash"));
        assert_eq!(result, Err(AbilityError::NotAvailable("slash".to_string())));
    }
}
