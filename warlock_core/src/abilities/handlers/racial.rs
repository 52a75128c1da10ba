//! Racial ability handlers. All are self-targeted.

use crate::abilities::{AbilityContext, AbilityError, ActionTarget};
use crate::config::AbilityDef;
use crate::damage::apply_damage_modifier;
use crate::events::{EventKind, GameEvent};
use crate::player::Player;
use serde_json::json;

/// Dwarf: the next damage instance is fully blocked
pub(super) fn stone_resolve(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    _def: &AbilityDef,
    _target: &ActionTarget,
) -> Result<(), AbilityError> {
    let player = ctx
        .roster
        .get_mut(&caster.id)
        .ok_or_else(|| AbilityError::ActorNotFound(caster.id.clone()))?;
    player.effects.racial_effects.immune_next_damage = true;
    ctx.log.push(
        GameEvent::public(
            EventKind::StatusApplied,
            format!("{}'s skin hardens to stone.", player.name),
        )
        .with_target(player.id.clone()),
    );
    Ok(())
}

/// Orc: pay a share of max hp to empower the next damaging ability.
/// The cost never kills.
pub(super) fn blood_rage(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    _def: &AbilityDef,
    _target: &ActionTarget,
) -> Result<(), AbilityError> {
    let racial = &ctx.combat.constants().racial;
    let (cost_fraction, multiplier) = (racial.blood_rage_cost, racial.blood_rage_multiplier);
    let player = ctx
        .roster
        .get_mut(&caster.id)
        .ok_or_else(|| AbilityError::ActorNotFound(caster.id.clone()))?;

    let cost = apply_damage_modifier(player.max_hp(), cost_fraction).min(player.hp().saturating_sub(1));
    let paid = player.take_damage(cost);
    player.effects.racial_effects.blood_rage = true;
    ctx.log.push(
        GameEvent::public(
            EventKind::StatusApplied,
            format!("{} enters a Blood Rage, sacrificing {} hp!", player.name, paid),
        )
        .with_target(player.id.clone())
        .with_details(json!({ "cost": paid, "multiplier": multiplier })),
    );
    Ok(())
}

/// Human: every class cooldown is ready again
pub(super) fn adaptability(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    _def: &AbilityDef,
    _target: &ActionTarget,
) -> Result<(), AbilityError> {
    let player = ctx
        .roster
        .get_mut(&caster.id)
        .ok_or_else(|| AbilityError::ActorNotFound(caster.id.clone()))?;
    player.abilities.reset_cooldowns();
    ctx.log.push(
        GameEvent::public(
            EventKind::StatusApplied,
            format!("{} adapts. All abilities are ready.", player.name),
        )
        .with_target(player.id.clone()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatSystem;
    use crate::config::{default_abilities, GameConstants};
    use crate::events::RoundLog;
    use crate::monster::Monster;
    use crate::roster::PlayerRoster;
    use crate::types::Race;
    use rand::rngs::mock::StepRng;

    fn run(roster: &mut PlayerRoster, handler: crate::abilities::AbilityHandler, caster: &str, ability: &str) {
        let constants = GameConstants::default();
        let def = default_abilities().get(ability).unwrap().clone();
        let caster = roster.get(caster).unwrap().clone();
        let mut monster = Monster::new(&constants.monster);
        let mut combat = CombatSystem::new(constants);
        let mut log = RoundLog::new();
        let mut rng = StepRng::new(0, 0);
        let mut ctx = AbilityContext {
            roster,
            monster: &mut monster,
            combat: &mut combat,
            log: &mut log,
            rng: &mut rng,
            multiplier: 1.0,
        };
        let target = ActionTarget::Player(caster.id.clone());
        handler(&mut ctx, &caster, &def, &target).unwrap();
    }

    #[test]
    fn test_stone_resolve_sets_immunity() {
        let mut roster = PlayerRoster::from_players(vec![Player::new("d", "Dain", Race::Dwarf, "Warrior")]);
        run(&mut roster, stone_resolve, "d", "stone_resolve");
        assert!(roster.get("d").unwrap().effects.racial_effects.immune_next_damage);
    }

    #[test]
    fn test_blood_rage_cost_is_never_lethal() {
        let mut orc = Player::new("o", "Grum", Race::Orc, "Warrior");
        orc.stats.hp = 3;
        let mut roster = PlayerRoster::from_players(vec![orc]);
        run(&mut roster, blood_rage, "o", "blood_rage");

        let orc = roster.get("o").unwrap();
        assert_eq!(orc.hp(), 1);
        assert!(orc.effects.racial_effects.blood_rage);
    }

    #[test]
    fn test_adaptability_resets_cooldowns() {
        let mut human = Player::new("h", "Hal", Race::Human, "Pyromancer");
        human.abilities.start_cooldown("inferno", 3);
        let mut roster = PlayerRoster::from_players(vec![human]);
        run(&mut roster, adaptability, "h", "adaptability");

        assert!(roster.get("h").unwrap().abilities.is_ready("inferno"));
    }
}
