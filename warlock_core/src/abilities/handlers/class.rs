//! Class ability handlers

use super::{effect_params, param_u32, player_target};
use crate::abilities::{AbilityContext, AbilityError, ActionTarget};
use crate::config::AbilityDef;
use crate::damage::apply_damage_modifier;
use crate::effects::EffectParams;
use crate::events::{EventKind, GameEvent};
use crate::player::{CounterAttack, Player};
use crate::types::{DamageSource, StatusEffectKind};
use serde_json::json;

/// Single-target damage against a player or the monster, with an optional
/// status effect riding on a landed hit
pub(super) fn attack(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    target: &ActionTarget,
) -> Result<(), AbilityError> {
    let raw = apply_damage_modifier(
        param_u32(def, "damage"),
        caster.stats.damage_modifier * ctx.multiplier,
    );
    let source = DamageSource::Player(caster.actor_ref());

    match target {
        ActionTarget::Monster => {
            ctx.combat.apply_damage_to_monster(ctx.monster, raw, &source, ctx.log);
        }
        ActionTarget::Player(id) => {
            if *id == caster.id {
                return Err(AbilityError::InvalidTarget(format!("{} cannot attack themself", caster.name)));
            }
            let outcome = ctx.combat.apply_damage_to_player(ctx.roster, id, raw, &source, false, ctx.log);
            if let (true, Some(key)) = (outcome.landed(), def.effect.as_deref()) {
                if let Some(player) = ctx.roster.get_mut(id) {
                    ctx.combat.status_effects().apply_effect_by_key(
                        player,
                        key,
                        effect_params(def),
                        Some(&caster.id),
                        ctx.log,
                    );
                }
            }
        }
        ActionTarget::Everyone => return Err(AbilityError::InvalidTarget("everyone".to_string())),
    }
    Ok(())
}

/// Damage every other living player, and the monster when `hits_monster` is set
pub(super) fn area_attack(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    _target: &ActionTarget,
) -> Result<(), AbilityError> {
    let raw = apply_damage_modifier(
        param_u32(def, "damage"),
        caster.stats.damage_modifier * ctx.multiplier,
    );
    let source = DamageSource::Player(caster.actor_ref());
    let monster = if def.param_or("hits_monster", 0.0) > 0.0 {
        Some(&mut *ctx.monster)
    } else {
        None
    };
    ctx.combat.apply_area_damage(ctx.roster, monster, raw, &source, ctx.log);
    Ok(())
}

pub(super) fn heal(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    target: &ActionTarget,
) -> Result<(), AbilityError> {
    let id = player_target(target)?;
    let amount = apply_damage_modifier(param_u32(def, "amount"), ctx.multiplier);
    ctx.combat.apply_healing(ctx.roster, &caster.id, id, amount, ctx.log);
    Ok(())
}

pub(super) fn area_heal(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    _target: &ActionTarget,
) -> Result<(), AbilityError> {
    let amount = apply_damage_modifier(param_u32(def, "amount"), ctx.multiplier);
    ctx.combat.apply_area_healing(ctx.roster, &caster.id, amount, ctx.log);
    Ok(())
}

pub(super) fn shield(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    target: &ActionTarget,
) -> Result<(), AbilityError> {
    let mut params = EffectParams::new();
    if let Some(armor) = def.param("armor") {
        params = params.armor(armor as i32);
    }
    if let Some(turns) = def.param("turns") {
        params = params.turns(turns as u32);
    }
    apply_status(ctx, caster, target, StatusEffectKind::Shielded, params)
}

pub(super) fn invisibility(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    target: &ActionTarget,
) -> Result<(), AbilityError> {
    let mut params = EffectParams::new();
    if let Some(turns) = def.param("turns") {
        params = params.turns(turns as u32);
    }
    apply_status(ctx, caster, target, StatusEffectKind::Invisible, params)
}

/// Counter-attack against anyone who hits the caster; reveals warlocks
pub(super) fn spirit_guard(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    _target: &ActionTarget,
) -> Result<(), AbilityError> {
    install_counter(ctx, caster, def, false)
}

/// Counter-attack that only strikes (and reveals) warlocks
pub(super) fn sanctuary(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    _target: &ActionTarget,
) -> Result<(), AbilityError> {
    install_counter(ctx, caster, def, true)
}

/// Privately learn whether the target is a warlock
pub(super) fn detect(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    _def: &AbilityDef,
    target: &ActionTarget,
) -> Result<(), AbilityError> {
    let id = player_target(target)?;
    if *id == caster.id {
        return Err(AbilityError::InvalidTarget(format!("{} cannot study themself", caster.name)));
    }
    let Some(subject) = ctx.roster.get(id) else {
        return Err(AbilityError::InvalidTarget(id.clone()));
    };
    let verdict = if subject.is_warlock { "IS" } else { "is NOT" };
    // source only: the subject must not learn they were read
    ctx.log.push(
        GameEvent::private(
            EventKind::WarlockDetected,
            format!("Your vision reveals that {} {} a Warlock.", subject.name, verdict),
        )
        .with_source(caster.id.clone())
        .with_details(json!({ "subject": subject.id, "is_warlock": subject.is_warlock })),
    );
    Ok(())
}

/// Apply the definition's effect (vulnerable by default) without dealing damage
pub(super) fn curse(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    target: &ActionTarget,
) -> Result<(), AbilityError> {
    let id = player_target(target)?;
    let key = def.effect.as_deref().unwrap_or("vulnerable");
    if let Some(player) = ctx.roster.get_mut(id) {
        ctx.combat
            .status_effects()
            .apply_effect_by_key(player, key, effect_params(def), Some(&caster.id), ctx.log);
    }
    Ok(())
}

fn apply_status(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    target: &ActionTarget,
    kind: StatusEffectKind,
    params: EffectParams,
) -> Result<(), AbilityError> {
    let id = player_target(target)?;
    let player = ctx
        .roster
        .get_mut(id)
        .ok_or_else(|| AbilityError::InvalidTarget(id.clone()))?;
    ctx.combat
        .status_effects()
        .apply_effect(player, kind, params, Some(&caster.id), ctx.log);
    Ok(())
}

fn install_counter(
    ctx: &mut AbilityContext<'_>,
    caster: &Player,
    def: &AbilityDef,
    warlock_only: bool,
) -> Result<(), AbilityError> {
    let player = ctx
        .roster
        .get_mut(&caster.id)
        .ok_or_else(|| AbilityError::ActorNotFound(caster.id.clone()))?;
    // survives the end of the round it was cast in
    let turns = def.param_or("turns", 1.0).max(1.0) as u32 + 1;
    player.effects.class_effects.counter_attack = Some(CounterAttack {
        name: def.name.clone(),
        damage: param_u32(def, "counter_damage"),
        reveals_warlocks: def.param_or("reveals_warlocks", 1.0) > 0.0,
        warlock_only,
        turns,
    });
    ctx.log.push(
        GameEvent::public(
            EventKind::StatusApplied,
            format!("{} is surrounded by {}.", player.name, def.name),
        )
        .with_target(player.id.clone())
        .with_details(json!({ "turns": turns })),
    );
    Ok(())
}
