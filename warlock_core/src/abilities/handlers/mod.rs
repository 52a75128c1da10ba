//! Built-in ability handlers

mod class;
mod racial;

use super::{AbilityError, ActionTarget, AbilityRegistry};
use crate::config::AbilityDef;
use crate::effects::EffectParams;
use crate::types::PlayerId;

pub(super) fn register_defaults(registry: &mut AbilityRegistry) {
    registry.register_class_ability("attack", class::attack);
    registry.register_class_ability("area_attack", class::area_attack);
    registry.register_class_ability("heal", class::heal);
    registry.register_class_ability("area_heal", class::area_heal);
    registry.register_class_ability("shield", class::shield);
    registry.register_class_ability("invisibility", class::invisibility);
    registry.register_class_ability("spirit_guard", class::spirit_guard);
    registry.register_class_ability("sanctuary", class::sanctuary);
    registry.register_class_ability("detect", class::detect);
    registry.register_class_ability("curse", class::curse);

    registry.register_racial_ability("stone_resolve", racial::stone_resolve);
    registry.register_racial_ability("blood_rage", racial::blood_rage);
    registry.register_racial_ability("adaptability", racial::adaptability);
}

/// Handlers that deal damage (crit and blood rage apply)
pub(super) fn is_offensive(def: &AbilityDef) -> bool {
    matches!(def.handler.as_str(), "attack" | "area_attack")
}

pub(super) fn is_healing(def: &AbilityDef) -> bool {
    matches!(def.handler.as_str(), "heal" | "area_heal")
}

/// Status effect parameters from `effect_*` params
fn effect_params(def: &AbilityDef) -> EffectParams {
    EffectParams {
        damage: def.param("effect_damage").map(|v| v as u32),
        armor: def.param("effect_armor").map(|v| v as i32),
        damage_increase: def.param("effect_increase"),
        turns: def.param("effect_turns").map(|v| v as u32),
    }
}

fn param_u32(def: &AbilityDef, key: &str) -> u32 {
    def.param_or(key, 0.0).max(0.0) as u32
}

fn player_target(target: &ActionTarget) -> Result<&PlayerId, AbilityError> {
    match target {
        ActionTarget::Player(id) => Ok(id),
        ActionTarget::Monster => Err(AbilityError::InvalidTarget("the monster".to_string())),
        ActionTarget::Everyone => Err(AbilityError::InvalidTarget("everyone".to_string())),
    }
}
