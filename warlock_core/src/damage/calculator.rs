//! Armor - Linear per-point damage reduction with a cap
//!
//! Every function here is pure. Full-block immunity is handled upstream by
//! the effect manager, so anything reaching this module always lands.

use crate::config::ArmorConstants;

/// Slack for float error before flooring (0.7 * 100 must floor to 70, not 69)
const FLOOR_EPSILON: f64 = 1e-9;

fn floor_damage(value: f64) -> u32 {
    let floored = (value + FLOOR_EPSILON).floor();
    if floored <= 0.0 {
        0
    } else if floored >= u32::MAX as f64 {
        u32::MAX
    } else {
        floored as u32
    }
}

/// Fraction of damage removed by armor
///
/// `armor * reduction_per_point`, capped at `max_reduction`. Negative armor
/// yields a negative fraction (damage increase) with no matching cap.
pub fn armor_reduction_fraction(armor: i32, constants: &ArmorConstants) -> f64 {
    let fraction = armor as f64 * constants.reduction_per_point;
    fraction.min(constants.max_reduction)
}

/// Calculate the damage left after armor
///
/// # Arguments
/// * `raw_damage` - Incoming damage before armor
/// * `armor` - The defender's effective armor (may be negative)
///
/// # Returns
/// `floor(raw * (1 - fraction))`, never below 1 when `raw_damage > 0`
pub fn reduce_by_armor(raw_damage: u32, armor: i32, constants: &ArmorConstants) -> u32 {
    if raw_damage == 0 {
        return 0;
    }

    let fraction = armor_reduction_fraction(armor, constants);
    let reduced = raw_damage as f64 * (1.0 - fraction);

    floor_damage(reduced).max(1)
}

/// `floor(base * multiplier)`, clamped at zero
pub fn apply_damage_modifier(base: u32, multiplier: f64) -> u32 {
    if multiplier <= 0.0 {
        return 0;
    }
    floor_damage(base as f64 * multiplier)
}
