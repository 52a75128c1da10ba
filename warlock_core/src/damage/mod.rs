//! Damage math - armor reduction and multipliers

mod calculator;

pub use calculator::{apply_damage_modifier, armor_reduction_fraction, reduce_by_armor};
