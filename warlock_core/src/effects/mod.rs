//! Effect processing - timed status effects and one-shot/passive effects

mod manager;
mod status;

pub use manager::{EffectManager, HealSource};
pub use status::{EffectParams, StatusEffectManager};
