//! Combat - damage, healing and end-of-round resolution behind one facade

mod result;
mod system;

pub use result::{DamageOutcome, DamageResolution};
pub use system::CombatSystem;
