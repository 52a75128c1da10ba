//! warlock_core - Round resolution engine for a social-deduction monster battle
//!
//! This library provides:
//! - DamageCalculator: armor and modifier math
//! - EffectManager / StatusEffectManager: one-shot, passive and timed effects
//! - WarlockSystem: corruption spread and win conditions
//! - TurnResolver: coordination bonuses, pending deaths, comeback balancing
//! - CombatSystem: the damage/heal pipeline the ability handlers drive
//! - AbilityRegistry: handler dispatch with critical hits and ultra fails
//! - GameRoom / RoomRegistry: submission, the per-round pipeline, room lookup

pub mod abilities;
pub mod combat;
pub mod config;
pub mod damage;
pub mod effects;
pub mod events;
pub mod monster;
pub mod player;
pub mod prelude;
pub mod room;
pub mod rooms;
pub mod roster;
pub mod turn;
pub mod types;
pub mod warlock;

// Re-export core types for convenience
pub use abilities::{AbilityError, AbilityRegistry, PlayerAction};
pub use combat::{CombatSystem, DamageOutcome, DamageResolution};
pub use config::{default_abilities, AbilityCatalog, AbilityDef, ConfigError, GameConstants};
pub use damage::{apply_damage_modifier, armor_reduction_fraction, reduce_by_armor};
pub use effects::{EffectManager, EffectParams, StatusEffectManager};
pub use events::{EventKind, GameEvent, RoundLog};
pub use monster::Monster;
pub use player::Player;
pub use room::{GameRoom, RoomError, RoundOutcome};
pub use rooms::{RegistryError, RoomRegistry, SharedRoom};
pub use roster::PlayerRoster;
pub use turn::{CoordinationStats, TurnResolver};
pub use types::{ActorRef, DamageSource, PlayerId, Race, Side, StatusEffectKind, MONSTER_TARGET};
pub use warlock::{check_win_conditions, ConversionFormula, ScaledConversion, WarlockSystem};
