//! Prelude module for convenient imports
//!
//! ```rust
//! use warlock_core::prelude::*;
//! ```

// Core types
pub use crate::player::Player;
pub use crate::roster::PlayerRoster;
pub use crate::types::{DamageSource, PlayerId, Race, Side, StatusEffectKind, MONSTER_TARGET};

// Rooms
pub use crate::room::{GameRoom, RoomError, RoundOutcome};
pub use crate::rooms::RoomRegistry;

// Actions
pub use crate::abilities::PlayerAction;

// Events
pub use crate::events::{EventKind, GameEvent, RoundLog};

// Config
pub use crate::config::{default_abilities, load_ability_catalog, load_constants, GameConstants};
