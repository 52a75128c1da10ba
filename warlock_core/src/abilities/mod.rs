//! Ability engine - interprets catalog definitions against live room state
//!
//! The catalog (see [`crate::config::AbilityCatalog`]) says *what* an ability
//! is; the handlers here say what its `handler` key *does*. Handlers only
//! touch state through [`CombatSystem`] and the status effect manager.

mod handlers;
mod registry;

pub use registry::AbilityRegistry;

use crate::combat::CombatSystem;
use crate::config::AbilityDef;
use crate::events::RoundLog;
use crate::monster::Monster;
use crate::player::Player;
use crate::roster::PlayerRoster;
use crate::types::{PlayerId, MONSTER_TARGET};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single action failed. Reported per action; the round continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbilityError {
    #[error("No handler registered for '{0}'")]
    Unregistered(String),
    #[error("Unknown ability '{0}'")]
    UnknownAbility(String),
    #[error("Actor '{0}' not found")]
    ActorNotFound(PlayerId),
    #[error("Actor '{0}' cannot act")]
    ActorIncapacitated(PlayerId),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("Ability '{0}' is not available to this player")]
    NotAvailable(String),
}

/// One submitted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub actor_id: PlayerId,
    /// Ability id from the catalog
    pub ability_type: String,
    /// Player id, [`MONSTER_TARGET`], or none for self/area abilities
    #[serde(default)]
    pub target_id: Option<String>,
}

impl PlayerAction {
    pub fn new(actor_id: impl Into<PlayerId>, ability_type: impl Into<String>) -> Self {
        PlayerAction {
            actor_id: actor_id.into(),
            ability_type: ability_type.into(),
            target_id: None,
        }
    }

    pub fn targeting(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn at_monster(self) -> Self {
        self.targeting(MONSTER_TARGET)
    }
}

/// Resolved target of an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    Player(PlayerId),
    Monster,
    /// Area abilities
    Everyone,
}

/// Mutable room state lent to a handler for one action
pub struct AbilityContext<'a> {
    pub roster: &'a mut PlayerRoster,
    pub monster: &'a mut Monster,
    pub combat: &'a mut CombatSystem,
    pub log: &'a mut RoundLog,
    pub rng: &'a mut dyn RngCore,
    /// Crit/blood rage multiplier for this action, applied by damage and heal handlers
    pub multiplier: f64,
}

/// A handler receives a snapshot of the caster taken before it runs
pub type AbilityHandler =
    fn(&mut AbilityContext<'_>, &Player, &AbilityDef, &ActionTarget) -> Result<(), AbilityError>;
