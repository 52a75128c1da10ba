//! Core types shared across the round engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable player identity (survives reconnects)
pub type PlayerId = String;

/// Target id used by actions aimed at the monster
pub const MONSTER_TARGET: &str = "__monster__";

/// Which team a player (or a win) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Good,
    Evil,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Good => Side::Evil,
            Side::Evil => Side::Good,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Good => write!(f, "Good"),
            Side::Evil => write!(f, "Evil"),
        }
    }
}

/// Playable races. Each race carries a passive and/or a racial ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    Human,
    Dwarf,
    Elf,
    Orc,
    Skeleton,
}

impl Race {
    /// Get all races
    pub fn all() -> &'static [Race] {
        &[Race::Human, Race::Dwarf, Race::Elf, Race::Orc, Race::Skeleton]
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Timed status effects, in the order they are processed at end of round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffectKind {
    Poison,
    Shielded,
    Vulnerable,
    Invisible,
    Stunned,
}

impl StatusEffectKind {
    /// End-of-round processing order. Poison must tick before shields
    /// and armor change, vulnerability must stay visible to later checks.
    pub fn processing_order() -> &'static [StatusEffectKind] {
        &[
            StatusEffectKind::Poison,
            StatusEffectKind::Shielded,
            StatusEffectKind::Vulnerable,
            StatusEffectKind::Invisible,
            StatusEffectKind::Stunned,
        ]
    }

    /// Parse an effect key from ability config (`"poison"`, `"shielded"`, ...)
    pub fn from_key(key: &str) -> Option<StatusEffectKind> {
        match key {
            "poison" | "poisoned" => Some(StatusEffectKind::Poison),
            "shielded" | "shield" => Some(StatusEffectKind::Shielded),
            "vulnerable" => Some(StatusEffectKind::Vulnerable),
            "invisible" => Some(StatusEffectKind::Invisible),
            "stunned" | "stun" => Some(StatusEffectKind::Stunned),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            StatusEffectKind::Poison => "poison",
            StatusEffectKind::Shielded => "shielded",
            StatusEffectKind::Vulnerable => "vulnerable",
            StatusEffectKind::Invisible => "invisible",
            StatusEffectKind::Stunned => "stunned",
        }
    }

    /// Effects whose benefit is checked while actions resolve get one extra
    /// turn on application, so the end-of-round decrement of the round they
    /// were applied in does not eat their first full turn. Poison ticks in
    /// the round it lands, so it gets no offset.
    pub fn has_application_offset(&self) -> bool {
        !matches!(self, StatusEffectKind::Poison)
    }
}

impl fmt::Display for StatusEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Lightweight snapshot of a player acting on someone else
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: PlayerId,
    pub name: String,
    pub is_warlock: bool,
}

impl ActorRef {
    pub fn side(&self) -> Side {
        if self.is_warlock {
            Side::Evil
        } else {
            Side::Good
        }
    }
}

/// Who (or what) is dealing damage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DamageSource {
    Player(ActorRef),
    Monster,
    Poison,
}

impl DamageSource {
    /// Name recorded as the death attacker
    pub fn name(&self) -> &str {
        match self {
            DamageSource::Player(actor) => &actor.name,
            DamageSource::Monster => "The Monster",
            DamageSource::Poison => "Poison",
        }
    }

    pub fn actor(&self) -> Option<&ActorRef> {
        match self {
            DamageSource::Player(actor) => Some(actor),
            _ => None,
        }
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor().map(|a| a.id.as_str())
    }
}
