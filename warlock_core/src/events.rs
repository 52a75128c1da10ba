//! Round event log
//!
//! Systems append typed events while a round resolves; the room hands the
//! finished log back to its caller, which decides what to broadcast. Public
//! events go to everyone, private ones only to their source/target.

use crate::types::PlayerId;
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TurnStarted,
    AbilityUsed,
    Damage,
    MonsterDamaged,
    AttackMissed,
    DamageBlocked,
    Heal,
    HealBlocked,
    CounterAttack,
    WarlockDetected,
    StatusApplied,
    StatusRefreshed,
    StatusTick,
    StatusExpired,
    CriticalHit,
    UltraFail,
    Death,
    Resurrected,
    Conversion,
    MonsterAttack,
    MonsterDefeated,
    LevelUp,
    ComebackChanged,
    ActionFailed,
    GameOver,
}

/// A single structured log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: EventKind,
    /// Broadcast to every player when true
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PlayerId>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GameEvent {
    /// Create an event everyone sees
    pub fn public(kind: EventKind, message: impl Into<String>) -> Self {
        GameEvent {
            kind,
            public: true,
            source: None,
            target: None,
            message: message.into(),
            details: None,
        }
    }

    /// Create an event only its source/target see
    pub fn private(kind: EventKind, message: impl Into<String>) -> Self {
        GameEvent {
            public: false,
            ..GameEvent::public(kind, message)
        }
    }

    pub fn with_source(mut self, source: impl Into<PlayerId>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<PlayerId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether a given player may see this event
    pub fn visible_to(&self, player_id: &str) -> bool {
        self.public
            || self.source.as_deref() == Some(player_id)
            || self.target.as_deref() == Some(player_id)
    }
}

/// Ordered list of events produced by one round
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundLog {
    events: Vec<GameEvent>,
}

impl RoundLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn public_events(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(|e| e.public)
    }

    /// Private events addressed to (or sent by) a player
    pub fn private_events_for<'a>(&'a self, player_id: &'a str) -> impl Iterator<Item = &'a GameEvent> {
        self.events
            .iter()
            .filter(move |e| !e.public && e.visible_to(player_id))
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }
}
