//! The in-flight event record.
//!
//! A `GameEvent` is created by a rule or by the turn driver, handed to the
//! interpreter, mutated or cancelled by the rules that observe it, and
//! returned to the caller once its stages are exhausted. Nothing keeps it
//! afterwards.
//!
//! ## Middleware
//!
//! Stage handlers that need to pass data between stages (or between the
//! per-target effects of one card use) stash it in the middleware bag under
//! a tag unique to the triggering action. Values are JSON so the bag stays
//! transport-serializable.

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::Result;

use super::payload::EventPayload;
use super::stage::GameEventKind;

/// Identifier assigned by the session when the event is dispatched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// An event travelling through its stages.
///
/// ## Example
///
/// ```
/// use rust_sgs::core::PlayerId;
/// use rust_sgs::events::{DamageData, GameEvent, GameEventKind};
///
/// let mut event = GameEvent::new(DamageData {
///     from: Some(PlayerId::new(0)),
///     to: PlayerId::new(1),
///     amount: 1,
///     cards: Vec::new(),
///     by_skill: None,
/// });
///
/// assert_eq!(event.kind(), GameEventKind::Damage);
/// event.terminate();
/// assert!(event.is_terminated());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Zero until dispatched.
    pub id: EventId,

    pub payload: EventPayload,

    terminated: bool,

    /// Ignores [`terminate`](Self::terminate).
    pub uncancellable: bool,

    /// Card effects flagged this way skip the countering window.
    pub disresponsive: bool,

    /// Human-readable line broadcast with the event.
    pub message: Option<String>,

    /// Ability that created the event.
    pub triggered_by: Option<String>,

    middleware: FxHashMap<String, serde_json::Value>,
}

impl GameEvent {
    /// Create an undispatched event.
    pub fn new(payload: impl Into<EventPayload>) -> Self {
        Self {
            id: EventId::default(),
            payload: payload.into(),
            terminated: false,
            uncancellable: false,
            disresponsive: false,
            message: None,
            triggered_by: None,
            middleware: FxHashMap::default(),
        }
    }

    /// Create an event that cannot be cancelled.
    pub fn uncancellable(payload: impl Into<EventPayload>) -> Self {
        let mut event = Self::new(payload);
        event.uncancellable = true;
        event
    }

    /// Mark the effect as not respondable (builder pattern).
    #[must_use]
    pub fn disresponsive(mut self) -> Self {
        self.disresponsive = true;
        self
    }

    /// Attach a broadcast message (builder pattern).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Record the creating ability (builder pattern).
    #[must_use]
    pub fn triggered_by(mut self, skill: impl Into<String>) -> Self {
        self.triggered_by = Some(skill.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> GameEventKind {
        self.payload.kind()
    }

    /// Cancel the event. Its remaining stages will not run.
    pub fn terminate(&mut self) {
        if !self.uncancellable {
            self.terminated = true;
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Store a value under `tag`.
    pub fn set_middleware<T: Serialize>(&mut self, tag: impl Into<String>, value: &T) -> Result<()> {
        self.middleware.insert(tag.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Read back a value; `None` when absent or of another shape.
    #[must_use]
    pub fn middleware<T: DeserializeOwned>(&self, tag: &str) -> Option<T> {
        let value = self.middleware.get(tag)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn take_middleware(&mut self, tag: &str) -> Option<serde_json::Value> {
        self.middleware.remove(tag)
    }

    /// Copy every middleware entry of `other` into this event.
    pub fn inherit_middleware(&mut self, other: &GameEvent) {
        for (tag, value) in &other.middleware {
            self.middleware.insert(tag.clone(), value.clone());
        }
    }
}
