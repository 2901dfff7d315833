//! # rust-sgs
//!
//! A stage-pipeline rules engine for a turn-based multiplayer card game.
//!
//! ## Design Principles
//!
//! 1. **Everything is an event**: Damage, draws, card uses and phase changes
//!    all resolve through the same pipeline of named stages. Abilities hook
//!    stages instead of patching engine code.
//!
//! 2. **Explicit stage stack**: Nested events push frames on a scheduler;
//!    cancelling an event drops its frame and everything above it.
//!
//! 3. **Engine owns state**: One `Session` per match, passed by `&mut`.
//!    Card references are typed ids, never pointers.
//!
//! 4. **Transport at the edge**: Players answer requests through a
//!    [`Transport`](response::Transport). Stale replies are discarded by
//!    request id.
//!
//! ## Modules
//!
//! - `core`: Player ids, configuration, RNG, errors
//! - `cards`: Definitions, virtual cards, card behaviour
//! - `zones`: Where each physical card is
//! - `events`: Event kinds, the stage catalog, payloads
//! - `stack`: The stage scheduler
//! - `rules`: Rule registry, conditions, win evaluation
//! - `response`: Requests, replies and transports
//! - `room`: Players and card areas of one table
//! - `skills`: Player abilities
//! - `session`: Interpreter, protocols and the turn driver

pub mod core;
pub mod cards;
pub mod zones;
pub mod events;
pub mod stack;
pub mod rules;
pub mod response;
pub mod room;
pub mod skills;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    EngineError, Result,
    GameRng, MatchConfig,
    PlayerCardsArea, PlayerId, PlayerPhase, PlayerRole,
};

pub use crate::cards::{CardCatalog, CardDefinition, CardId, CardRef, CardSkill};

pub use crate::events::{EventId, GameEvent, GameEventKind, Stage};

pub use crate::stack::StageScheduler;

pub use crate::rules::{GameResult, Rule, RuleCondition, RuleRegistry};

pub use crate::response::{ChannelTransport, Reply, RequestKind, ScriptedTransport, Transport};

pub use crate::room::{Player, Room};

pub use crate::skills::{Character, Skill};

pub use crate::session::{Session, SessionBuilder, TurnState};
