//! Engine errors.
//!
//! Every variant is a contract violation between the engine and its
//! collaborators. Cancellation and stale replies are normal control flow and
//! never show up here.

use crate::cards::{CardId, VirtualCardId};
use crate::core::PlayerId;
use crate::events::{GameEventKind, Stage};
use crate::response::RequestKind;

/// Errors raised by the engine. All of them abort the current match.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("game is not started yet")]
    NotStarted,

    #[error("no event is being processed")]
    NoActiveEvent,

    #[error("stage {stage:?} does not belong to {kind:?}")]
    StageKindMismatch { kind: GameEventKind, stage: Stage },

    #[error("cannot schedule an empty stage sequence")]
    EmptyStageSequence,

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown card: {0}")]
    UnknownCard(CardId),

    #[error("unknown virtual card: {0}")]
    UnknownVirtualCard(VirtualCardId),

    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    #[error("unknown character: {0}")]
    UnknownCharacter(String),

    #[error("no response arrived for {kind:?} from {player}")]
    Stalled { kind: RequestKind, player: PlayerId },

    #[error("transport closed")]
    TransportClosed,

    #[error("invalid response from {player}: {reason}")]
    InvalidResponse { player: PlayerId, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
