//! Wire types crossing the transport boundary.
//!
//! Everything here is serde-serializable; the engine never depends on how a
//! transport frames it.

use serde::{Deserialize, Serialize};

use crate::cards::{CardId, CardRef};
use crate::core::PlayerId;
use crate::events::{GameEventKind, Targets};

/// Identifier echoed by a reply so stale answers can be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request({})", self.0)
    }
}

/// What a request asks the player for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Play phase: use a card, use an ability, or end the phase.
    PlayCardOrSkill,
    /// Offer a counter card against a trick.
    CounterCard,
    /// Offer a rescue card to a dying player.
    Peach,
    /// Play a specific card in response (a jink against a slash).
    CardResponse,
    /// Choose cards to discard.
    CardDrop,
    /// Show a card for a pin-dian.
    PinDianCard,
    /// Pick one card from a revealed pool.
    AmazingGracePick,
    /// Free-form choice for abilities.
    ChooseOption,
    /// Pick a character from the offered candidates.
    ChooseCharacter,
}

/// Identifier of an outbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// State change caused by an event.
    Event(GameEventKind),
    Request(RequestKind),
    /// Shared pool shown before a draft pick.
    PoolUpdate,
    /// Draft finished; leftovers were buried.
    PoolFinished,
    GameOver,
}

/// A message pushed to one or all participants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    pub identifier: MessageKind,
    /// Set on requests; the reply must echo it.
    pub request: Option<RequestId>,
    pub payload: serde_json::Value,
}

/// An outbound message with its audience. `None` means everyone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub to: Option<PlayerId>,
    pub message: Outbound,
}

/// A participant's answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Decline,
    Card(CardRef),
    Cards(Vec<CardId>),
    EndPhase,
    UseCard {
        card: CardRef,
        targets: Targets,
    },
    UseSkill {
        skill: String,
        targets: Targets,
        cards: Vec<CardRef>,
    },
    Option(String),
}

impl Reply {
    /// The single card offered, if any.
    #[must_use]
    pub fn card(&self) -> Option<CardRef> {
        match self {
            Self::Card(card) => Some(*card),
            _ => None,
        }
    }
}

/// An inbound reply to a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub request: RequestId,
    pub kind: RequestKind,
    pub from: PlayerId,
    pub reply: Reply,
}

impl Response {
    #[must_use]
    pub fn is_decline(&self) -> bool {
        self.reply == Reply::Decline
    }
}
