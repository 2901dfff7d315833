//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use rust_sgs::cards::{CardCategory, CardId, CardSuit};
use rust_sgs::core::{MatchConfig, PlayerCardsArea, PlayerId, PlayerRole};
use rust_sgs::response::{Outbound, Outbox, Reply, RequestKind, ScriptedTransport};
use rust_sgs::Session;

pub fn p(seat: u8) -> PlayerId {
    PlayerId::new(seat)
}

/// One card of a stacked deck.
pub type CardSpec = (&'static str, CardSuit, u8, CardCategory);

/// A session over a stacked deck.
pub struct Table {
    pub session: Session,
    pub outbox: Outbox,
    /// Deck cards in the order given, first card on top of the pile.
    pub cards: Vec<CardId>,
}

impl Table {
    /// Move a deck card into `player`'s hand.
    pub fn give(&mut self, player: PlayerId, card: CardId) {
        self.session
            .room_mut()
            .move_to_area(card, player, PlayerCardsArea::Hand);
    }

    pub fn hp(&self, player: PlayerId) -> i32 {
        self.session.room().player(player).unwrap().hp
    }

    pub fn set_hp(&mut self, player: PlayerId, hp: i32) {
        self.session.room_mut().player_mut(player).unwrap().hp = hp;
    }
}

/// Unshuffled table with no opening hands and 4 max hp per seat.
pub fn table(roles: &[PlayerRole], deck: &[CardSpec], transport: ScriptedTransport) -> Table {
    table_with(MatchConfig::new(), roles, deck, transport)
}

pub fn table_with(
    config: MatchConfig,
    roles: &[PlayerRole],
    deck: &[CardSpec],
    transport: ScriptedTransport,
) -> Table {
    let outbox = transport.outbox();
    let mut builder = Session::builder()
        .with_config(config.with_shuffle(false).with_opening_hand_size(0))
        .with_transport(Box::new(transport));
    for (seat, &role) in roles.iter().enumerate() {
        builder = builder.with_player(format!("p{}", seat), role, 4);
    }

    let cards: Vec<CardId> = deck
        .iter()
        .map(|&(name, suit, number, category)| builder.catalog_mut().register(name, suit, number, category))
        .collect();
    let session = builder.with_deck(cards.clone()).build().unwrap();

    Table {
        session,
        outbox,
        cards,
    }
}

/// Transport that declines everything nobody scripted.
pub fn declining() -> ScriptedTransport {
    ScriptedTransport::new().with_fallback(|_, _| Some(Reply::Decline))
}

/// Fallback bot: ends every play phase, discards the first cards asked for
/// and declines everything else.
pub fn passive_bot(_to: PlayerId, message: &Outbound) -> Option<Reply> {
    let reply = match message.identifier {
        rust_sgs::response::MessageKind::Request(RequestKind::PlayCardOrSkill) => Reply::EndPhase,
        rust_sgs::response::MessageKind::Request(RequestKind::CardDrop) => {
            let count = message.payload["count"].as_u64().unwrap_or(0) as usize;
            let hand: Vec<CardId> =
                serde_json::from_value(message.payload["hand"].clone()).unwrap_or_default();
            Reply::Cards(hand.into_iter().take(count).collect())
        }
        _ => Reply::Decline,
    };
    Some(reply)
}

pub fn basic(name: &'static str, number: u8) -> CardSpec {
    (name, CardSuit::Spade, number, CardCategory::Basic)
}

pub fn trick(name: &'static str, number: u8) -> CardSpec {
    (name, CardSuit::Club, number, CardCategory::Trick)
}
