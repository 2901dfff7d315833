//! The room: players, card locations, the catalog and the pile RNGs.
//!
//! Everything here is synchronous bookkeeping. The engine reads and mutates
//! it through these accessors only, and never holds on to a borrowed player
//! across a dispatch.

use rustc_hash::FxHashMap;

use crate::cards::{CardCatalog, CardId, CardRef};
use crate::core::{EngineError, GameRng, PlayerCardsArea, PlayerId, Result};
use crate::response::Reply;
use crate::rules::{evaluate_winners, GameResult, Seat};
use crate::zones::{CardLocation, ZoneManager};

use super::player::Player;

/// Shared table state of one match.
#[derive(Debug)]
pub struct Room {
    /// Indexed by seat.
    players: Vec<Player>,
    zones: ZoneManager,
    catalog: CardCatalog,
    /// Opening shuffle.
    deal_rng: GameRng,
    /// Drop stack recycling, kept apart so extra reshuffles never change
    /// the opening deal of a seed.
    reshuffle_rng: GameRng,
    /// Cards in flight, by the tag of the action holding them.
    processing: FxHashMap<String, Vec<CardId>>,
}

impl Room {
    pub fn new(players: Vec<Player>, catalog: CardCatalog, rng: GameRng) -> Self {
        Self {
            players,
            zones: ZoneManager::new(),
            catalog,
            reshuffle_rng: rng.for_context("reshuffle"),
            deal_rng: rng,
            processing: FxHashMap::default(),
        }
    }

    // === Players ===

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(id.index()).ok_or(EngineError::UnknownPlayer(id))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(id.index())
            .ok_or(EngineError::UnknownPlayer(id))
    }

    /// All players in seat order, dead ones included.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Unknown seats count as dead.
    #[must_use]
    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.players.get(id.index()).is_some_and(Player::is_alive)
    }

    /// Living players in seat order.
    #[must_use]
    pub fn alive_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect()
    }

    /// Living players in turn order, starting at `start` (included if alive).
    #[must_use]
    pub fn alive_players_from(&self, start: PlayerId) -> Vec<PlayerId> {
        start
            .seats_from(self.player_count())
            .filter(|&p| self.is_alive(p))
            .collect()
    }

    // === Cards ===

    #[must_use]
    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut CardCatalog {
        &mut self.catalog
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    #[must_use]
    pub fn cards_in_area(&self, player: PlayerId, area: PlayerCardsArea) -> Vec<CardId> {
        self.zones.cards(CardLocation::Area(player, area))
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> Vec<CardId> {
        self.cards_in_area(player, PlayerCardsArea::Hand)
    }

    /// Every card a player holds, hand first, then equipment, then judge area.
    #[must_use]
    pub fn all_cards_of(&self, player: PlayerId) -> Vec<CardId> {
        PlayerCardsArea::ALL
            .iter()
            .flat_map(|&area| self.cards_in_area(player, area))
            .collect()
    }

    /// Who holds a card, and where.
    #[must_use]
    pub fn card_owner(&self, card: CardId) -> Option<(PlayerId, PlayerCardsArea)> {
        match self.zones.location(card)? {
            CardLocation::Area(player, area) => Some((player, area)),
            _ => None,
        }
    }

    /// Whether every physical card behind `card` sits in `player`'s `area`.
    #[must_use]
    pub fn holds(&self, player: PlayerId, card: CardRef, area: PlayerCardsArea) -> bool {
        match self.catalog.expand(card) {
            Ok(physical) => {
                !physical.is_empty()
                    && physical
                        .iter()
                        .all(|&c| self.zones.is_in(c, CardLocation::Area(player, area)))
            }
            Err(_) => false,
        }
    }

    /// Whether `player` has a hand card named `name`.
    #[must_use]
    pub fn has_card_named(&self, player: PlayerId, name: &str) -> bool {
        self.hand(player)
            .into_iter()
            .any(|c| self.catalog.is_named(CardRef::Physical(c), name))
    }

    /// The card a reply offers, if it is a `name` card held in `player`'s
    /// hand. Anything else counts as a decline.
    #[must_use]
    pub fn offered_card(&self, player: PlayerId, reply: &Reply, name: &str) -> Option<CardRef> {
        let card = reply.card()?;
        (self.catalog.is_named(card, name) && self.holds(player, card, PlayerCardsArea::Hand))
            .then_some(card)
    }

    // === Piles ===

    /// Put cards on the draw pile; the first card ends up on top.
    pub fn fill_draw_pile(&mut self, cards: &[CardId]) {
        for &card in cards.iter().rev() {
            self.zones.place(card, CardLocation::DrawPile);
        }
    }

    pub fn shuffle_draw_pile(&mut self) {
        self.zones.shuffle(CardLocation::DrawPile, &mut self.deal_rng);
    }

    #[must_use]
    pub fn draw_pile_size(&self) -> usize {
        self.zones.zone_size(CardLocation::DrawPile)
    }

    /// Take cards off the top of the pile into the processing area under
    /// `tag`. Reshuffles the drop stack into the pile when it runs out;
    /// returns fewer cards when both are exhausted.
    pub fn draw_from_pile(&mut self, amount: usize, tag: &str) -> Vec<CardId> {
        let mut drawn = Vec::with_capacity(amount);
        while drawn.len() < amount {
            if self.zones.zone_size(CardLocation::DrawPile) == 0 {
                let mut recycled = self.zones.take_all(CardLocation::DropStack);
                if recycled.is_empty() {
                    log::warn!("draw pile and drop stack are both empty");
                    break;
                }
                log::debug!("reshuffling {} cards into the draw pile", recycled.len());
                self.reshuffle_rng.shuffle(&mut recycled);
                for card in recycled {
                    self.zones.place(card, CardLocation::DrawPile);
                }
            }
            if let Some(card) = self.zones.pop_top(CardLocation::DrawPile) {
                drawn.push(card);
            }
        }
        self.add_processing_cards(tag, &drawn);
        drawn
    }

    /// Move cards to the drop stack face up and clear their processing flags.
    pub fn bury(&mut self, cards: &[CardId]) {
        for &card in cards {
            self.zones.place(card, CardLocation::DropStack);
            self.end_process_on_card(card);
        }
    }

    /// Move a card into a player area and clear its processing flag.
    pub fn move_to_area(&mut self, card: CardId, player: PlayerId, area: PlayerCardsArea) {
        self.zones.place(card, CardLocation::Area(player, area));
        self.end_process_on_card(card);
    }

    /// Move a card into the processing area without flagging it.
    pub fn move_to_processing(&mut self, card: CardId) {
        self.zones.place(card, CardLocation::Processing);
    }

    // === Processing bookkeeping ===

    /// Flag cards as in flight under `tag` and move them to processing.
    pub fn add_processing_cards(&mut self, tag: &str, cards: &[CardId]) {
        for &card in cards {
            self.move_to_processing(card);
        }
        let entry = self.processing.entry(tag.to_string()).or_default();
        for &card in cards {
            if !entry.contains(&card) {
                entry.push(card);
            }
        }
    }

    /// Drop the `tag` entry. Returns the cards that were still flagged.
    pub fn end_process_on_tag(&mut self, tag: &str) -> Vec<CardId> {
        self.processing.remove(tag).unwrap_or_default()
    }

    /// Clear a card's flag under every tag.
    pub fn end_process_on_card(&mut self, card: CardId) {
        self.processing.retain(|_, cards| {
            cards.retain(|&c| c != card);
            !cards.is_empty()
        });
    }

    #[must_use]
    pub fn processing_cards(&self, tag: &str) -> &[CardId] {
        self.processing.get(tag).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_card_on_processing(&self, card: CardId) -> bool {
        self.processing.values().any(|cards| cards.contains(&card))
    }

    /// End `tag` and bury whatever of it is still lying in processing.
    pub fn release_processing(&mut self, tag: &str) -> Vec<CardId> {
        let leftovers: Vec<CardId> = self
            .end_process_on_tag(tag)
            .into_iter()
            .filter(|&c| self.zones.is_in(c, CardLocation::Processing))
            .collect();
        self.bury(&leftovers);
        leftovers
    }

    // === Outcome ===

    /// Win condition over the current seats. `None` while the match goes on.
    #[must_use]
    pub fn game_winners(&self) -> Option<GameResult> {
        let seats: Vec<Seat> = self
            .players()
            .map(|p| Seat {
                player: p.id,
                role: p.role,
                alive: p.is_alive(),
            })
            .collect();
        evaluate_winners(&seats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardCategory, CardSuit};
    use crate::core::PlayerRole;

    fn room(players: u8) -> (Room, Vec<CardId>) {
        let mut catalog = CardCatalog::new();
        let cards: Vec<CardId> = (1..=6)
            .map(|n| catalog.register("slash", CardSuit::Spade, n, CardCategory::Basic))
            .collect();
        let seats = (0..players)
            .map(|i| Player::new(PlayerId::new(i), format!("p{}", i), PlayerRole::Unknown, 4))
            .collect();
        let mut room = Room::new(seats, catalog, GameRng::new(3));
        room.fill_draw_pile(&cards);
        (room, cards)
    }

    #[test]
    fn test_unknown_player() {
        let (room, _) = room(2);
        assert!(matches!(room.player(PlayerId::new(5)), Err(EngineError::UnknownPlayer(_))));
        assert!(!room.is_alive(PlayerId::new(5)));
    }

    #[test]
    fn test_alive_players_from_skips_dead() {
        let (mut room, _) = room(4);
        room.player_mut(PlayerId::new(3)).unwrap().dead = true;

        assert_eq!(
            room.alive_players_from(PlayerId::new(2)),
            vec![PlayerId::new(2), PlayerId::new(0), PlayerId::new(1)]
        );
        assert_eq!(room.alive_players().len(), 3);
    }

    #[test]
    fn test_draw_takes_from_top_into_processing() {
        let (mut room, cards) = room(2);
        let drawn = room.draw_from_pile(2, "draw");

        assert_eq!(drawn, vec![cards[0], cards[1]]);
        assert_eq!(room.processing_cards("draw"), drawn.as_slice());
        assert!(room.is_card_on_processing(cards[0]));
        assert_eq!(room.draw_pile_size(), 4);
    }

    #[test]
    fn test_draw_reshuffles_drop_stack() {
        let (mut room, _) = room(2);
        let first = room.draw_from_pile(6, "a");
        room.bury(&first[..3]);

        let second = room.draw_from_pile(2, "b");
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|c| first[..3].contains(c)));

        let rest = room.draw_from_pile(5, "c");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_move_to_area_clears_flag() {
        let (mut room, _) = room(2);
        let drawn = room.draw_from_pile(1, "draw");
        room.move_to_area(drawn[0], PlayerId::new(1), PlayerCardsArea::Hand);

        assert!(!room.is_card_on_processing(drawn[0]));
        assert_eq!(room.card_owner(drawn[0]), Some((PlayerId::new(1), PlayerCardsArea::Hand)));
        assert_eq!(room.hand(PlayerId::new(1)), drawn);
        assert!(room.processing_cards("draw").is_empty());
    }

    #[test]
    fn test_release_processing_buries_leftovers() {
        let (mut room, _) = room(2);
        let drawn = room.draw_from_pile(3, "pool");
        room.move_to_area(drawn[1], PlayerId::new(0), PlayerCardsArea::Hand);

        let buried = room.release_processing("pool");
        assert_eq!(buried, vec![drawn[0], drawn[2]]);
        assert_eq!(room.zones().zone_size(CardLocation::DropStack), 2);
    }

    #[test]
    fn test_offered_card_checks_name_and_hand() {
        let (mut room, cards) = room(2);
        room.move_to_area(cards[0], PlayerId::new(0), PlayerCardsArea::Hand);

        let offer = Reply::Card(CardRef::Physical(cards[0]));
        assert!(room.offered_card(PlayerId::new(0), &offer, "slash").is_some());
        assert!(room.offered_card(PlayerId::new(0), &offer, "jink").is_none());
        assert!(room.offered_card(PlayerId::new(1), &offer, "slash").is_none());
        assert!(room.offered_card(PlayerId::new(0), &Reply::Decline, "slash").is_none());
    }

    #[test]
    fn test_game_winners_free_for_all() {
        let (mut room, _) = room(2);
        assert_eq!(room.game_winners(), None);
        room.player_mut(PlayerId::new(0)).unwrap().dead = true;
        assert_eq!(
            room.game_winners(),
            Some(GameResult::Winners(vec![PlayerId::new(1)]))
        );
    }
}
