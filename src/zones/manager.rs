//! Zone manager for card locations and movement.
//!
//! The `ZoneManager` knows where every physical card is and keeps each
//! location ordered:
//! - The draw pile, top card last
//! - The drop stack, most recently buried card last
//! - The processing area, cards in flight during a multi-step action
//! - Every player's hand, equip and judge areas, in arrival order
//!
//! A card is in exactly one location at a time; placing it somewhere new
//! removes it from wherever it was.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::CardId;
use crate::core::{GameRng, PlayerCardsArea, PlayerId};

/// Where a card can be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardLocation {
    DrawPile,
    DropStack,
    /// Revealed or consumed cards whose action has not finished yet.
    Processing,
    Area(PlayerId, PlayerCardsArea),
}

impl CardLocation {
    /// The owning player, for player areas.
    #[must_use]
    pub fn owner(self) -> Option<PlayerId> {
        match self {
            Self::Area(player, _) => Some(player),
            _ => None,
        }
    }
}

/// Tracks card locations across the table.
///
/// ## Usage
///
/// ```
/// use rust_sgs::cards::CardId;
/// use rust_sgs::core::{PlayerCardsArea, PlayerId};
/// use rust_sgs::zones::{CardLocation, ZoneManager};
///
/// let mut zones = ZoneManager::new();
/// zones.place(CardId(1), CardLocation::DrawPile);
/// zones.place(CardId(2), CardLocation::DrawPile);
///
/// let hand = CardLocation::Area(PlayerId::new(0), PlayerCardsArea::Hand);
/// let drawn = zones.pop_top(CardLocation::DrawPile).unwrap();
/// zones.place(drawn, hand);
///
/// assert_eq!(drawn, CardId(2));
/// assert_eq!(zones.location(CardId(2)), Some(hand));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZoneManager {
    /// Card locations: card -> location.
    locations: FxHashMap<CardId, CardLocation>,

    /// Ordered card lists, one per non-empty location.
    zone_order: FxHashMap<CardLocation, Vector<CardId>>,
}

impl ZoneManager {
    /// Create a new empty zone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a card on top of `location`, removing it from wherever it was.
    ///
    /// Returns the previous location, if the card was tracked.
    pub fn place(&mut self, card: CardId, location: CardLocation) -> Option<CardLocation> {
        let previous = self.remove(card);
        self.locations.insert(card, location);
        self.zone_order.entry(location).or_default().push_back(card);
        previous
    }

    /// Remove a card from the manager entirely.
    ///
    /// Returns the location it was in, or `None` if not found.
    pub fn remove(&mut self, card: CardId) -> Option<CardLocation> {
        let location = self.locations.remove(&card)?;

        if let Some(order) = self.zone_order.get_mut(&location) {
            order.retain(|&c| c != card);
        }

        Some(location)
    }

    /// Get the location of a card.
    #[must_use]
    pub fn location(&self, card: CardId) -> Option<CardLocation> {
        self.locations.get(&card).copied()
    }

    /// Check if a card is in a specific location.
    #[must_use]
    pub fn is_in(&self, card: CardId, location: CardLocation) -> bool {
        self.locations.get(&card) == Some(&location)
    }

    /// Cards in a location, bottom first.
    #[must_use]
    pub fn cards(&self, location: CardLocation) -> Vec<CardId> {
        self.zone_order
            .get(&location)
            .map(|order| order.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of cards in a location.
    #[must_use]
    pub fn zone_size(&self, location: CardLocation) -> usize {
        self.zone_order.get(&location).map_or(0, Vector::len)
    }

    /// Remove and return the top card of a location.
    pub fn pop_top(&mut self, location: CardLocation) -> Option<CardId> {
        let order = self.zone_order.get_mut(&location)?;
        let card = order.pop_back()?;
        self.locations.remove(&card);
        Some(card)
    }

    /// Remove every card from a location, bottom first.
    pub fn take_all(&mut self, location: CardLocation) -> Vec<CardId> {
        let cards: Vec<CardId> = self
            .zone_order
            .remove(&location)
            .map(|order| order.into_iter().collect())
            .unwrap_or_default();
        for card in &cards {
            self.locations.remove(card);
        }
        cards
    }

    /// Shuffle a location.
    pub fn shuffle(&mut self, location: CardLocation, rng: &mut GameRng) {
        if let Some(order) = self.zone_order.get_mut(&location) {
            let mut cards: Vec<CardId> = order.iter().copied().collect();
            rng.shuffle(&mut cards);
            *order = cards.into_iter().collect();
        }
    }

    /// Cards tracked across every location.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.locations.len()
    }

    /// Check if the manager tracks a card.
    #[must_use]
    pub fn contains(&self, card: CardId) -> bool {
        self.locations.contains_key(&card)
    }
}
