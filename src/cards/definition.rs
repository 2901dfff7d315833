//! Card definitions - static card data.
//!
//! Every physical card in a match has its own `CardId` and its own
//! `CardDefinition`: two "slash" cards differ in suit and number, and the
//! number is what a pin-dian compares.

use serde::{Deserialize, Serialize};

/// Unique identifier for one physical card in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Card suit. Judgments read it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardSuit {
    /// Virtual cards built from several cards have no suit.
    NoSuit,
    Spade,
    Heart,
    Club,
    Diamond,
}

impl CardSuit {
    /// The four real suits, in deck-building order.
    pub const REAL: [CardSuit; 4] = [Self::Spade, Self::Heart, Self::Club, Self::Diamond];

    /// Hearts and diamonds.
    #[must_use]
    pub fn is_red(self) -> bool {
        matches!(self, Self::Heart | Self::Diamond)
    }
}

/// Broad card category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardCategory {
    Basic,
    /// Resolves immediately; subject to the countering window.
    Trick,
    /// Sits in the target's judge area until their judgment phase.
    DelayedTrick,
    /// Goes to the user's equip area instead of taking effect.
    Equip,
}

impl CardCategory {
    /// Trick-category cards open a countering window before their effect.
    #[must_use]
    pub fn is_trick(self) -> bool {
        matches!(self, Self::Trick | Self::DelayedTrick)
    }
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use rust_sgs::cards::{CardCategory, CardDefinition, CardId, CardSuit};
///
/// let slash = CardDefinition::new(CardId::new(1), "slash", CardCategory::Basic)
///     .with_suit(CardSuit::Spade)
///     .with_number(7);
///
/// assert_eq!(slash.number, 7);
/// assert!(!slash.category.is_trick());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique identifier for this card.
    pub id: CardId,

    /// Card name; also the key of its behaviour in the catalog.
    pub name: String,

    /// Suit.
    pub suit: CardSuit,

    /// Rank 1-13 (A-K). Zero for suitless virtual cards.
    pub number: u8,

    /// Category.
    pub category: CardCategory,
}

impl CardDefinition {
    /// Create a new card definition with no suit and number zero.
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>, category: CardCategory) -> Self {
        Self {
            id,
            name: name.into(),
            suit: CardSuit::NoSuit,
            number: 0,
            category,
        }
    }

    /// Set the suit (builder pattern).
    #[must_use]
    pub fn with_suit(mut self, suit: CardSuit) -> Self {
        self.suit = suit;
        self
    }

    /// Set the number (builder pattern).
    #[must_use]
    pub fn with_number(mut self, number: u8) -> Self {
        self.number = number;
        self
    }

    /// Check the card's name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}
