//! Card references: physical cards and virtual stand-ins.
//!
//! A virtual card is what an ability produces when it lets a player use
//! some cards "as" another card. Events carry `CardRef`s; player areas only
//! ever store physical `CardId`s, so every ownership change expands the
//! reference first (see [`CardCatalog::expand`](super::CardCatalog::expand)).

use serde::{Deserialize, Serialize};

use super::definition::{CardDefinition, CardId};

/// Identifier of a virtual card, allocated by the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualCardId(pub u32);

impl std::fmt::Display for VirtualCardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VirtualCard({})", self.0)
    }
}

/// Reference to a card as it travels through events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardRef {
    Physical(CardId),
    Virtual(VirtualCardId),
}

impl CardRef {
    /// The physical id, if this is not a virtual card.
    #[must_use]
    pub fn physical(self) -> Option<CardId> {
        match self {
            Self::Physical(id) => Some(id),
            Self::Virtual(_) => None,
        }
    }

    #[must_use]
    pub fn is_virtual(self) -> bool {
        matches!(self, Self::Virtual(_))
    }

    /// Stable tag for processing-card bookkeeping and middleware keys.
    #[must_use]
    pub fn tag(self) -> String {
        match self {
            Self::Physical(id) => format!("card-{}", id.0),
            Self::Virtual(id) => format!("virtual-{}", id.0),
        }
    }
}

impl From<CardId> for CardRef {
    fn from(id: CardId) -> Self {
        Self::Physical(id)
    }
}

impl std::fmt::Display for CardRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Physical(id) => id.fmt(f),
            Self::Virtual(id) => id.fmt(f),
        }
    }
}

/// A virtual card: the face it is used as, and the cards underneath.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualCard {
    pub id: VirtualCardId,

    /// What the card is used as. Its `id` field is meaningless.
    pub face: CardDefinition,

    /// Physical cards consumed. May be empty (a card conjured by an ability).
    pub actual: Vec<CardId>,

    /// Ability that produced it.
    pub generated_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_accessor() {
        assert_eq!(CardRef::Physical(CardId(4)).physical(), Some(CardId(4)));
        assert_eq!(CardRef::Virtual(VirtualCardId(1)).physical(), None);
        assert!(CardRef::Virtual(VirtualCardId(1)).is_virtual());
    }

    #[test]
    fn test_tags_are_distinct() {
        assert_ne!(CardRef::Physical(CardId(1)).tag(), CardRef::Virtual(VirtualCardId(1)).tag());
    }

    #[test]
    fn test_from_card_id() {
        let card: CardRef = CardId(9).into();
        assert_eq!(card, CardRef::Physical(CardId(9)));
        assert_eq!(card.to_string(), "Card(9)");
    }
}
