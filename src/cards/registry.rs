//! Card catalog for definition lookup.
//!
//! The catalog holds every physical card of the match, the virtual cards
//! created during it, and the behaviour attached to each card name.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{EngineError, Result};

use super::definition::{CardCategory, CardDefinition, CardId, CardSuit};
use super::reference::{CardRef, VirtualCard, VirtualCardId};
use super::skill::CardSkill;

/// Registry of card definitions, virtual cards and card behaviour.
///
/// ## Usage
///
/// ```
/// use rust_sgs::cards::{CardCatalog, CardCategory, CardRef, CardSuit};
///
/// let mut catalog = CardCatalog::new();
/// let a = catalog.register("jink", CardSuit::Heart, 2, CardCategory::Basic);
/// let b = catalog.register("jink", CardSuit::Club, 5, CardCategory::Basic);
///
/// // Two jinks used as one slash.
/// let slash = catalog.create_virtual("slash", CardCategory::Basic, vec![a, b], Some("twin-blades")).unwrap();
/// assert_eq!(catalog.definition(slash).unwrap().name, "slash");
/// assert_eq!(catalog.expand(slash).unwrap().as_slice(), &[a, b]);
/// ```
#[derive(Default)]
pub struct CardCatalog {
    cards: FxHashMap<CardId, CardDefinition>,
    virtual_cards: FxHashMap<VirtualCardId, VirtualCard>,
    skills: FxHashMap<String, Rc<dyn CardSkill>>,
    next_id: u32,
    next_virtual: u32,
}

impl std::fmt::Debug for CardCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardCatalog")
            .field("cards", &self.cards.len())
            .field("virtual_cards", &self.virtual_cards.len())
            .field("skills", &self.skills.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CardCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a physical card, returns its freshly allocated ID.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        suit: CardSuit,
        number: u8,
        category: CardCategory,
    ) -> CardId {
        self.next_id += 1;
        let id = CardId::new(self.next_id);
        let card = CardDefinition::new(id, name, category)
            .with_suit(suit)
            .with_number(number);
        self.cards.insert(id, card);
        id
    }

    /// Get a physical card's definition.
    pub fn get(&self, id: CardId) -> Result<&CardDefinition> {
        self.cards.get(&id).ok_or(EngineError::UnknownCard(id))
    }

    /// Check if a physical card exists.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Definition a reference resolves to: the card itself, or the face of a
    /// virtual card.
    pub fn definition(&self, card: CardRef) -> Result<&CardDefinition> {
        match card {
            CardRef::Physical(id) => self.get(id),
            CardRef::Virtual(id) => self
                .virtual_cards
                .get(&id)
                .map(|v| &v.face)
                .ok_or(EngineError::UnknownVirtualCard(id)),
        }
    }

    /// Whether the reference resolves to a card named `name`.
    #[must_use]
    pub fn is_named(&self, card: CardRef, name: &str) -> bool {
        self.definition(card).is_ok_and(|d| d.is(name))
    }

    /// Create a virtual card used as `name`.
    ///
    /// A virtual card over exactly one physical card keeps its suit and
    /// number; anything else is suitless.
    pub fn create_virtual(
        &mut self,
        name: impl Into<String>,
        category: CardCategory,
        actual: Vec<CardId>,
        generated_by: Option<&str>,
    ) -> Result<CardRef> {
        let (suit, number) = match actual.as_slice() {
            [single] => {
                let card = self.get(*single)?;
                (card.suit, card.number)
            }
            others => {
                for id in others {
                    self.get(*id)?;
                }
                (CardSuit::NoSuit, 0)
            }
        };

        self.next_virtual += 1;
        let id = VirtualCardId(self.next_virtual);
        let face = CardDefinition::new(CardId::new(0), name, category)
            .with_suit(suit)
            .with_number(number);
        self.virtual_cards.insert(
            id,
            VirtualCard {
                id,
                face,
                actual,
                generated_by: generated_by.map(str::to_string),
            },
        );
        Ok(CardRef::Virtual(id))
    }

    /// Get a virtual card.
    pub fn virtual_card(&self, id: VirtualCardId) -> Result<&VirtualCard> {
        self.virtual_cards
            .get(&id)
            .ok_or(EngineError::UnknownVirtualCard(id))
    }

    /// The physical cards behind a reference.
    pub fn expand(&self, card: CardRef) -> Result<SmallVec<[CardId; 2]>> {
        match card {
            CardRef::Physical(id) => {
                self.get(id)?;
                Ok(smallvec::smallvec![id])
            }
            CardRef::Virtual(id) => Ok(self.virtual_card(id)?.actual.iter().copied().collect()),
        }
    }

    /// Expand many references, preserving order and dropping duplicates.
    pub fn expand_all(&self, cards: &[CardRef]) -> Result<Vec<CardId>> {
        let mut physical = Vec::with_capacity(cards.len());
        for card in cards {
            for id in self.expand(*card)? {
                if !physical.contains(&id) {
                    physical.push(id);
                }
            }
        }
        Ok(physical)
    }

    /// Attach behaviour to every card named `name`.
    pub fn register_skill(&mut self, name: impl Into<String>, skill: Rc<dyn CardSkill>) {
        self.skills.insert(name.into(), skill);
    }

    /// Behaviour of the card a reference resolves to.
    #[must_use]
    pub fn skill_for(&self, card: CardRef) -> Option<Rc<dyn CardSkill>> {
        let definition = self.definition(card).ok()?;
        self.skills.get(&definition.name).cloned()
    }

    /// Number of physical cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the catalog has no physical cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate physical card definitions.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut catalog = CardCatalog::new();
        let id = catalog.register("slash", CardSuit::Spade, 7, CardCategory::Basic);

        let card = catalog.get(id).unwrap();
        assert_eq!(card.name, "slash");
        assert_eq!(card.number, 7);
        assert!(catalog.contains(id));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_unknown_card() {
        let catalog = CardCatalog::new();
        assert!(matches!(catalog.get(CardId(3)), Err(EngineError::UnknownCard(CardId(3)))));
        assert!(matches!(
            catalog.expand(CardRef::Virtual(VirtualCardId(1))),
            Err(EngineError::UnknownVirtualCard(_))
        ));
    }

    #[test]
    fn test_single_card_virtual_keeps_suit() {
        let mut catalog = CardCatalog::new();
        let heart = catalog.register("peach", CardSuit::Heart, 3, CardCategory::Basic);

        let virtual_card = catalog
            .create_virtual("jink", CardCategory::Basic, vec![heart], None)
            .unwrap();
        let face = catalog.definition(virtual_card).unwrap();

        assert_eq!(face.suit, CardSuit::Heart);
        assert_eq!(face.number, 3);
        assert!(catalog.is_named(virtual_card, "jink"));
        assert!(!catalog.is_named(virtual_card, "peach"));
    }

    #[test]
    fn test_multi_card_virtual_is_suitless() {
        let mut catalog = CardCatalog::new();
        let a = catalog.register("jink", CardSuit::Heart, 3, CardCategory::Basic);
        let b = catalog.register("jink", CardSuit::Spade, 9, CardCategory::Basic);

        let virtual_card = catalog
            .create_virtual("slash", CardCategory::Basic, vec![a, b], Some("twin"))
            .unwrap();

        assert_eq!(catalog.definition(virtual_card).unwrap().suit, CardSuit::NoSuit);
        let expanded = catalog
            .expand_all(&[virtual_card, CardRef::Physical(a)])
            .unwrap();
        assert_eq!(expanded, vec![a, b]);
    }

    #[test]
    fn test_virtual_over_unknown_card_fails() {
        let mut catalog = CardCatalog::new();
        let result = catalog.create_virtual("slash", CardCategory::Basic, vec![CardId(44)], None);
        assert!(matches!(result, Err(EngineError::UnknownCard(_))));
    }
}
