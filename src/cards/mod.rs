//! Card system: definitions, references, catalog, behaviour.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier of a physical card
//! - `CardRef`: What events carry, a physical card or a virtual stand-in
//! - `CardDefinition`: Name, suit, number and category
//! - `CardCatalog`: Definition lookup, virtual cards, behaviour by name
//! - `CardSkill`: Hooks a card name runs at the points of a card use
//!
//! The [`standard`] module holds the reference card set.

pub mod definition;
pub mod reference;
pub mod registry;
pub mod skill;
pub mod standard;

pub use definition::{CardCategory, CardDefinition, CardId, CardSuit};
pub use reference::{CardRef, VirtualCard, VirtualCardId};
pub use registry::CardCatalog;
pub use skill::CardSkill;
