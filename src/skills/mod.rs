//! Character abilities and the characters that carry them.
//!
//! The engine ships no abilities of its own; hosts implement [`Skill`] and
//! register them on the session, then hand the session a roster of
//! [`Character`]s to draft from when the match starts.

mod catalog;
mod character;

pub use catalog::{Skill, SkillCatalog};
pub use character::{Character, CharacterOffer};
