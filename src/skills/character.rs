//! Characters offered at the start of a match.

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, PlayerRole};

/// A pickable character: health and the abilities it grants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub max_hp: i32,
    /// Ability names, each registered in the session's ability catalog.
    pub skills: Vec<String>,
    /// Offered to the lord seat.
    pub lord: bool,
}

impl Character {
    #[must_use]
    pub fn new(name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            skills: Vec::new(),
            lord: false,
        }
    }

    #[must_use]
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    #[must_use]
    pub fn as_lord(mut self) -> Self {
        self.lord = true;
        self
    }
}

/// Payload of a `ChooseCharacter` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterOffer {
    pub candidates: Vec<String>,
    pub role: PlayerRole,
    /// The lord seat and its pick, once made.
    pub lord: Option<(PlayerId, String)>,
}

impl CharacterOffer {
    /// The candidate named by `reply`, or the first one when the reply names
    /// nothing on offer.
    #[must_use]
    pub fn resolve(&self, reply: Option<&str>) -> Option<&str> {
        reply
            .and_then(|name| self.candidates.iter().find(|c| *c == name))
            .or_else(|| self.candidates.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(names: &[&str]) -> CharacterOffer {
        CharacterOffer {
            candidates: names.iter().map(|n| n.to_string()).collect(),
            role: PlayerRole::Rebel,
            lord: None,
        }
    }

    #[test]
    fn test_resolve_named_candidate() {
        assert_eq!(offer(&["a", "b", "c"]).resolve(Some("b")), Some("b"));
    }

    #[test]
    fn test_resolve_falls_back_to_first() {
        let offer = offer(&["a", "b"]);
        assert_eq!(offer.resolve(Some("ghost")), Some("a"));
        assert_eq!(offer.resolve(None), Some("a"));
    }

    #[test]
    fn test_resolve_empty_offer() {
        assert_eq!(offer(&[]).resolve(Some("a")), None);
    }

    #[test]
    fn test_builder_marks_lord() {
        let liu = Character::new("liu", 4).with_skill("rende").as_lord();
        assert!(liu.lord);
        assert_eq!(liu.skills, vec!["rende".to_string()]);
    }
}
