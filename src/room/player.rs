//! Per-seat player state.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, PlayerRole};

/// A player at the table.
///
/// Card areas are not stored here; they live in the zone manager keyed by
/// `(player, area)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: PlayerRole,
    /// Character picked at the start of the match.
    pub character: Option<String>,
    pub hp: i32,
    pub max_hp: i32,
    pub dead: bool,

    /// Abilities held, by name.
    pub skills: Vec<String>,

    /// Ability uses since each ability's last refresh.
    pub ability_uses: FxHashMap<String, u32>,

    /// Card names used since the last phase change.
    pub card_use_history: Vec<String>,

    /// Extra cards the player may keep in the discard phase.
    pub hold_card_bonus: i32,
}

impl Player {
    /// A living player at full health.
    pub fn new(id: PlayerId, name: impl Into<String>, role: PlayerRole, max_hp: i32) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            character: None,
            hp: max_hp,
            max_hp,
            dead: false,
            skills: Vec::new(),
            ability_uses: FxHashMap::default(),
            card_use_history: Vec::new(),
            hold_card_bonus: 0,
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Cards the player may keep at the end of the turn.
    #[must_use]
    pub fn hand_limit(&self) -> usize {
        (self.hp.max(0) + self.hold_card_bonus).max(0) as usize
    }

    #[must_use]
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s == name)
    }

    /// Times `card_name` was used since the last phase change.
    #[must_use]
    pub fn times_used(&self, card_name: &str) -> usize {
        self.card_use_history.iter().filter(|n| *n == card_name).count()
    }

    #[must_use]
    pub fn ability_uses(&self, skill: &str) -> u32 {
        self.ability_uses.get(skill).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_full_health() {
        let player = Player::new(PlayerId::new(2), "zhou", PlayerRole::Rebel, 4);
        assert_eq!(player.hp, 4);
        assert!(player.is_alive());
        assert_eq!(player.hand_limit(), 4);
    }

    #[test]
    fn test_hand_limit_with_bonus_and_negative_hp() {
        let mut player = Player::new(PlayerId::new(0), "a", PlayerRole::Lord, 3);
        player.hold_card_bonus = 2;
        assert_eq!(player.hand_limit(), 5);

        player.hp = -1;
        assert_eq!(player.hand_limit(), 2);
    }

    #[test]
    fn test_history_counts() {
        let mut player = Player::new(PlayerId::new(0), "a", PlayerRole::Unknown, 3);
        player.card_use_history.push("slash".to_string());
        player.card_use_history.push("peach".to_string());
        player.card_use_history.push("slash".to_string());
        assert_eq!(player.times_used("slash"), 2);
        assert_eq!(player.times_used("jink"), 0);

        *player.ability_uses.entry("rende".to_string()).or_default() += 1;
        assert_eq!(player.ability_uses("rende"), 1);
    }
}
