//! Match configuration types.
//!
//! Hosts configure a match at startup by providing a `MatchConfig`, either
//! built in code or deserialized from JSON. The engine never hardcodes
//! draw amounts or hand sizes beyond the defaults documented here.

use serde::{Deserialize, Serialize};

use super::error::{EngineError, Result};

/// The fixed phases of a player's turn, in play order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerPhase {
    /// Resolve pending delayed tricks, most recent first.
    Judge,
    /// Draw cards from the pile.
    Draw,
    /// Play cards and abilities until the player ends the phase.
    Play,
    /// Discard down to the hand limit.
    Discard,
}

impl PlayerPhase {
    /// All phases in turn order.
    pub const TURN_ORDER: [PlayerPhase; 4] = [Self::Judge, Self::Draw, Self::Play, Self::Discard];
}

impl std::fmt::Display for PlayerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Judge => "judge",
            Self::Draw => "draw",
            Self::Play => "play",
            Self::Discard => "discard",
        };
        f.write_str(name)
    }
}

/// Complete match configuration.
///
/// ## Example
///
/// ```
/// use rust_sgs::core::MatchConfig;
///
/// let config = MatchConfig::from_json(r#"{ "draw_per_phase": 3, "seed": 9 }"#).unwrap();
/// assert_eq!(config.draw_per_phase, 3);
/// assert_eq!(config.opening_hand_size, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Cards drawn in the draw phase.
    pub draw_per_phase: u32,

    /// Cards dealt to every player when the match starts.
    pub opening_hand_size: u32,

    /// Cards drawn by whoever kills a rebel.
    pub rebel_kill_bonus: u32,

    /// Shuffle the pile before dealing. Tests turn this off to stack the deck.
    pub shuffle_pile: bool,

    /// Seed for every shuffle in the match.
    pub seed: u64,

    /// Stop with a draw after this many turns. `None` plays until a winner.
    pub max_turns: Option<u32>,

    /// Smallest seat count accepted.
    pub min_players: usize,

    /// Largest seat count accepted.
    pub max_players: usize,

    /// Characters offered to each non-lord seat.
    pub character_candidates: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            draw_per_phase: 2,
            opening_hand_size: 4,
            rebel_kill_bonus: 3,
            shuffle_pile: true,
            seed: 0,
            max_turns: None,
            min_players: 2,
            max_players: 10,
            character_candidates: 3,
        }
    }
}

impl MatchConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the draw-phase amount.
    #[must_use]
    pub fn with_draw_per_phase(mut self, amount: u32) -> Self {
        self.draw_per_phase = amount;
        self
    }

    /// Set the opening hand size.
    #[must_use]
    pub fn with_opening_hand_size(mut self, size: u32) -> Self {
        self.opening_hand_size = size;
        self
    }

    /// Set the rebel kill bonus.
    #[must_use]
    pub fn with_rebel_kill_bonus(mut self, amount: u32) -> Self {
        self.rebel_kill_bonus = amount;
        self
    }

    /// Enable or disable shuffling.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle_pile = shuffle;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cap the match length.
    #[must_use]
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Set how many characters each non-lord seat picks from.
    #[must_use]
    pub fn with_character_candidates(mut self, count: usize) -> Self {
        self.character_candidates = count;
        self
    }

    /// Check internal consistency and that `player_count` fits the bounds.
    pub fn validate_players(&self, player_count: usize) -> Result<()> {
        self.validate()?;
        if player_count < self.min_players || player_count > self.max_players {
            return Err(EngineError::Config(format!(
                "{} players requested, allowed range is {}..={}",
                player_count, self.min_players, self.max_players
            )));
        }
        Ok(())
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.min_players == 0 || self.min_players > self.max_players {
            return Err(EngineError::Config(format!(
                "invalid player bounds {}..={}",
                self.min_players, self.max_players
            )));
        }
        if self.character_candidates == 0 {
            return Err(EngineError::Config("character_candidates must be at least 1".to_string()));
        }
        if self.max_players > 255 {
            return Err(EngineError::Config("at most 255 players supported".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.draw_per_phase, 2);
        assert_eq!(config.opening_hand_size, 4);
        assert_eq!(config.rebel_kill_bonus, 3);
        assert!(config.shuffle_pile);
        assert_eq!(config.max_turns, None);
    }

    #[test]
    fn test_builder() {
        let config = MatchConfig::new()
            .with_draw_per_phase(1)
            .with_opening_hand_size(0)
            .with_shuffle(false)
            .with_seed(5)
            .with_max_turns(12);

        assert_eq!(config.draw_per_phase, 1);
        assert_eq!(config.opening_hand_size, 0);
        assert!(!config.shuffle_pile);
        assert_eq!(config.seed, 5);
        assert_eq!(config.max_turns, Some(12));
    }

    #[test]
    fn test_from_json_partial() {
        let config = MatchConfig::from_json(r#"{ "rebel_kill_bonus": 1, "max_turns": 30 }"#).unwrap();
        assert_eq!(config.rebel_kill_bonus, 1);
        assert_eq!(config.max_turns, Some(30));
        assert_eq!(config.draw_per_phase, 2);
    }

    #[test]
    fn test_from_json_rejects_bad_bounds() {
        let err = MatchConfig::from_json(r#"{ "min_players": 5, "max_players": 3 }"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_validate_players() {
        let config = MatchConfig::default();
        assert!(config.validate_players(4).is_ok());
        assert!(config.validate_players(1).is_err());
        assert!(config.validate_players(11).is_err());
    }

    #[test]
    fn test_phase_order() {
        assert_eq!(PlayerPhase::TURN_ORDER[0], PlayerPhase::Judge);
        assert_eq!(PlayerPhase::TURN_ORDER[3], PlayerPhase::Discard);
        assert_eq!(PlayerPhase::Play.to_string(), "play");
    }
}
