//! Core engine types: players, configuration, RNG, errors.
//!
//! This module contains the building blocks every other module depends on.
//! Nothing here knows about stages or events.

pub mod config;
pub mod error;
pub mod player;
pub mod rng;

pub use config::{MatchConfig, PlayerPhase};
pub use error::{EngineError, Result};
pub use player::{PlayerCardsArea, PlayerId, PlayerRole};
pub use rng::GameRng;
