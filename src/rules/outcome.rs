//! Match outcomes and the role-based win condition.

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, PlayerRole};

/// Result of a completed match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// One or more winners (a faction wins together).
    Winners(Vec<PlayerId>),
    /// Stopped by the turn cap with no winner.
    Draw,
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        match self {
            GameResult::Winners(ps) => ps.contains(&player),
            GameResult::Draw => false,
        }
    }
}

/// A seat as the win condition sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seat {
    pub player: PlayerId,
    pub role: PlayerRole,
    pub alive: bool,
}

/// Evaluate the win condition. `None` while the match goes on.
///
/// - Lord dead: a lone surviving renegade wins alone, otherwise every rebel
///   (dead or alive) wins.
/// - Lord alive with every rebel and renegade dead: the lord and every
///   loyalist win.
/// - Without a lord, the last player standing wins.
///
/// ```
/// use rust_sgs::core::{PlayerId, PlayerRole};
/// use rust_sgs::rules::{evaluate_winners, GameResult, Seat};
///
/// let seats = [
///     Seat { player: PlayerId::new(0), role: PlayerRole::Lord, alive: false },
///     Seat { player: PlayerId::new(1), role: PlayerRole::Rebel, alive: true },
///     Seat { player: PlayerId::new(2), role: PlayerRole::Renegade, alive: true },
/// ];
/// assert_eq!(evaluate_winners(&seats), Some(GameResult::Winners(vec![PlayerId::new(1)])));
/// ```
#[must_use]
pub fn evaluate_winners(seats: &[Seat]) -> Option<GameResult> {
    let alive: Vec<&Seat> = seats.iter().filter(|s| s.alive).collect();
    let with_role = |role: PlayerRole| -> Vec<PlayerId> {
        seats.iter().filter(|s| s.role == role).map(|s| s.player).collect()
    };

    let Some(lord) = seats.iter().find(|s| s.role == PlayerRole::Lord) else {
        return match alive.as_slice() {
            [last] => Some(GameResult::Winners(vec![last.player])),
            [] => Some(GameResult::Draw),
            _ => None,
        };
    };

    if !lord.alive {
        if let [last] = alive.as_slice() {
            if last.role == PlayerRole::Renegade {
                return Some(GameResult::Winners(vec![last.player]));
            }
        }
        return Some(GameResult::Winners(with_role(PlayerRole::Rebel)));
    }

    let opposition_alive = alive
        .iter()
        .any(|s| matches!(s.role, PlayerRole::Rebel | PlayerRole::Renegade));
    if opposition_alive {
        return None;
    }

    let mut winners = vec![lord.player];
    winners.extend(with_role(PlayerRole::Loyalist));
    winners.sort();
    Some(GameResult::Winners(winners))
}
