//! Seats, roles and card areas.
//!
//! Seat order is turn order: seat 0 opens the match and play passes to the
//! next living seat, wrapping around the table.

use serde::{Deserialize, Serialize};

/// A seat at the table, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[must_use]
    pub const fn new(seat: u8) -> Self {
        Self(seat)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every seat of a `seats`-player table, in turn order.
    pub fn all(seats: usize) -> impl Iterator<Item = PlayerId> {
        (0..seats).map(|seat| PlayerId(seat as u8))
    }

    /// Every seat once, starting here and wrapping around.
    ///
    /// ```
    /// use rust_sgs::core::PlayerId;
    ///
    /// let order: Vec<_> = PlayerId::new(2).seats_from(4).map(PlayerId::index).collect();
    /// assert_eq!(order, vec![2, 3, 0, 1]);
    /// ```
    pub fn seats_from(self, seats: usize) -> impl Iterator<Item = PlayerId> {
        let start = self.index();
        (0..seats).map(move |step| PlayerId(((start + step) % seats) as u8))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seat {}", self.0)
    }
}

/// Hidden identity that decides who wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRole {
    /// Wins with the loyalists once every rebel and renegade is dead.
    Lord,
    Loyalist,
    /// Wins when the lord dies, unless the renegade is the last one standing.
    Rebel,
    /// Wins only as the sole survivor.
    Renegade,
    /// No role assigned (free-for-all tests, spectators).
    #[default]
    Unknown,
}

/// The areas a player's cards can sit in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerCardsArea {
    Hand,
    Equip,
    /// Delayed tricks waiting for the judgment phase.
    Judge,
}

impl PlayerCardsArea {
    /// Every area, in the order cards are collected when a player dies.
    pub const ALL: [PlayerCardsArea; 3] = [Self::Hand, Self::Equip, Self::Judge];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_seats_in_order() {
        let seats: Vec<_> = PlayerId::all(3).collect();
        assert_eq!(seats, vec![PlayerId(0), PlayerId(1), PlayerId(2)]);
        assert_eq!(PlayerId::new(2).to_string(), "seat 2");
    }

    #[test]
    fn test_seats_from_wraps_once() {
        let order: Vec<_> = PlayerId::new(3).seats_from(5).map(PlayerId::index).collect();
        assert_eq!(order, vec![3, 4, 0, 1, 2]);
        assert_eq!(PlayerId::new(0).seats_from(1).count(), 1);
    }

    #[test]
    fn test_role_serializes_by_name() {
        let json = serde_json::to_string(&PlayerRole::Renegade).unwrap();
        assert_eq!(json, "\"Renegade\"");
        assert_eq!(PlayerRole::default(), PlayerRole::Unknown);
    }
}
