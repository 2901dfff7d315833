//! The room collaborator: players, card areas, piles, processing cards.

mod player;
mod table;

pub use player::Player;
pub use table::Room;
