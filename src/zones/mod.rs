//! Where every card is.
//!
//! A card sits in exactly one [`CardLocation`] at a time, and every location
//! keeps its cards in order.

pub mod manager;

pub use manager::{CardLocation, ZoneManager};
