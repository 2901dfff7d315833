//! Seeded shuffling for the draw pile and the character draft.
//!
//! A match seeded with the same value deals the same cards, so a recorded
//! config is enough to replay the opening. Each use of randomness takes its
//! own derived stream; see [`GameRng::for_context`].

use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// ChaCha8 stream that remembers the seed it came from.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Derive a stream keyed by `label`.
    ///
    /// The derived stream depends only on the original seed and the label,
    /// never on how far `self` has advanced.
    #[must_use]
    pub fn for_context(&self, label: &str) -> Self {
        let mut hasher = rustc_hash::FxHasher::default();
        self.seed.hash(&mut hasher);
        label.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}
