//! Store-seeded deterministic RNG.
//!
//! Not a statistical generator. The only contract is that the stream is a
//! pure function of the store id, so two runs over the same inputs produce
//! bit-identical assortments.

use crate::thresholds::{RNG_SEED_OFFSET, RNG_SINE_SCALE};

/// Sine-recurrence stream seeded from a store identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreRng {
    state: f64,
}

impl StoreRng {
    /// Seed from a store id: sum of UTF-16 code units plus a fixed offset.
    pub fn for_store(store_id: &str) -> Self {
        Self::from_seed(seed_for(store_id))
    }

    /// Seed directly. Mostly useful for golden tests.
    pub fn from_seed(seed: f64) -> Self {
        Self { state: seed }
    }

    /// Current recurrence state.
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.sin() * RNG_SINE_SCALE;
        let frac = self.state - self.state.floor();
        // floor() of a negative value can leave frac == 1.0 after rounding.
        if frac >= 1.0 {
            0.0
        } else {
            frac
        }
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "next_index called with empty range");
        let idx = (self.next_f64() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }
}

/// Integer seed for a store id, returned as `f64` for the recurrence.
pub fn seed_for(store_id: &str) -> f64 {
    let sum: u64 = store_id.encode_utf16().map(u64::from).sum();
    sum as f64 + RNG_SEED_OFFSET
}
