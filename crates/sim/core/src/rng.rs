//! Named, deterministic random streams for one trial.
//!
//! Every draw site names the stream it reads from ("Deadly Poison",
//! "Maelstrom Weapon", ...). Each name owns an independent generator seeded
//! from the trial seed and the name, so adding a new proc never shifts the
//! draws seen by existing ones.
//!
//! # Determinism
//!
//! Given the same trial seed and the same sequence of named draws, every
//! stream yields bit-identical values on every platform. Stream seeds are
//! derived from a SHA-256 digest of the label rather than `std` hashing.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Per-trial collection of named random streams.
#[derive(Debug)]
pub struct RandomStreams {
    seed: u64,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RandomStreams {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            streams: HashMap::new(),
        }
    }

    /// Seed this trial was started with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws a uniform value in `[0, 1)` from the stream named `label`.
    pub fn draw(&mut self, label: &str) -> f64 {
        self.stream(label).gen_range(0.0..1.0)
    }

    /// Draws a uniform value in `[min, max)`; returns `min` for empty ranges.
    pub fn draw_range(&mut self, label: &str, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.stream(label).gen_range(min..max)
    }

    /// Discards every stream and starts over from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.streams.clear();
    }

    fn stream(&mut self, label: &str) -> &mut ChaCha8Rng {
        let seed = self.seed;
        if !self.streams.contains_key(label) {
            let rng = ChaCha8Rng::seed_from_u64(stream_seed(seed, label));
            self.streams.insert(label.to_owned(), rng);
        }
        self.streams
            .get_mut(label)
            .unwrap_or_else(|| unreachable!("stream '{label}' inserted above"))
    }
}

/// Derives the seed of one named stream.
pub fn stream_seed(trial_seed: u64, label: &str) -> u64 {
    let digest = Sha256::digest(label.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    mix(trial_seed ^ u64::from_le_bytes(prefix))
}

/// Derives the seed of trial number `trial` from a run's base seed.
///
/// Trial seeds depend only on `(base_seed, trial)`, never on the order in
/// which parallel workers pick trials up.
pub fn trial_seed(base_seed: u64, trial: u64) -> u64 {
    mix(base_seed ^ trial.wrapping_mul(0x9e3779b97f4a7c15))
}

// SplitMix64 finalizer.
fn mix(mut hash: u64) -> u64 {
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ceb9fe1a85ec53);
    hash ^= hash >> 33;
    hash
}
