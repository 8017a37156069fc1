#![allow(dead_code)]

use parcel_core::{ClientId, Parcel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const FIXED_CREATED_AT: &str = "2024-01-01T00:00:00Z";

/// Supplies client identifiers to tests that need distinct owners.
pub trait ClientIdSource {
    fn next_client(&mut self) -> ClientId;
}

/// Deterministic identifiers drawn from a seeded ChaCha stream.
pub struct SeededClientIds {
    rng: ChaCha8Rng,
}

impl SeededClientIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ClientIdSource for SeededClientIds {
    fn next_client(&mut self) -> ClientId {
        self.rng.random_range(0..10_000_000)
    }
}

pub fn test_parcel() -> Parcel {
    Parcel::with_created_at(1000, "test", FIXED_CREATED_AT)
}
