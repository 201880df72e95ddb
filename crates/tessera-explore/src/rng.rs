//! RNG seeding with ChaCha8.
//!
//! A generation run owns exactly one generator, seeded once. Selection,
//! sampling and value synthesis all draw from it, so the same seed with the
//! same collaborators replays the same run.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Create the run's generator from the configured seed.
pub fn generation_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
