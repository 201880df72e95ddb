use rand::seq::index;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tessera_ir::Sequence;
use tracing::trace;

/// Caps on the dependency context of a new sequence. 0 = unbounded.
///
/// Without caps sequence length can double every iteration, so the default
/// is bounded and `UNBOUNDED` is an explicit opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingLimits {
    /// Only sequences shorter than this may be reused.
    pub max_sequence_length: usize,
    /// At most this many sequences are merged into one candidate.
    pub max_sequences_combined: usize,
}

impl SamplingLimits {
    pub const UNBOUNDED: SamplingLimits = SamplingLimits {
        max_sequence_length: 0,
        max_sequences_combined: 0,
    };
}

impl Default for SamplingLimits {
    fn default() -> Self {
        Self {
            max_sequence_length: 10,
            max_sequences_combined: 10,
        }
    }
}

/// Draw a random subset of the passing pool to build on.
///
/// The sample size is uniform in `[0, bound]`, where `bound` is the number
/// of eligible sequences capped by `max_sequences_combined`; members are
/// drawn uniformly without replacement. An empty sample is valid.
pub fn sample_sequences<'a>(
    passing: &'a [Sequence],
    limits: &SamplingLimits,
    rng: &mut ChaCha8Rng,
) -> Vec<&'a Sequence> {
    let eligible: Vec<&Sequence> = if limits.max_sequence_length == 0 {
        passing.iter().collect()
    } else {
        passing
            .iter()
            .filter(|s| s.len() < limits.max_sequence_length)
            .collect()
    };

    let upper_bound = if limits.max_sequences_combined == 0 {
        eligible.len()
    } else {
        eligible.len().min(limits.max_sequences_combined)
    };

    let amount = rng.gen_range(0..=upper_bound);
    let sampled: Vec<&Sequence> = index::sample(rng, eligible.len(), amount)
        .into_iter()
        .map(|i| eligible[i])
        .collect();

    trace!(
        sampled = sampled.len(),
        eligible = eligible.len(),
        available = passing.len(),
        "sampled dependency sequences"
    );
    sampled
}
