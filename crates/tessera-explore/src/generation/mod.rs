pub mod clock;
pub mod engine;
pub mod extend;
pub mod sampler;
pub mod selector;
pub mod trace;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tessera_ir::Sequence;

use crate::error::GenerationErrorKind;

pub use clock::{Clock, GenerationBudget, SystemClock, TickClock};
pub use engine::GenerationLoop;
pub use sampler::SamplingLimits;
pub use trace::{GenerationTrace, IterationOutcome, IterationRecord};

/// Parameters of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub time_limit: Duration,
    pub seed: u64,
    pub limits: SamplingLimits,
    /// Keep a per-iteration trace in the result.
    pub record_trace: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
            seed: 42,
            limits: SamplingLimits::default(),
            record_trace: false,
        }
    }
}

/// Counters collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub iterations: u64,
    /// Candidates handed to the executor.
    pub executions: u64,
    /// Candidates discarded as structural duplicates.
    pub duplicates: u64,
    pub discovery_errors: u64,
    pub no_public_operation: u64,
    pub synthesis_errors: u64,
    pub passing: usize,
    pub failing: usize,
    pub elapsed_secs: f64,
}

impl GenerationStats {
    pub(crate) fn count_error(&mut self, kind: GenerationErrorKind) {
        match kind {
            GenerationErrorKind::Discovery => self.discovery_errors += 1,
            GenerationErrorKind::NoPublicOperation => self.no_public_operation += 1,
            GenerationErrorKind::ValueSynthesis => self.synthesis_errors += 1,
        }
    }

    pub fn errors(&self) -> u64 {
        self.discovery_errors + self.no_public_operation + self.synthesis_errors
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Sequences that executed without a contract violation, in acceptance order.
    pub passing: Vec<Sequence>,
    /// Sequences whose execution violated a contract, in acceptance order.
    pub failing: Vec<Sequence>,
    pub stats: GenerationStats,
    pub trace: Option<GenerationTrace>,
}
