use rand_chacha::ChaCha8Rng;
use tessera_ir::{CallableOperation, OperationId, Sequence};
use tracing::{debug, info, trace};

use super::clock::{Clock, GenerationBudget};
use super::extend::extend;
use super::sampler::{sample_sequences, SamplingLimits};
use super::selector::select_operation;
use super::trace::{GenerationTrace, IterationOutcome, IterationRecord};
use super::{GenerationConfig, GenerationResult, GenerationStats};
use crate::error::{GenerationError, LoopError};
use crate::executor::{SequenceExecutor, Verdict};
use crate::pool::{Partition, SequencePool};
use crate::rng::generation_rng;
use crate::synth::ValueSynthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Stopped,
}

/// The feedback-directed generation loop.
///
/// Each iteration selects an operation, samples passing sequences to build
/// on, extends them with a call, drops structural duplicates, executes the
/// rest and files them as passing or failing. Only passing sequences feed
/// later iterations. The loop owns both pools and the single RNG; it stops
/// when the time budget is spent.
pub struct GenerationLoop<'a, S, E, C> {
    operations: &'a [CallableOperation],
    synthesizer: S,
    executor: E,
    clock: C,
    limits: SamplingLimits,
    budget: GenerationBudget,
    rng: ChaCha8Rng,
    pool: SequencePool,
    stats: GenerationStats,
    trace: Option<GenerationTrace>,
    state: LoopState,
}

impl<'a, S, E, C> GenerationLoop<'a, S, E, C>
where
    S: ValueSynthesizer,
    E: SequenceExecutor,
    C: Clock,
{
    /// Set up a loop over `operations`. The budget starts now.
    pub fn new(
        operations: &'a [CallableOperation],
        synthesizer: S,
        executor: E,
        mut clock: C,
        config: &GenerationConfig,
    ) -> Self {
        let budget = GenerationBudget::new(clock.now(), config.time_limit);
        Self {
            operations,
            synthesizer,
            executor,
            clock,
            limits: config.limits,
            budget,
            rng: generation_rng(config.seed),
            pool: SequencePool::new(),
            stats: GenerationStats::default(),
            trace: config.record_trace.then(GenerationTrace::new),
            state: LoopState::Running,
        }
    }

    pub fn run(mut self) -> Result<GenerationResult, LoopError> {
        info!(
            time_limit_secs = self.budget.limit().as_secs_f64(),
            operations = self.operations.len(),
            max_sequence_length = self.limits.max_sequence_length,
            max_sequences_combined = self.limits.max_sequences_combined,
            "starting sequence generation"
        );

        while self.state == LoopState::Running {
            let now = self.clock.now();
            if self.budget.exhausted(now) {
                self.stats.elapsed_secs = self.budget.elapsed(now).as_secs_f64();
                self.state = LoopState::Stopped;
                break;
            }
            self.iterate()?;
        }

        let (passing, failing) = self.pool.into_parts();
        self.stats.passing = passing.len();
        self.stats.failing = failing.len();

        info!(
            iterations = self.stats.iterations,
            passing = self.stats.passing,
            failing = self.stats.failing,
            duplicates = self.stats.duplicates,
            errors = self.stats.errors(),
            "sequence generation finished"
        );

        Ok(GenerationResult {
            passing,
            failing,
            stats: self.stats,
            trace: self.trace,
        })
    }

    fn iterate(&mut self) -> Result<(), LoopError> {
        self.stats.iterations += 1;
        let iteration = self.stats.iterations;
        let operations = self.operations;

        let op = match select_operation(operations, &mut self.rng) {
            Ok(op) => op,
            Err(err) => {
                self.skip(iteration, None, 0, err);
                return Ok(());
            }
        };

        let (merged, built) = {
            let sampled = sample_sequences(self.pool.passing(), &self.limits, &mut self.rng);
            let built = extend(op, &sampled, &mut self.synthesizer, &mut self.rng);
            (sampled.len(), built)
        };
        let candidate = match built {
            Ok(candidate) => candidate,
            Err(err) => {
                self.skip(iteration, Some(&op.id), merged, err);
                return Ok(());
            }
        };

        if self.pool.is_duplicate(&candidate) {
            trace!(iteration, op = %op.id, "duplicate candidate discarded");
            self.stats.duplicates += 1;
            self.record(iteration, Some(&op.id), merged, IterationOutcome::Duplicate);
            return Ok(());
        }

        self.stats.executions += 1;
        let (partition, outcome) = self.classify(iteration, &candidate);
        self.pool.accept(candidate, partition)?;
        self.record(iteration, Some(&op.id), merged, outcome);
        Ok(())
    }

    fn classify(&mut self, iteration: u64, candidate: &Sequence) -> (Partition, IterationOutcome) {
        match self.executor.execute(candidate) {
            Verdict::NoViolation => (Partition::Passing, IterationOutcome::Passing),
            Verdict::Violation(violation) => {
                debug!(
                    iteration,
                    kind = ?violation.kind,
                    statement = ?violation.statement,
                    detail = %violation.detail,
                    "contract violation"
                );
                (
                    Partition::Failing,
                    IterationOutcome::Failing {
                        violation: violation.kind,
                    },
                )
            }
        }
    }

    fn skip(&mut self, iteration: u64, op: Option<&OperationId>, merged: usize, err: GenerationError) {
        debug!(iteration, error = %err, "candidate generation failed");
        let kind = err.kind();
        self.stats.count_error(kind);
        self.record(iteration, op, merged, IterationOutcome::Error { kind });
    }

    fn record(&mut self, iteration: u64, op: Option<&OperationId>, merged: usize, outcome: IterationOutcome) {
        if let Some(trace) = self.trace.as_mut() {
            trace.record(IterationRecord {
                iteration,
                operation: op.cloned(),
                merged,
                outcome,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::executor::AcceptAllExecutor;
    use crate::generation::clock::TickClock;
    use crate::synth::RandomValueSynthesizer;
    use tessera_ir::{Parameter, TypeRef};

    fn ticks(n: u32) -> GenerationConfig {
        GenerationConfig {
            time_limit: Duration::from_millis(u64::from(n + 1)),
            record_trace: true,
            ..Default::default()
        }
    }

    fn clock() -> TickClock {
        TickClock::new(Duration::from_millis(1))
    }

    #[test]
    fn test_iteration_count_follows_budget() {
        let ops = vec![CallableOperation::constructor("Counter", "new", vec![])];
        let result = GenerationLoop::new(
            &ops,
            RandomValueSynthesizer::default(),
            AcceptAllExecutor,
            clock(),
            &ticks(20),
        )
        .run()
        .unwrap();

        assert_eq!(result.stats.iterations, 20);
        assert!(result.stats.passing >= 1);
        assert_eq!(
            result.stats.executions + result.stats.duplicates,
            result.stats.iterations
        );
        assert_eq!(result.trace.map(|t| t.len()), Some(20));
    }

    #[test]
    fn test_zero_budget_runs_no_iterations() {
        let ops = vec![CallableOperation::constructor("Counter", "new", vec![])];
        let config = GenerationConfig {
            time_limit: Duration::ZERO,
            ..Default::default()
        };
        let result = GenerationLoop::new(
            &ops,
            RandomValueSynthesizer::default(),
            AcceptAllExecutor,
            clock(),
            &config,
        )
        .run()
        .unwrap();
        assert_eq!(result.stats.iterations, 0);
        assert!(result.passing.is_empty());
        assert!(result.trace.is_none());
    }

    #[test]
    fn test_zero_budget_trace_is_empty() {
        let ops = vec![CallableOperation::constructor("Counter", "new", vec![])];
        let result = GenerationLoop::new(
            &ops,
            RandomValueSynthesizer::default(),
            AcceptAllExecutor,
            clock(),
            &ticks(0),
        )
        .run()
        .unwrap();
        assert!(result.trace.is_some_and(|t| t.is_empty()));

        let result = GenerationLoop::new(
            &ops,
            RandomValueSynthesizer::default(),
            AcceptAllExecutor,
            clock(),
            &ticks(3),
        )
        .run()
        .unwrap();
        assert!(result.trace.is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn test_errors_are_counted_and_loop_continues() {
        let ops = vec![CallableOperation::method(
            "Counter",
            "add",
            vec![Parameter::new("n", TypeRef::Int)],
            TypeRef::Int,
        )];
        let result = GenerationLoop::new(
            &ops,
            RandomValueSynthesizer::default(),
            AcceptAllExecutor,
            clock(),
            &ticks(10),
        )
        .run()
        .unwrap();

        assert_eq!(result.stats.iterations, 10);
        assert_eq!(result.stats.synthesis_errors, 10);
        assert!(result.passing.is_empty());
        assert!(result.failing.is_empty());
    }
}
