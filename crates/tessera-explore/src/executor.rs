use serde::{Deserialize, Serialize};
use tessera_ir::{CallableOperation, Sequence};
use tessera_sandbox::config::SandboxConfig;
use tessera_sandbox::runner::{FailureKind, SequenceRunner};
use tessera_sandbox::sandbox::SandboxError;

/// How the code under test violated its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The code under test faulted.
    Trap,
    /// A call did not finish within its budget.
    Timeout,
    /// The sequence could not be run as written.
    Unexecutable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Failing statement, if the executor knows it.
    pub statement: Option<usize>,
    pub kind: ViolationKind,
    pub detail: String,
}

/// Outcome of executing one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    NoViolation,
    Violation(Violation),
}

impl Verdict {
    pub fn is_violation(&self) -> bool {
        matches!(self, Verdict::Violation(_))
    }
}

/// Runs a sequence and reports a verdict.
///
/// Faults of the code under test are part of the verdict and never
/// propagate. Implementations must return within bounded time.
pub trait SequenceExecutor {
    fn execute(&mut self, sequence: &Sequence) -> Verdict;
}

impl<E: SequenceExecutor + ?Sized> SequenceExecutor for &mut E {
    fn execute(&mut self, sequence: &Sequence) -> Verdict {
        (**self).execute(sequence)
    }
}

/// Model-only executor: runs nothing, reports no violation.
pub struct AcceptAllExecutor;

impl SequenceExecutor for AcceptAllExecutor {
    fn execute(&mut self, _sequence: &Sequence) -> Verdict {
        Verdict::NoViolation
    }
}

/// Executor that runs sequences against a WASM module in the sandbox.
pub struct SandboxExecutor {
    runner: SequenceRunner,
}

impl SandboxExecutor {
    /// Load the module and bind `operations` to its exports.
    pub fn new(
        config: &SandboxConfig,
        wasm_bytes: &[u8],
        operations: &[CallableOperation],
    ) -> Result<Self, SandboxError> {
        Ok(Self {
            runner: SequenceRunner::new(config, wasm_bytes, operations)?,
        })
    }
}

impl SequenceExecutor for SandboxExecutor {
    fn execute(&mut self, sequence: &Sequence) -> Verdict {
        let outcome = self.runner.run(sequence);
        match outcome.failure {
            None => Verdict::NoViolation,
            Some(failure) => Verdict::Violation(Violation {
                statement: failure.position,
                kind: match failure.kind {
                    FailureKind::Trap => ViolationKind::Trap,
                    FailureKind::FuelExhausted => ViolationKind::Timeout,
                    FailureKind::Unexecutable => ViolationKind::Unexecutable,
                },
                detail: failure.message,
            }),
        }
    }
}
