use serde::{Deserialize, Serialize};
use tessera_ir::OperationId;

use crate::error::GenerationErrorKind;
use crate::executor::ViolationKind;

/// What happened in one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IterationOutcome {
    Passing,
    Failing { violation: ViolationKind },
    /// Structurally equal to an accepted sequence; not executed.
    Duplicate,
    /// Candidate could not be built.
    Error { kind: GenerationErrorKind },
}

/// One step of the generation trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration number.
    pub iteration: u64,
    /// Selected operation; None if selection itself failed.
    pub operation: Option<OperationId>,
    /// Number of passing sequences merged into the candidate.
    pub merged: usize,
    pub outcome: IterationOutcome,
}

/// Per-iteration trace of a run, for diagnostics and replay checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationTrace {
    records: Vec<IterationRecord>,
}

impl GenerationTrace {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
