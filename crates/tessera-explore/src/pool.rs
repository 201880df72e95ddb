//! Accepted sequences, split into passing and failing partitions.
//!
//! Both partitions are append-only. A fingerprint index spans both so a
//! candidate can be checked for structural duplicates in one lookup;
//! fingerprint collisions fall back to full structural comparison.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tessera_ir::Sequence;

use crate::error::PoolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Passing,
    Failing,
}

#[derive(Debug, Default)]
pub struct SequencePool {
    passing: Vec<Sequence>,
    failing: Vec<Sequence>,
    index: HashMap<u64, Vec<(Partition, usize)>>,
}

impl SequencePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition holding a sequence structurally equal to `candidate`.
    pub fn lookup(&self, candidate: &Sequence) -> Option<Partition> {
        let bucket = self.index.get(&candidate.fingerprint())?;
        bucket
            .iter()
            .find(|(partition, position)| self.get(*partition, *position) == Some(candidate))
            .map(|(partition, _)| *partition)
    }

    /// Whether `candidate` equals any accepted sequence, in either partition.
    pub fn is_duplicate(&self, candidate: &Sequence) -> bool {
        self.lookup(candidate).is_some()
    }

    /// Move `sequence` into `partition`.
    ///
    /// Accepting a duplicate means the caller skipped the duplicate check;
    /// that is reported rather than silently breaking disjointness.
    pub fn accept(&mut self, sequence: Sequence, partition: Partition) -> Result<(), PoolError> {
        let fingerprint = sequence.fingerprint();
        if self.is_duplicate(&sequence) {
            return Err(PoolError::AlreadyAccepted { fingerprint });
        }

        let target = match partition {
            Partition::Passing => &mut self.passing,
            Partition::Failing => &mut self.failing,
        };
        target.push(sequence);
        let position = target.len() - 1;

        self.index
            .entry(fingerprint)
            .or_default()
            .push((partition, position));
        Ok(())
    }

    fn get(&self, partition: Partition, position: usize) -> Option<&Sequence> {
        match partition {
            Partition::Passing => self.passing.get(position),
            Partition::Failing => self.failing.get(position),
        }
    }

    pub fn passing(&self) -> &[Sequence] {
        &self.passing
    }

    pub fn failing(&self) -> &[Sequence] {
        &self.failing
    }

    pub fn len(&self) -> usize {
        self.passing.len() + self.failing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> (Vec<Sequence>, Vec<Sequence>) {
        (self.passing, self.failing)
    }
}
