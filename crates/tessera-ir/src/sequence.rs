//! Call sequences ("test cases").
//!
//! A sequence owns its statements. Every handle a statement uses refers to
//! an earlier statement of the same sequence; `push` refuses anything else,
//! so a sequence is well-formed by construction.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::statement::{Statement, VarRef};
use crate::types::TypeRef;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequenceError {
    #[error("statement {position} references {reference}, which is not an earlier statement")]
    ForwardReference { position: usize, reference: VarRef },

    #[error("statement {position} references {reference}, which produces no value")]
    VoidReference { position: usize, reference: VarRef },
}

/// Ordered list of statements. Equality and hashing are structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    statements: Vec<Statement>,
}

impl Sequence {
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get(&self, handle: VarRef) -> Option<&Statement> {
        self.statements.get(handle.index())
    }

    /// Append a statement, returning its handle.
    ///
    /// Fails if the statement refers to itself, to a later position, or to a
    /// statement that produces no value.
    pub fn push(&mut self, statement: Statement) -> Result<VarRef, SequenceError> {
        let position = self.statements.len();
        check_references(&self.statements, position, &statement)?;
        self.statements.push(statement);
        Ok(VarRef(position))
    }

    /// Append all of `other`'s statements, renumbering its handles so they
    /// keep pointing at the copied statements.
    pub fn append_sequence(&mut self, other: &Sequence) {
        let offset = self.statements.len();
        self.statements
            .extend(other.statements.iter().map(|s| s.shifted(offset)));
    }

    /// Type produced by the statement at `handle`, if it exists.
    pub fn produced_type(&self, handle: VarRef) -> Option<TypeRef> {
        self.get(handle).map(Statement::produced_type)
    }

    /// Handles whose produced value may be bound to a slot of type `declared`.
    pub fn compatible_handles(&self, declared: &TypeRef) -> Vec<VarRef> {
        self.statements
            .iter()
            .enumerate()
            .filter(|(_, s)| declared.accepts(&s.produced_type()))
            .map(|(i, _)| VarRef(i))
            .collect()
    }

    /// Re-check the no-forward-reference invariant over the whole sequence.
    pub fn validate(&self) -> Result<(), SequenceError> {
        for (position, statement) in self.statements.iter().enumerate() {
            check_references(&self.statements[..position], position, statement)?;
        }
        Ok(())
    }

    /// Stable structural hash, independent of object identity.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn check_references(
    earlier: &[Statement],
    position: usize,
    statement: &Statement,
) -> Result<(), SequenceError> {
    for reference in statement.references() {
        let Some(target) = earlier.get(reference.index()) else {
            return Err(SequenceError::ForwardReference {
                position,
                reference,
            });
        };
        if target.produced_type() == TypeRef::None {
            return Err(SequenceError::VoidReference {
                position,
                reference,
            });
        }
    }
    Ok(())
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if statement.produced_type() == TypeRef::None {
                writeln!(f, "{statement}")?;
            } else {
                writeln!(f, "{} = {statement}", VarRef(i))?;
            }
        }
        Ok(())
    }
}
