use serde::{Deserialize, Serialize};
use tessera_ir::{SequenceError, TypeRef, VarRef};

/// A catalog target could not be enumerated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("unknown target '{target}'")]
    UnknownTarget { target: String },

    #[error("'{target}' is malformed: {reason}")]
    Malformed { target: String, reason: String },
}

/// No value could be bound to a parameter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("no value compatible with '{declared}' is available")]
    NoCompatibleValue { declared: TypeRef },

    #[error("values of type '{declared}' cannot be synthesized")]
    Unsupported { declared: TypeRef },

    #[error("range [{min}, {max}] for '{declared}' cannot be sampled")]
    InvalidRange {
        declared: TypeRef,
        min: String,
        max: String,
    },

    #[error("fresh value of type '{produced}' does not fit '{declared}'")]
    FreshTypeMismatch { declared: TypeRef, produced: TypeRef },

    #[error("{reference} does not exist in a sequence of {len} statements")]
    DanglingReference { reference: VarRef, len: usize },

    #[error("{reference} produces '{produced}', which does not fit '{declared}'")]
    IncompatibleReuse {
        reference: VarRef,
        declared: TypeRef,
        produced: TypeRef,
    },

    #[error("sequence invariant violated: {0}")]
    Sequence(#[from] SequenceError),
}

/// Failure to build one candidate sequence. Always recoverable: the loop
/// logs it and moves on to the next iteration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("{} has no public operations", .owner.as_deref().unwrap_or("catalog"))]
    NoPublicOperation { owner: Option<String> },

    #[error("value synthesis error: {0}")]
    ValueSynthesis(#[from] SynthesisError),
}

/// Coarse classification of `GenerationError`, for stats and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Discovery,
    NoPublicOperation,
    ValueSynthesis,
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            GenerationError::Discovery(_) => GenerationErrorKind::Discovery,
            GenerationError::NoPublicOperation { .. } => GenerationErrorKind::NoPublicOperation,
            GenerationError::ValueSynthesis(_) => GenerationErrorKind::ValueSynthesis,
        }
    }
}

/// Pool bookkeeping is corrupted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoolError {
    #[error("sequence {fingerprint:016x} was already accepted")]
    AlreadyAccepted { fingerprint: u64 },
}

/// Fatal loop failure. Stops the run immediately.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoopError {
    #[error("pool corrupted: {0}")]
    PoolCorrupted(#[from] PoolError),
}
