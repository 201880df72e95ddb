use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tessera_ir::{CallableOperation, OperationKind, TypeRef};

use crate::error::{DiscoveryError, GenerationError};

/// Pick the operation to call next.
///
/// A uniformly chosen catalog entry fixes the owning context; the result is
/// drawn uniformly from that owner's public operations.
pub fn select_operation<'a>(
    operations: &'a [CallableOperation],
    rng: &mut ChaCha8Rng,
) -> Result<&'a CallableOperation, GenerationError> {
    let anchor = operations
        .choose(rng)
        .ok_or(GenerationError::NoPublicOperation { owner: None })?;
    let owner = &anchor.id.owner;

    let mut public = Vec::new();
    for op in operations.iter().filter(|op| op.id.owner == *owner) {
        inspect(op)?;
        if op.is_public() {
            public.push(op);
        }
    }

    public
        .choose(rng)
        .copied()
        .ok_or_else(|| GenerationError::NoPublicOperation {
            owner: Some(owner.clone()),
        })
}

/// Reject descriptors that break their kind's shape.
fn inspect(op: &CallableOperation) -> Result<(), DiscoveryError> {
    let malformed = |reason: &str| DiscoveryError::Malformed {
        target: op.id.to_string(),
        reason: reason.to_string(),
    };

    if op.id.name.is_empty() {
        return Err(malformed("empty operation name"));
    }
    match op.kind {
        OperationKind::Constructor if op.returns != TypeRef::object(&op.id.owner) => {
            Err(malformed("constructor must produce its owner type"))
        }
        OperationKind::Field if !op.params.is_empty() => Err(malformed("field read takes no parameters")),
        OperationKind::Field if op.returns == TypeRef::None => Err(malformed("field has no type")),
        _ => Ok(()),
    }
}
