use rand_chacha::ChaCha8Rng;
use tessera_ir::{CallableOperation, OperationKind, Sequence, Statement, TypeRef, VarRef};

use crate::error::{GenerationError, SynthesisError};
use crate::synth::{ValueRef, ValueSynthesizer};

/// Build a candidate: the sampled sequences concatenated in order, followed
/// by a call to `op` with every slot bound by `synthesizer`.
///
/// Fresh values become literal statements placed before the call. All
/// handles point backwards by construction; a synthesizer that hands out a
/// handle outside the accumulated prefix, or of the wrong type, fails the
/// candidate.
pub fn extend<S: ValueSynthesizer + ?Sized>(
    op: &CallableOperation,
    sampled: &[&Sequence],
    synthesizer: &mut S,
    rng: &mut ChaCha8Rng,
) -> Result<Sequence, GenerationError> {
    let mut candidate = Sequence::new();
    for seq in sampled {
        candidate.append_sequence(seq);
    }

    let receiver = if op.kind.has_receiver() {
        let declared = TypeRef::object(&op.id.owner);
        Some(bind_value(&declared, &mut candidate, synthesizer, rng)?)
    } else {
        None
    };

    let mut args = Vec::with_capacity(op.params.len());
    for param in &op.params {
        args.push(bind_value(&param.declared, &mut candidate, synthesizer, rng)?);
    }

    let op_id = op.id.clone();
    let statement = match (op.kind, receiver) {
        (OperationKind::Constructor, _) => Statement::Constructor { op: op_id, args },
        (OperationKind::Function, _) => Statement::Function {
            op: op_id,
            args,
            returns: op.returns.clone(),
        },
        (OperationKind::Method, Some(receiver)) => Statement::Method {
            op: op_id,
            receiver,
            args,
            returns: op.returns.clone(),
        },
        (OperationKind::Field, Some(receiver)) => Statement::Field {
            op: op_id,
            receiver,
            returns: op.returns.clone(),
        },
        (OperationKind::Method | OperationKind::Field, None) => {
            return Err(SynthesisError::NoCompatibleValue {
                declared: TypeRef::object(&op.id.owner),
            }
            .into())
        }
    };

    candidate.push(statement).map_err(SynthesisError::from)?;
    Ok(candidate)
}

fn bind_value<S: ValueSynthesizer + ?Sized>(
    declared: &TypeRef,
    candidate: &mut Sequence,
    synthesizer: &mut S,
    rng: &mut ChaCha8Rng,
) -> Result<VarRef, SynthesisError> {
    match synthesizer.synthesize(declared, candidate, rng)? {
        ValueRef::Fresh(value) => {
            let produced = value.type_ref();
            if !declared.accepts(&produced) {
                return Err(SynthesisError::FreshTypeMismatch {
                    declared: declared.clone(),
                    produced,
                });
            }
            Ok(candidate.push(Statement::Literal { value })?)
        }
        ValueRef::Reuse(reference) => {
            let produced = candidate
                .produced_type(reference)
                .ok_or(SynthesisError::DanglingReference {
                    reference,
                    len: candidate.len(),
                })?;
            if !declared.accepts(&produced) {
                return Err(SynthesisError::IncompatibleReuse {
                    reference,
                    declared: declared.clone(),
                    produced,
                });
            }
            Ok(reference)
        }
    }
}
