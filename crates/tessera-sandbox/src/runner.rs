//! Runs whole sequences against a module under test.
//!
//! Operations are bound to exports by name: module-level functions export
//! under their bare name, type members as `Owner::name`. Object handles
//! cross the boundary as `i32`. Every sequence runs in a fresh instance and
//! stops at the first failing statement.

use std::collections::HashMap;

use tessera_ir::{CallableOperation, OperationId, OperationKind, PrimitiveValue, Sequence, Statement, TypeRef};
use wasmtime::{Val, ValType};

use crate::config::SandboxConfig;
use crate::sandbox::{ExportSignature, LoadedModule, Sandbox, SandboxError};

/// Export name an operation is bound to.
pub fn export_name(op: &CallableOperation) -> String {
    match op.kind {
        OperationKind::Function => op.id.name.clone(),
        _ => format!("{}::{}", op.id.owner, op.id.name),
    }
}

#[derive(Debug, Clone)]
pub struct ExportBinding {
    pub export: String,
    pub signature: ExportSignature,
}

/// Why a sequence stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The code under test trapped (`unreachable`, division by zero, ...).
    Trap,
    /// A call ran out of fuel.
    FuelExhausted,
    /// The statement could not be run at all: unbound operation, argument
    /// with no WASM representation, or a failed instantiation.
    Unexecutable,
}

#[derive(Debug, Clone)]
pub struct StatementFailure {
    /// Position of the failing statement; None if instantiation failed.
    pub position: Option<usize>,
    pub kind: FailureKind,
    pub message: String,
}

/// Result of running one sequence.
#[derive(Debug, Clone)]
pub struct SequenceOutcome {
    pub statements_run: usize,
    pub fuel_consumed: u64,
    pub failure: Option<StatementFailure>,
}

impl SequenceOutcome {
    pub fn completed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Value produced by an earlier statement.
#[derive(Debug, Clone)]
enum Slot {
    Host(PrimitiveValue),
    Wasm(Val),
    Void,
}

enum Num {
    Int(i64),
    Float(f64),
}

/// A sandbox, a module, and the operation bindings validated against it.
pub struct SequenceRunner {
    sandbox: Sandbox,
    module: LoadedModule,
    bindings: HashMap<OperationId, ExportBinding>,
}

impl SequenceRunner {
    /// Load `wasm_bytes` and bind every operation to its export.
    ///
    /// Fails if an export is missing or its signature cannot carry the
    /// operation's declared types.
    pub fn new(
        config: &SandboxConfig,
        wasm_bytes: &[u8],
        operations: &[CallableOperation],
    ) -> Result<Self, SandboxError> {
        let sandbox = Sandbox::new(config)?;
        let module = sandbox.load_module(wasm_bytes)?;
        let bindings = bind_operations(&module, operations)?;
        Ok(Self {
            sandbox,
            module,
            bindings,
        })
    }

    pub fn binding(&self, op: &OperationId) -> Option<&ExportBinding> {
        self.bindings.get(op)
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    /// Run `sequence` in a fresh instance.
    pub fn run(&self, sequence: &Sequence) -> SequenceOutcome {
        let mut outcome = SequenceOutcome {
            statements_run: 0,
            fuel_consumed: 0,
            failure: None,
        };

        let mut instance = match self.sandbox.instantiate(&self.module) {
            Ok(instance) => instance,
            Err(e) => {
                outcome.failure = Some(StatementFailure {
                    position: None,
                    kind: FailureKind::Unexecutable,
                    message: format!("instantiation failed: {e}"),
                });
                return outcome;
            }
        };
        let fuel_budget = self.sandbox.config().fuel_per_call;

        let mut slots: Vec<Slot> = Vec::with_capacity(sequence.len());
        for (position, statement) in sequence.statements().iter().enumerate() {
            let fail = |kind, message: String| StatementFailure {
                position: Some(position),
                kind,
                message,
            };

            let Some(op) = statement.operation() else {
                if let Statement::Literal { value } = statement {
                    slots.push(Slot::Host(value.clone()));
                }
                outcome.statements_run += 1;
                continue;
            };

            let Some(binding) = self.bindings.get(op) else {
                outcome.failure = Some(fail(
                    FailureKind::Unexecutable,
                    format!("no export bound for {op}"),
                ));
                return outcome;
            };

            let mut args = Vec::with_capacity(binding.signature.params.len());
            for (reference, target) in statement
                .references()
                .iter()
                .zip(binding.signature.params.iter())
            {
                match slots.get(reference.index()).and_then(|s| coerce(s, target)) {
                    Some(val) => args.push(val),
                    None => {
                        outcome.failure = Some(fail(
                            FailureKind::Unexecutable,
                            format!("argument {reference} of {op} does not fit {}", describe(target)),
                        ));
                        return outcome;
                    }
                }
            }

            let result = instance.call_func(&binding.export, &args);
            if let (Some(budget), Some(remaining)) = (fuel_budget, instance.remaining_fuel()) {
                outcome.fuel_consumed += budget.saturating_sub(remaining);
            }

            match result {
                Ok(values) => {
                    slots.push(values.first().cloned().map(Slot::Wasm).unwrap_or(Slot::Void));
                    outcome.statements_run += 1;
                }
                Err(SandboxError::FuelExhausted) => {
                    outcome.failure = Some(fail(
                        FailureKind::FuelExhausted,
                        format!("{op} exhausted its fuel budget"),
                    ));
                    return outcome;
                }
                Err(e) => {
                    outcome.failure = Some(fail(FailureKind::Trap, format!("{op} trapped: {e}")));
                    return outcome;
                }
            }
        }

        outcome
    }
}

/// Validate every operation against the module's exports.
pub fn bind_operations(
    module: &LoadedModule,
    operations: &[CallableOperation],
) -> Result<HashMap<OperationId, ExportBinding>, SandboxError> {
    let mut bindings = HashMap::new();

    for op in operations {
        let export = export_name(op);
        let signature = module.export_signature(&export)?;
        let mismatch = |details: String| SandboxError::SignatureMismatch {
            name: export.clone(),
            operation: op.id.to_string(),
            details,
        };

        let declared: Vec<TypeRef> = op
            .receiver_type()
            .into_iter()
            .chain(op.params.iter().map(|p| p.declared.clone()))
            .collect();

        if signature.params.len() != declared.len() {
            return Err(mismatch(format!(
                "expected {} parameters, export has {}",
                declared.len(),
                signature.params.len()
            )));
        }
        for (ty, val_ty) in declared.iter().zip(signature.params.iter()) {
            check_representable(op, ty)?;
            if !carries(ty, val_ty) {
                return Err(mismatch(format!("{ty} cannot be passed as {}", describe(val_ty))));
            }
        }

        match (&op.returns, signature.results.as_slice()) {
            (TypeRef::None, []) => {}
            (TypeRef::None, results) => {
                return Err(mismatch(format!("expected no results, export has {}", results.len())));
            }
            (returns, [val_ty]) => {
                check_representable(op, returns)?;
                if !carries(returns, val_ty) {
                    return Err(mismatch(format!("{returns} cannot be read from {}", describe(val_ty))));
                }
            }
            (_, results) => {
                return Err(mismatch(format!("expected one result, export has {}", results.len())));
            }
        }

        bindings.insert(op.id.clone(), ExportBinding { export, signature });
    }

    Ok(bindings)
}

fn check_representable(op: &CallableOperation, ty: &TypeRef) -> Result<(), SandboxError> {
    match ty {
        TypeRef::Int | TypeRef::Float | TypeRef::Bool | TypeRef::Object(_) => Ok(()),
        TypeRef::Str | TypeRef::Any | TypeRef::None => Err(SandboxError::UnsupportedType {
            operation: op.id.to_string(),
            type_name: ty.to_string(),
        }),
    }
}

/// Whether a value of declared type `ty` travels through `val_ty`.
fn carries(ty: &TypeRef, val_ty: &ValType) -> bool {
    match ty {
        TypeRef::Object(_) | TypeRef::Bool => matches!(val_ty, ValType::I32),
        TypeRef::Int | TypeRef::Float => is_numeric(val_ty),
        _ => false,
    }
}

fn is_numeric(val_ty: &ValType) -> bool {
    matches!(val_ty, ValType::I32 | ValType::I64 | ValType::F32 | ValType::F64)
}

fn describe(val_ty: &ValType) -> &'static str {
    match val_ty {
        ValType::I32 => "i32",
        ValType::I64 => "i64",
        ValType::F32 => "f32",
        ValType::F64 => "f64",
        _ => "non-numeric",
    }
}

fn coerce(slot: &Slot, target: &ValType) -> Option<Val> {
    let num = match slot {
        Slot::Host(PrimitiveValue::Int(i)) => Num::Int(*i),
        Slot::Host(PrimitiveValue::Bool(b)) => Num::Int(i64::from(*b)),
        Slot::Host(PrimitiveValue::Float(x)) => Num::Float(*x),
        Slot::Host(PrimitiveValue::Str(_)) | Slot::Void => return None,
        Slot::Wasm(Val::I32(v)) => Num::Int(i64::from(*v)),
        Slot::Wasm(Val::I64(v)) => Num::Int(*v),
        Slot::Wasm(Val::F32(bits)) => Num::Float(f64::from(f32::from_bits(*bits))),
        Slot::Wasm(Val::F64(bits)) => Num::Float(f64::from_bits(*bits)),
        Slot::Wasm(_) => return None,
    };

    match (num, target) {
        (Num::Int(i), ValType::I32) => i32::try_from(i).ok().map(Val::I32),
        (Num::Int(i), ValType::I64) => Some(Val::I64(i)),
        (Num::Int(i), ValType::F32) => {
            let x = i as f32;
            (x as i64 == i).then(|| Val::F32(x.to_bits()))
        }
        (Num::Int(i), ValType::F64) => {
            let x = i as f64;
            (x as i64 == i).then(|| Val::F64(x.to_bits()))
        }
        (Num::Float(x), ValType::I32) => integral(x, f64::from(i32::MIN), f64::from(i32::MAX))
            .map(|x| Val::I32(x as i32)),
        // i64::MAX as f64 rounds up to 2^63, which is out of range.
        (Num::Float(x), ValType::I64) => integral(x, i64::MIN as f64, i64::MAX as f64)
            .filter(|x| *x < i64::MAX as f64)
            .map(|x| Val::I64(x as i64)),
        (Num::Float(x), ValType::F32) => {
            let narrowed = x as f32;
            (narrowed.is_finite() || !x.is_finite()).then(|| Val::F32(narrowed.to_bits()))
        }
        (Num::Float(x), ValType::F64) => Some(Val::F64(x.to_bits())),
        _ => None,
    }
}

/// `x` if it is a whole number within `[min, max]`.
fn integral(x: f64, min: f64, max: f64) -> Option<f64> {
    (x.is_finite() && x.fract() == 0.0 && x >= min && x <= max).then_some(x)
}
