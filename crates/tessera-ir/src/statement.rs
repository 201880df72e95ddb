use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{OperationId, PrimitiveValue, TypeRef};

/// Return-value handle: position of the producing statement in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarRef(pub usize);

impl VarRef {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn shifted(self, offset: usize) -> Self {
        VarRef(self.0 + offset)
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}", self.0)
    }
}

/// One step of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Literal {
        value: PrimitiveValue,
    },
    Constructor {
        op: OperationId,
        args: Vec<VarRef>,
    },
    Method {
        op: OperationId,
        receiver: VarRef,
        args: Vec<VarRef>,
        returns: TypeRef,
    },
    Function {
        op: OperationId,
        args: Vec<VarRef>,
        returns: TypeRef,
    },
    Field {
        op: OperationId,
        receiver: VarRef,
        returns: TypeRef,
    },
}

impl Statement {
    /// Type of the value this statement makes available to later statements.
    pub fn produced_type(&self) -> TypeRef {
        match self {
            Statement::Literal { value } => value.type_ref(),
            Statement::Constructor { op, .. } => TypeRef::object(&op.owner),
            Statement::Method { returns, .. }
            | Statement::Function { returns, .. }
            | Statement::Field { returns, .. } => returns.clone(),
        }
    }

    /// The invoked operation, if this is not a literal.
    pub fn operation(&self) -> Option<&OperationId> {
        match self {
            Statement::Literal { .. } => None,
            Statement::Constructor { op, .. }
            | Statement::Method { op, .. }
            | Statement::Function { op, .. }
            | Statement::Field { op, .. } => Some(op),
        }
    }

    /// Receiver (if any) followed by arguments, in binding order.
    pub fn references(&self) -> Vec<VarRef> {
        match self {
            Statement::Literal { .. } => Vec::new(),
            Statement::Constructor { args, .. } | Statement::Function { args, .. } => args.clone(),
            Statement::Method { receiver, args, .. } => {
                let mut refs = Vec::with_capacity(args.len() + 1);
                refs.push(*receiver);
                refs.extend_from_slice(args);
                refs
            }
            Statement::Field { receiver, .. } => vec![*receiver],
        }
    }

    /// Copy of this statement with every handle moved up by `offset`.
    pub(crate) fn shifted(&self, offset: usize) -> Statement {
        let shift = |args: &[VarRef]| args.iter().map(|r| r.shifted(offset)).collect();
        match self {
            Statement::Literal { value } => Statement::Literal {
                value: value.clone(),
            },
            Statement::Constructor { op, args } => Statement::Constructor {
                op: op.clone(),
                args: shift(args),
            },
            Statement::Method {
                op,
                receiver,
                args,
                returns,
            } => Statement::Method {
                op: op.clone(),
                receiver: receiver.shifted(offset),
                args: shift(args),
                returns: returns.clone(),
            },
            Statement::Function { op, args, returns } => Statement::Function {
                op: op.clone(),
                args: shift(args),
                returns: returns.clone(),
            },
            Statement::Field {
                op,
                receiver,
                returns,
            } => Statement::Field {
                op: op.clone(),
                receiver: receiver.shifted(offset),
                returns: returns.clone(),
            },
        }
    }
}

fn join(args: &[VarRef]) -> String {
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Literal { value } => write!(f, "{value}"),
            Statement::Constructor { op, args } => write!(f, "{}({})", op.owner, join(args)),
            Statement::Method {
                op, receiver, args, ..
            } => write!(f, "{receiver}.{}({})", op.name, join(args)),
            Statement::Function { op, args, .. } => {
                write!(f, "{}.{}({})", op.owner, op.name, join(args))
            }
            Statement::Field { op, receiver, .. } => write!(f, "{receiver}.{}", op.name),
        }
    }
}
