pub mod manifest;
pub mod parse;
pub mod sequence;
pub mod statement;
pub mod types;

pub use sequence::{Sequence, SequenceError};
pub use statement::{Statement, VarRef};
pub use types::{CallableOperation, OperationId, OperationKind, Parameter, PrimitiveValue, TypeRef};
