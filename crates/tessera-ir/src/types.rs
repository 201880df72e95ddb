use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Prefix marking a member as implementation-reserved (never public).
pub const RESERVED_MARKER: char = '_';

// ── Types ────────────────────────────────────────────────────────────

/// Declared type of a parameter, field, or result.
///
/// Serialized as a lowercase keyword for primitives (`"int"`, `"str"`, ...)
/// and as the bare type name for objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeRef {
    Int,
    Float,
    Bool,
    Str,
    /// Accepts any produced value except `None`.
    Any,
    /// No value (void result).
    None,
    /// Instance of a named type from the catalog.
    Object(String),
}

impl TypeRef {
    pub fn object(name: &str) -> Self {
        TypeRef::Object(name.to_string())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeRef::Int | TypeRef::Float | TypeRef::Bool | TypeRef::Str
        )
    }

    /// Whether a value produced with type `produced` may be bound to a slot
    /// declared with this type.
    pub fn accepts(&self, produced: &TypeRef) -> bool {
        if *produced == TypeRef::None {
            return false;
        }
        match self {
            TypeRef::Any => true,
            TypeRef::None => false,
            declared => declared == produced,
        }
    }
}

impl From<String> for TypeRef {
    fn from(s: String) -> Self {
        match s.as_str() {
            "int" => TypeRef::Int,
            "float" => TypeRef::Float,
            "bool" => TypeRef::Bool,
            "str" => TypeRef::Str,
            "any" => TypeRef::Any,
            "none" => TypeRef::None,
            _ => TypeRef::Object(s),
        }
    }
}

impl From<TypeRef> for String {
    fn from(t: TypeRef) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Int => write!(f, "int"),
            TypeRef::Float => write!(f, "float"),
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::Str => write!(f, "str"),
            TypeRef::Any => write!(f, "any"),
            TypeRef::None => write!(f, "none"),
            TypeRef::Object(name) => write!(f, "{name}"),
        }
    }
}

// ── Values ───────────────────────────────────────────────────────────

/// A concrete primitive value placed in a sequence as a literal.
///
/// Floats compare and hash by bit pattern so that sequences containing them
/// have a total structural equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PrimitiveValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl PrimitiveValue {
    pub fn type_ref(&self) -> TypeRef {
        match self {
            PrimitiveValue::Int(_) => TypeRef::Int,
            PrimitiveValue::Float(_) => TypeRef::Float,
            PrimitiveValue::Bool(_) => TypeRef::Bool,
            PrimitiveValue::Str(_) => TypeRef::Str,
        }
    }
}

impl PartialEq for PrimitiveValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PrimitiveValue::Int(a), PrimitiveValue::Int(b)) => a == b,
            (PrimitiveValue::Float(a), PrimitiveValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PrimitiveValue::Bool(a), PrimitiveValue::Bool(b)) => a == b,
            (PrimitiveValue::Str(a), PrimitiveValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PrimitiveValue {}

impl Hash for PrimitiveValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PrimitiveValue::Int(i) => i.hash(state),
            PrimitiveValue::Float(x) => x.to_bits().hash(state),
            PrimitiveValue::Bool(b) => b.hash(state),
            PrimitiveValue::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Int(i) => write!(f, "{i}"),
            PrimitiveValue::Float(x) => write!(f, "{x:?}"),
            PrimitiveValue::Bool(b) => write!(f, "{b}"),
            PrimitiveValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

// ── Operations ───────────────────────────────────────────────────────

/// Identity of an operation: owning type (or module) plus member name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId {
    pub owner: String,
    pub name: String,
}

impl OperationId {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Produces a new instance of its owner type.
    Constructor,
    /// Called on a receiver of its owner type.
    Method,
    /// Module-level function; no receiver.
    Function,
    /// Read of a field on a receiver of its owner type.
    Field,
}

impl OperationKind {
    /// Whether the operation takes an implicit receiver of the owner type.
    pub fn has_receiver(self) -> bool {
        matches!(self, OperationKind::Method | OperationKind::Field)
    }
}

/// A formal parameter: name and declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub declared: TypeRef,
}

impl Parameter {
    pub fn new(name: &str, declared: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            declared,
        }
    }
}

/// A discovered, callable member of the API surface. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableOperation {
    pub id: OperationId,
    pub kind: OperationKind,
    /// Formal parameters, excluding the implicit receiver.
    pub params: Vec<Parameter>,
    pub returns: TypeRef,
    pub public: bool,
}

impl CallableOperation {
    pub fn constructor(owner: &str, name: &str, params: Vec<Parameter>) -> Self {
        Self {
            id: OperationId::new(owner, name),
            kind: OperationKind::Constructor,
            params,
            returns: TypeRef::object(owner),
            public: true,
        }
    }

    pub fn method(owner: &str, name: &str, params: Vec<Parameter>, returns: TypeRef) -> Self {
        Self {
            id: OperationId::new(owner, name),
            kind: OperationKind::Method,
            params,
            returns,
            public: true,
        }
    }

    pub fn function(module: &str, name: &str, params: Vec<Parameter>, returns: TypeRef) -> Self {
        Self {
            id: OperationId::new(module, name),
            kind: OperationKind::Function,
            params,
            returns,
            public: true,
        }
    }

    pub fn field(owner: &str, name: &str, declared: TypeRef) -> Self {
        Self {
            id: OperationId::new(owner, name),
            kind: OperationKind::Field,
            params: Vec::new(),
            returns: declared,
            public: true,
        }
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Visible iff flagged public and not named with the reserved marker.
    pub fn is_public(&self) -> bool {
        self.public && !self.id.name.starts_with(RESERVED_MARKER)
    }

    /// Type of the implicit receiver, if the operation has one.
    pub fn receiver_type(&self) -> Option<TypeRef> {
        self.kind
            .has_receiver()
            .then(|| TypeRef::object(&self.id.owner))
    }
}
