use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{CallableOperation, Parameter, TypeRef};

/// Explicit registration of an API surface: every module the generator may
/// target, with its free functions and types.
///
/// Maps are ordered so that discovery is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub modules: BTreeMap<String, ModuleDef>,
}

// ── Modules ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDef {
    #[serde(default)]
    pub functions: Vec<MemberDef>,
    #[serde(default)]
    pub types: BTreeMap<String, TypeDef>,
}

// ── Types and members ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(default)]
    pub constructors: Vec<MemberDef>,
    #[serde(default)]
    pub methods: Vec<MemberDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default = "void")]
    pub returns: TypeRef,
    #[serde(default = "visible")]
    pub public: bool,
    /// Meta artifact, never offered to the generator.
    #[serde(default)]
    pub internal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub declared: TypeRef,
    #[serde(default = "visible")]
    pub public: bool,
    #[serde(default)]
    pub internal: bool,
}

fn void() -> TypeRef {
    TypeRef::None
}

fn visible() -> bool {
    true
}

/// An operation as declared in the manifest, before visibility filtering.
#[derive(Debug, Clone)]
pub struct DeclaredMember {
    pub operation: CallableOperation,
    pub internal: bool,
}

impl ModuleDef {
    /// Every declared operation of the module: free functions first, then
    /// each type's constructors, methods, and fields.
    pub fn members(&self, module: &str) -> Vec<DeclaredMember> {
        let mut members = Vec::new();

        for f in &self.functions {
            members.push(DeclaredMember {
                operation: CallableOperation::function(
                    module,
                    &f.name,
                    f.params.clone(),
                    f.returns.clone(),
                )
                .with_public(f.public),
                internal: f.internal,
            });
        }

        for (type_name, def) in &self.types {
            for c in &def.constructors {
                members.push(DeclaredMember {
                    operation: CallableOperation::constructor(type_name, &c.name, c.params.clone())
                        .with_public(c.public),
                    internal: c.internal,
                });
            }
            for m in &def.methods {
                members.push(DeclaredMember {
                    operation: CallableOperation::method(
                        type_name,
                        &m.name,
                        m.params.clone(),
                        m.returns.clone(),
                    )
                    .with_public(m.public),
                    internal: m.internal,
                });
            }
            for field in &def.fields {
                members.push(DeclaredMember {
                    operation: CallableOperation::field(type_name, &field.name, field.declared.clone())
                        .with_public(field.public),
                    internal: field.internal,
                });
            }
        }

        members
    }
}
