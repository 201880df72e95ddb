//! Operation catalog: the universe of callable operations.
//!
//! Discovery is per target. A target that cannot be enumerated is reported
//! and skipped; the remaining targets still contribute.

use std::collections::{BTreeMap, HashMap, HashSet};

use tessera_ir::manifest::CatalogManifest;
use tessera_ir::{CallableOperation, OperationKind};
use tracing::{debug, warn};

use crate::error::DiscoveryError;

/// Source of callable operations for one target (a module).
///
/// Implementations must exclude non-public members and internal artifacts.
pub trait Catalog {
    fn discover(&self, target: &str) -> Result<Vec<CallableOperation>, DiscoveryError>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn discover(&self, target: &str) -> Result<Vec<CallableOperation>, DiscoveryError> {
        (**self).discover(target)
    }
}

/// Flattened discovery result across all targets.
#[derive(Debug, Default)]
pub struct Discovery {
    pub operations: Vec<CallableOperation>,
    pub failures: Vec<(String, DiscoveryError)>,
}

/// Discover every target in order, flattening operations and dropping
/// repeated identities.
///
/// Operation identities are `owner::name`, so an owner must belong to one
/// target and play one role: module functions or type members. A target
/// whose owners clash with that rule is reported as malformed and
/// contributes nothing. Listing the same target twice is harmless.
pub fn discover_all<C: Catalog + ?Sized>(catalog: &C, targets: &[String]) -> Discovery {
    let mut discovery = Discovery::default();
    let mut seen = HashSet::new();
    let mut owners: HashMap<String, (String, bool)> = HashMap::new();

    for target in targets {
        let claimed = catalog
            .discover(target)
            .and_then(|operations| claim_owners(&mut owners, target, operations));
        match claimed {
            Ok(operations) => {
                debug!(target = %target, count = operations.len(), "discovered operations");
                for op in operations {
                    if seen.insert(op.id.clone()) {
                        discovery.operations.push(op);
                    }
                }
            }
            Err(e) => {
                warn!(target = %target, error = %e, "skipping target");
                discovery.failures.push((target.clone(), e));
            }
        }
    }

    discovery
}

/// Register the owners used by `target`, or reject the whole target.
fn claim_owners(
    owners: &mut HashMap<String, (String, bool)>,
    target: &str,
    operations: Vec<CallableOperation>,
) -> Result<Vec<CallableOperation>, DiscoveryError> {
    let malformed = |reason: String| DiscoveryError::Malformed {
        target: target.to_string(),
        reason,
    };

    let mut local: HashMap<&str, bool> = HashMap::new();
    for op in &operations {
        let is_module = op.kind == OperationKind::Function;
        if let Some(&prev) = local.get(op.id.owner.as_str()) {
            if prev != is_module {
                return Err(malformed(format!(
                    "'{}' is both a module and a type name",
                    op.id.owner
                )));
            }
        }
        local.insert(op.id.owner.as_str(), is_module);
    }

    for (&owner, &is_module) in &local {
        match owners.get(owner) {
            Some((other, _)) if other != target => {
                return Err(malformed(format!("'{owner}' is already declared by '{other}'")));
            }
            Some((_, prev)) if *prev != is_module => {
                return Err(malformed(format!("'{owner}' is both a module and a type name")));
            }
            _ => {}
        }
    }

    for (owner, is_module) in local {
        owners.insert(owner.to_string(), (target.to_string(), is_module));
    }
    Ok(operations)
}

/// Catalog backed by an explicit JSON registration.
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    manifest: CatalogManifest,
}

impl ManifestCatalog {
    pub fn new(manifest: CatalogManifest) -> Self {
        Self { manifest }
    }

    /// All module names, in manifest order.
    pub fn targets(&self) -> Vec<String> {
        self.manifest.modules.keys().cloned().collect()
    }
}

impl Catalog for ManifestCatalog {
    fn discover(&self, target: &str) -> Result<Vec<CallableOperation>, DiscoveryError> {
        let module = self
            .manifest
            .modules
            .get(target)
            .ok_or_else(|| DiscoveryError::UnknownTarget {
                target: target.to_string(),
            })?;

        let mut operations = Vec::new();
        for member in module.members(target) {
            let op = member.operation;
            if op.id.name.is_empty() || op.id.owner.is_empty() {
                return Err(DiscoveryError::Malformed {
                    target: target.to_string(),
                    reason: format!("{:?} member has an empty name", op.kind),
                });
            }
            if member.internal || !op.is_public() {
                continue;
            }
            operations.push(op);
        }

        Ok(operations)
    }
}

/// Catalog registered in code, one operation list per target.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    modules: BTreeMap<String, Vec<CallableOperation>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target. Non-public operations are dropped here.
    pub fn with_module(mut self, name: &str, operations: Vec<CallableOperation>) -> Self {
        self.modules.insert(
            name.to_string(),
            operations.into_iter().filter(|op| op.is_public()).collect(),
        );
        self
    }
}

impl Catalog for StaticCatalog {
    fn discover(&self, target: &str) -> Result<Vec<CallableOperation>, DiscoveryError> {
        self.modules
            .get(target)
            .cloned()
            .ok_or_else(|| DiscoveryError::UnknownTarget {
                target: target.to_string(),
            })
    }
}
