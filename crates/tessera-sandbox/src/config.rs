/// Sandbox configuration: memory cap and per-call fuel budget.
use serde::{Deserialize, Serialize};

/// Configuration for the WASM sandbox a sequence runs in.
///
/// The sandbox links no imports (no filesystem, network, or clock). Fuel
/// bounds the CPU time of a single call so a looping export cannot stall
/// generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Maximum linear memory in bytes (default: 64 MB).
    pub memory_limit_bytes: u64,
    /// Fuel budget per export call. None = unlimited (not recommended).
    pub fuel_per_call: Option<u64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 64 * 1024 * 1024,
            fuel_per_call: Some(1_000_000),
        }
    }
}
