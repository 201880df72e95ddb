//! Run orchestration: discovery, the generation loop, and the report.

use serde::{Deserialize, Serialize};
use tessera_explore::catalog::{discover_all, Catalog, ManifestCatalog};
use tessera_explore::error::LoopError;
use tessera_explore::executor::{SandboxExecutor, SequenceExecutor};
use tessera_explore::generation::{Clock, GenerationLoop, GenerationStats, GenerationTrace, SystemClock};
use tessera_explore::synth::{RandomValueSynthesizer, ValueSynthesizer};
use tessera_ir::parse::{parse_manifest, ParseError};
use tessera_ir::Sequence;
use tessera_sandbox::sandbox::SandboxError;
use tracing::info;

use crate::config::{ConfigError, RunConfig};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("manifest parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("generation loop failed: {0}")]
    Loop(#[from] LoopError),

    #[error("{what} is {size} bytes, limit is {limit}")]
    InputTooLarge { what: &'static str, size: u64, limit: u64 },
}

/// A target the catalog could not enumerate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryFailure {
    pub target: String,
    pub error: String,
}

/// Outcome of a run, handed to downstream consumers as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub passing: Vec<Sequence>,
    pub failing: Vec<Sequence>,
    pub iterations: u64,
    pub stats: GenerationStats,
    pub discovery_failures: Vec<DiscoveryFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<GenerationTrace>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Discover `targets`, then generate until `config.time_limit_secs` elapses.
///
/// Targets that fail discovery are listed in the report; the run continues
/// with whatever the other targets contributed.
pub fn run_generation<C, S, E>(
    targets: &[String],
    catalog: &C,
    synthesizer: S,
    executor: E,
    config: &RunConfig,
) -> Result<RunReport, RunError>
where
    C: Catalog + ?Sized,
    S: ValueSynthesizer,
    E: SequenceExecutor,
{
    run_generation_with_clock(targets, catalog, synthesizer, executor, SystemClock::new(), config)
}

/// `run_generation` with an explicit time source.
pub fn run_generation_with_clock<C, S, E, K>(
    targets: &[String],
    catalog: &C,
    synthesizer: S,
    executor: E,
    clock: K,
    config: &RunConfig,
) -> Result<RunReport, RunError>
where
    C: Catalog + ?Sized,
    S: ValueSynthesizer,
    E: SequenceExecutor,
    K: Clock,
{
    config.validate()?;

    let discovery = discover_all(catalog, targets);
    info!(
        targets = targets.len(),
        operations = discovery.operations.len(),
        failed_targets = discovery.failures.len(),
        "discovery complete"
    );

    let result = GenerationLoop::new(
        &discovery.operations,
        synthesizer,
        executor,
        clock,
        &config.to_generation_config(),
    )
    .run()?;

    Ok(RunReport {
        iterations: result.stats.iterations,
        passing: result.passing,
        failing: result.failing,
        stats: result.stats,
        discovery_failures: discovery
            .failures
            .into_iter()
            .map(|(target, error)| DiscoveryFailure {
                target,
                error: error.to_string(),
            })
            .collect(),
        trace: result.trace,
    })
}

/// Generate sequences for a WASM module described by a JSON manifest.
///
/// An empty `targets` list means every module in the manifest. Every
/// discovered operation must be bound to an export of the module, or the
/// run fails before generation starts.
pub fn run_wasm(
    manifest_json: &str,
    wasm_bytes: &[u8],
    targets: &[String],
    config: &RunConfig,
) -> Result<RunReport, RunError> {
    config.validate()?;
    check_size("manifest", manifest_json.len(), config.inputs.max_manifest_json_bytes)?;
    check_size("WASM module", wasm_bytes.len(), config.inputs.max_wasm_module_bytes)?;

    let catalog = ManifestCatalog::new(parse_manifest(manifest_json)?);
    let targets = if targets.is_empty() {
        catalog.targets()
    } else {
        targets.to_vec()
    };

    let operations = discover_all(&catalog, &targets).operations;
    let executor = SandboxExecutor::new(&config.sandbox, wasm_bytes, &operations)?;
    let synthesizer = RandomValueSynthesizer::new(config.synthesis.clone());

    run_generation(&targets, &catalog, synthesizer, executor, config)
}

fn check_size(what: &'static str, size: usize, limit: u64) -> Result<(), RunError> {
    let size = size as u64;
    if size > limit {
        return Err(RunError::InputTooLarge { what, size, limit });
    }
    Ok(())
}
