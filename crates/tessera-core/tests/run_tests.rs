use std::time::Duration;

use tessera_core::config::RunConfig;
use tessera_core::run::{run_generation, run_generation_with_clock, run_wasm, RunError, RunReport};
use tessera_explore::catalog::{ManifestCatalog, StaticCatalog};
use tessera_explore::executor::AcceptAllExecutor;
use tessera_explore::generation::TickClock;
use tessera_explore::synth::RandomValueSynthesizer;
use tessera_ir::parse::parse_manifest;
use tessera_ir::{CallableOperation, OperationId, Parameter, TypeRef};

const MANIFEST: &str = include_str!("../../tessera-ir/tests/fixtures/counter_api.json");

fn counter_wasm() -> Vec<u8> {
    wat::parse_str(include_str!("../../tessera-sandbox/tests/fixtures/counter.wat")).unwrap()
}

fn fixture_config() -> RunConfig {
    RunConfig::from_json(include_str!("fixtures/run_config.json")).unwrap()
}

fn ticked(iterations: u32) -> RunConfig {
    RunConfig {
        time_limit_secs: (f64::from(iterations) + 0.5) / 1000.0,
        record_trace: true,
        ..Default::default()
    }
}

fn tick() -> TickClock {
    TickClock::new(Duration::from_millis(1))
}

#[test]
fn test_fixture_config_parses() {
    let config = fixture_config();
    assert_eq!(config.seed, 7);
    assert_eq!(config.max_sequences_combined, 3);
    assert_eq!(config.synthesis.int_max, 5);
    assert_eq!(config.synthesis.string_max_len, 8);
    assert_eq!(config.sandbox.fuel_per_call, Some(20_000));
    assert_eq!(config.sandbox.memory_limit_bytes, 64 * 1024 * 1024);
}

#[test]
fn test_run_wasm_end_to_end() {
    let report = run_wasm(MANIFEST, &counter_wasm(), &[], &fixture_config()).unwrap();

    assert!(report.iterations > 0);
    assert_eq!(report.iterations, report.stats.iterations);
    assert!(!report.passing.is_empty());
    assert!(!report.failing.is_empty());
    assert!(report.discovery_failures.is_empty());
    assert!(report.trace.is_some());

    let spin = OperationId::new("counter", "spin");
    for seq in &report.passing {
        seq.validate().unwrap();
        assert!(seq.statements().iter().all(|s| s.operation() != Some(&spin)));
    }
}

#[test]
fn test_run_wasm_reports_unknown_target() {
    let targets = vec!["counter".to_string(), "nowhere".to_string()];
    let report = run_wasm(MANIFEST, &counter_wasm(), &targets, &fixture_config()).unwrap();
    assert_eq!(report.discovery_failures.len(), 1);
    assert_eq!(report.discovery_failures[0].target, "nowhere");
    assert!(report.discovery_failures[0].error.contains("unknown target"));
}

#[test]
fn test_run_wasm_rejects_unbound_operation() {
    let wasm = wat::parse_str(r#"(module (func (export "spin")))"#).unwrap();
    let err = run_wasm(MANIFEST, &wasm, &["counter".to_string()], &fixture_config()).unwrap_err();
    assert!(matches!(err, RunError::Sandbox(_)));
}

#[test]
fn test_run_wasm_rejects_bad_manifest() {
    let err = run_wasm("{ not json", &counter_wasm(), &[], &fixture_config()).unwrap_err();
    assert!(matches!(err, RunError::Parse(_)));
}

#[test]
fn test_run_wasm_enforces_input_limits() {
    let mut config = fixture_config();
    config.inputs.max_wasm_module_bytes = 8;
    let err = run_wasm(MANIFEST, &counter_wasm(), &[], &config).unwrap_err();
    assert!(matches!(err, RunError::InputTooLarge { what: "WASM module", .. }));
}

#[test]
fn test_invalid_config_rejected_before_run() {
    let config = RunConfig {
        time_limit_secs: -2.0,
        ..Default::default()
    };
    let catalog = StaticCatalog::new();
    let err = run_generation(&[], &catalog, RandomValueSynthesizer::default(), AcceptAllExecutor, &config)
        .unwrap_err();
    assert!(matches!(err, RunError::Config(_)));
}

#[test]
fn test_run_generation_is_deterministic_with_tick_clock() {
    let catalog = ManifestCatalog::new(parse_manifest(MANIFEST).unwrap());
    let targets = catalog.targets();
    let config = ticked(120);

    let first = run_generation_with_clock(
        &targets,
        &catalog,
        RandomValueSynthesizer::default(),
        AcceptAllExecutor,
        tick(),
        &config,
    )
    .unwrap();
    let second = run_generation_with_clock(
        &targets,
        &catalog,
        RandomValueSynthesizer::default(),
        AcceptAllExecutor,
        tick(),
        &config,
    )
    .unwrap();

    assert_eq!(first.iterations, 120);
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_report_json_round_trip() {
    let catalog = StaticCatalog::new().with_module(
        "counter",
        vec![
            CallableOperation::constructor("Counter", "new", vec![]),
            CallableOperation::method(
                "Counter",
                "add",
                vec![Parameter::new("n", TypeRef::Int)],
                TypeRef::Int,
            ),
        ],
    );
    let report = run_generation_with_clock(
        &["counter".to_string()],
        &catalog,
        RandomValueSynthesizer::default(),
        AcceptAllExecutor,
        tick(),
        &ticked(40),
    )
    .unwrap();

    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["iterations"], 40);
    assert!(value["passing"].as_array().is_some_and(|p| !p.is_empty()));
    assert_eq!(RunReport::from_json(&json).unwrap(), report);
}

#[test]
fn test_trace_omitted_unless_requested() {
    let catalog = StaticCatalog::new().with_module(
        "counter",
        vec![CallableOperation::constructor("Counter", "new", vec![])],
    );
    let mut config = ticked(5);
    config.record_trace = false;
    let report = run_generation_with_clock(
        &["counter".to_string()],
        &catalog,
        RandomValueSynthesizer::default(),
        AcceptAllExecutor,
        tick(),
        &config,
    )
    .unwrap();
    assert!(report.trace.is_none());
    assert!(!report.to_json().unwrap().contains("\"trace\""));
}
