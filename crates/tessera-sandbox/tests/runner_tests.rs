use tessera_ir::{CallableOperation, OperationId, Parameter, PrimitiveValue, Sequence, Statement, TypeRef, VarRef};
use tessera_sandbox::config::SandboxConfig;
use tessera_sandbox::runner::{export_name, FailureKind, SequenceRunner};
use tessera_sandbox::sandbox::SandboxError;

fn counter_wasm() -> Vec<u8> {
    wat::parse_str(include_str!("fixtures/counter.wat")).expect("valid WAT")
}

fn counter_operations() -> Vec<CallableOperation> {
    vec![
        CallableOperation::constructor("Counter", "new", vec![]),
        CallableOperation::method(
            "Counter",
            "add",
            vec![Parameter::new("n", TypeRef::Int)],
            TypeRef::Int,
        ),
        CallableOperation::field("Counter", "value", TypeRef::Int),
        CallableOperation::function(
            "counter",
            "checked_div",
            vec![
                Parameter::new("a", TypeRef::Int),
                Parameter::new("b", TypeRef::Int),
            ],
            TypeRef::Int,
        ),
        CallableOperation::function("counter", "spin", vec![], TypeRef::None),
    ]
}

fn runner() -> SequenceRunner {
    SequenceRunner::new(&SandboxConfig::default(), &counter_wasm(), &counter_operations()).unwrap()
}

fn int(i: i64) -> Statement {
    Statement::Literal {
        value: PrimitiveValue::Int(i),
    }
}

fn add(receiver: usize, arg: usize) -> Statement {
    Statement::Method {
        op: OperationId::new("Counter", "add"),
        receiver: VarRef(receiver),
        args: vec![VarRef(arg)],
        returns: TypeRef::Int,
    }
}

fn new_counter() -> Statement {
    Statement::Constructor {
        op: OperationId::new("Counter", "new"),
        args: vec![],
    }
}

#[test]
fn test_export_names() {
    let ops = counter_operations();
    assert_eq!(export_name(&ops[0]), "Counter::new");
    assert_eq!(export_name(&ops[2]), "Counter::value");
    assert_eq!(export_name(&ops[3]), "checked_div");
}

#[test]
fn test_bind_all_operations() {
    let runner = runner();
    assert_eq!(runner.bound_count(), 5);
    let binding = runner.binding(&OperationId::new("Counter", "add")).unwrap();
    assert_eq!(binding.export, "Counter::add");
}

#[test]
fn test_bind_missing_export_fails() {
    let ops = vec![CallableOperation::method("Counter", "missing", vec![], TypeRef::None)];
    let result = SequenceRunner::new(&SandboxConfig::default(), &counter_wasm(), &ops);
    assert!(matches!(result, Err(SandboxError::ExportNotFound { .. })));
}

#[test]
fn test_bind_arity_mismatch_fails() {
    let ops = vec![CallableOperation::method("Counter", "add", vec![], TypeRef::Int)];
    let result = SequenceRunner::new(&SandboxConfig::default(), &counter_wasm(), &ops);
    assert!(matches!(result, Err(SandboxError::SignatureMismatch { .. })));
}

#[test]
fn test_bind_result_mismatch_fails() {
    let ops = vec![CallableOperation::function("counter", "spin", vec![], TypeRef::Int)];
    let result = SequenceRunner::new(&SandboxConfig::default(), &counter_wasm(), &ops);
    assert!(matches!(result, Err(SandboxError::SignatureMismatch { .. })));
}

#[test]
fn test_bind_string_parameter_unsupported() {
    let ops = vec![CallableOperation::method(
        "Counter",
        "add",
        vec![Parameter::new("n", TypeRef::Str)],
        TypeRef::Int,
    )];
    let result = SequenceRunner::new(&SandboxConfig::default(), &counter_wasm(), &ops);
    assert!(matches!(result, Err(SandboxError::UnsupportedType { .. })));
}

#[test]
fn test_run_passing_sequence() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(int(4)).unwrap();
    seq.push(add(0, 1)).unwrap();
    seq.push(add(0, 2)).unwrap();

    let outcome = runner().run(&seq);
    assert!(outcome.completed(), "unexpected failure: {:?}", outcome.failure);
    assert_eq!(outcome.statements_run, 4);
    assert!(outcome.fuel_consumed > 0);
}

#[test]
fn test_run_contract_violation_traps() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(int(-3)).unwrap();
    seq.push(add(0, 1)).unwrap();

    let outcome = runner().run(&seq);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Trap);
    assert_eq!(failure.position, Some(2));
    assert_eq!(outcome.statements_run, 2);
}

#[test]
fn test_run_division_by_zero_traps() {
    let mut seq = Sequence::new();
    seq.push(int(10)).unwrap();
    seq.push(int(0)).unwrap();
    seq.push(Statement::Function {
        op: OperationId::new("counter", "checked_div"),
        args: vec![VarRef(0), VarRef(1)],
        returns: TypeRef::Int,
    })
    .unwrap();

    let outcome = runner().run(&seq);
    assert_eq!(outcome.failure.unwrap().kind, FailureKind::Trap);
}

#[test]
fn test_run_infinite_loop_times_out() {
    let config = SandboxConfig {
        fuel_per_call: Some(5_000),
        ..Default::default()
    };
    let runner = SequenceRunner::new(&config, &counter_wasm(), &counter_operations()).unwrap();

    let mut seq = Sequence::new();
    seq.push(Statement::Function {
        op: OperationId::new("counter", "spin"),
        args: vec![],
        returns: TypeRef::None,
    })
    .unwrap();

    let outcome = runner.run(&seq);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::FuelExhausted);
    assert_eq!(failure.position, Some(0));
}

#[test]
fn test_run_field_read() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(Statement::Field {
        op: OperationId::new("Counter", "value"),
        receiver: VarRef(0),
        returns: TypeRef::Int,
    })
    .unwrap();

    assert!(runner().run(&seq).completed());
}

#[test]
fn test_run_unbound_operation_is_unexecutable() {
    let mut seq = Sequence::new();
    seq.push(Statement::Function {
        op: OperationId::new("counter", "unknown"),
        args: vec![],
        returns: TypeRef::None,
    })
    .unwrap();

    let failure = runner().run(&seq).failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Unexecutable);
}

#[test]
fn test_run_string_argument_is_unexecutable() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(Statement::Literal {
        value: PrimitiveValue::Str("x".to_string()),
    })
    .unwrap();
    seq.push(Statement::Method {
        op: OperationId::new("Counter", "add"),
        receiver: VarRef(0),
        args: vec![VarRef(1)],
        returns: TypeRef::Int,
    })
    .unwrap();

    let failure = runner().run(&seq).failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Unexecutable);
    assert_eq!(failure.position, Some(2));
}

#[test]
fn test_run_out_of_range_argument_is_unexecutable() {
    // Both values wrap to small i32s; neither may reach the export.
    for n in [4_294_967_295, -4_294_967_291] {
        let mut seq = Sequence::new();
        seq.push(new_counter()).unwrap();
        seq.push(int(n)).unwrap();
        seq.push(add(0, 1)).unwrap();

        let outcome = runner().run(&seq);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Unexecutable, "argument {n}");
        assert_eq!(failure.position, Some(2));
        assert_eq!(outcome.statements_run, 2);
    }
}

#[test]
fn test_run_i32_boundary_argument_is_passed_through() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(int(i64::from(i32::MAX))).unwrap();
    seq.push(add(0, 1)).unwrap();

    let outcome = runner().run(&seq);
    assert!(outcome.completed(), "unexpected failure: {:?}", outcome.failure);
}

#[test]
fn test_run_fractional_float_for_integer_export_is_unexecutable() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(Statement::Literal {
        value: PrimitiveValue::Float(2.5),
    })
    .unwrap();
    seq.push(add(0, 1)).unwrap();

    let failure = runner().run(&seq).failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Unexecutable);
    assert!(failure.message.contains("does not fit i32"));
}
