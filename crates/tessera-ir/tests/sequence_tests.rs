use std::collections::HashSet;

use tessera_ir::{OperationId, PrimitiveValue, Sequence, SequenceError, Statement, TypeRef, VarRef};

fn new_counter() -> Statement {
    Statement::Constructor {
        op: OperationId::new("Counter", "new"),
        args: vec![],
    }
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

/// var0 = Counter(); var1 = 5; var2 = var0.add(var1)
fn counter_add(n: i64) -> Sequence {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(int(n)).unwrap();
    seq.push(add(0, 1)).unwrap();
    seq
}

#[test]
fn test_push_returns_positional_handles() {
    let mut seq = Sequence::new();
    assert_eq!(seq.push(new_counter()).unwrap(), VarRef(0));
    assert_eq!(seq.push(int(3)).unwrap(), VarRef(1));
    assert_eq!(seq.len(), 2);
    assert_eq!(seq.produced_type(VarRef(0)), Some(TypeRef::object("Counter")));
    assert_eq!(seq.produced_type(VarRef(1)), Some(TypeRef::Int));
    assert_eq!(seq.produced_type(VarRef(2)), None);
}

#[test]
fn test_push_rejects_forward_reference() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    let err = seq.push(add(0, 1)).unwrap_err();
    assert_eq!(
        err,
        SequenceError::ForwardReference {
            position: 1,
            reference: VarRef(1),
        }
    );
    assert_eq!(seq.len(), 1);
}

#[test]
fn test_push_rejects_void_reference() {
    let mut seq = Sequence::new();
    seq.push(new_counter()).unwrap();
    seq.push(Statement::Method {
        op: OperationId::new("Counter", "reset"),
        receiver: VarRef(0),
        args: vec![],
        returns: TypeRef::None,
    })
    .unwrap();
    let err = seq.push(add(1, 0)).unwrap_err();
    assert!(matches!(err, SequenceError::VoidReference { position: 2, .. }));
}

#[test]
fn test_append_sequence_renumbers_handles() {
    let mut merged = Sequence::new();
    merged.append_sequence(&counter_add(1));
    merged.append_sequence(&counter_add(2));

    assert_eq!(merged.len(), 6);
    assert!(merged.validate().is_ok());
    assert_eq!(merged.statements()[5], add(3, 4));
    assert_eq!(merged.statements()[2], add(0, 1));
}

#[test]
fn test_structural_equality_and_fingerprint() {
    let a = counter_add(7);
    let b = counter_add(7);
    let c = counter_add(8);

    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a, c);

    let set: HashSet<Sequence> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_order_matters_for_equality() {
    let mut first = Sequence::new();
    first.push(int(1)).unwrap();
    first.push(int(2)).unwrap();

    let mut second = Sequence::new();
    second.push(int(2)).unwrap();
    second.push(int(1)).unwrap();

    assert_ne!(first, second);
}

#[test]
fn test_compatible_handles() {
    let seq = counter_add(1);
    assert_eq!(seq.compatible_handles(&TypeRef::Int), vec![VarRef(1), VarRef(2)]);
    assert_eq!(
        seq.compatible_handles(&TypeRef::object("Counter")),
        vec![VarRef(0)]
    );
    assert_eq!(seq.compatible_handles(&TypeRef::Any).len(), 3);
    assert!(seq.compatible_handles(&TypeRef::Str).is_empty());
}

#[test]
fn test_display_renders_one_line_per_statement() {
    let text = counter_add(5).to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["var0 = Counter()", "var1 = 5", "var2 = var0.add(var1)"]);
}

#[test]
fn test_serde_round_trip_preserves_structure() {
    let seq = counter_add(9);
    let json = serde_json::to_string(&seq).unwrap();
    let back: Sequence = serde_json::from_str(&json).unwrap();
    assert_eq!(seq, back);
}
