//! Property tests for enforcement.

use indexmap::IndexSet;
use proptest::prelude::*;

use polyforce_core::{
    build_fields, Arguments, ConcreteType, Policy, Polycheck, Signature, TypeHint, Value,
};

fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::None),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Str),
        prop::collection::vec(any::<i64>().prop_map(Value::Int), 0..4).prop_map(Value::List),
    ]
}

fn hint_for(value: &Value) -> TypeHint {
    match value.type_of() {
        ConcreteType::List => TypeHint::list_of(TypeHint::any()),
        other => TypeHint::of(other),
    }
}

proptest! {
    #[test]
    fn well_typed_arguments_never_fail(values in prop::collection::vec(scalar_value(), 0..6)) {
        let signature = values
            .iter()
            .enumerate()
            .fold(Signature::function("f").returns(TypeHint::any()), |sig, (i, value)| {
                sig.arg(format!("p{i}"), hint_for(value))
            });
        let f = Polycheck::new()
            .wrap(signature, |_| Ok(Value::None))
            .unwrap();
        prop_assert!(f.call(Arguments::positional(values)).is_ok());
    }

    #[test]
    fn resolution_is_deterministic(values in prop::collection::vec(scalar_value(), 1..5)) {
        let hint = TypeHint::union(values.iter().map(hint_for));
        let exempt = IndexSet::new();
        prop_assert_eq!(hint.resolve(&exempt), hint.resolve(&exempt));
        for value in &values {
            prop_assert!(hint.resolve(&exempt).accepts(&value.type_of()));
        }
    }

    #[test]
    fn rebuilt_fields_agree(values in prop::collection::vec(scalar_value(), 0..5)) {
        let signature = values
            .iter()
            .enumerate()
            .fold(Signature::function("f").returns(TypeHint::none()), |sig, (i, value)| {
                sig.arg_with_default(format!("p{i}"), hint_for(value), value.clone())
            });
        let policy = Policy::new();
        let first = build_fields(&signature, &policy).unwrap();
        let second = build_fields(&signature, &policy).unwrap();
        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            prop_assert_eq!(a.name(), b.name());
            prop_assert_eq!(a.is_required(), b.is_required());
            prop_assert_eq!(
                a.resolved_types(policy.exempt_types()),
                b.resolved_types(policy.exempt_types())
            );
        }
    }
}
