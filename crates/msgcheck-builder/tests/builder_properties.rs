//! # Builder Properties
//!
//! 1. **Set-once invariant.** After a successful non-default `set`, any
//!    later `set`, any `merge` touching the field, and any `clear` fail,
//!    whatever value they carry, and the stored value is unchanged.
//! 2. **Distinct policies.** A duplicate `add` fails under `error` and is a
//!    no-op under `ignore`; either way the field holds one copy.
//! 3. **Required collections.** Building with one of two required repeated
//!    fields left empty reports exactly that field.

use msgcheck_builder::{BuilderError, ValidatingBuilder};
use msgcheck_core::{ConstraintKind, FieldValue, Record, TypeName, TypeSet, Value};
use msgcheck_rules::RuleRegistry;
use msgcheck_validate::Validator;
use proptest::prelude::*;

const SCHEMA: &str = r#"
types:
  - name: acme.Account
    fields:
      - name: owner
        kind: string
        constraints: { set_once: true }
      - name: number
        kind: int
        constraints: { set_once: true }
      - name: codes
        kind: int
        cardinality: repeated
        constraints: { distinct: error }
      - name: aliases
        kind: int
        cardinality: repeated
        constraints: { distinct: ignore }
  - name: acme.Batch
    fields:
      - name: inputs
        kind: string
        cardinality: repeated
        constraints: { required: true }
      - name: outputs
        kind: string
        cardinality: repeated
        constraints: { required: true }
"#;

fn name(s: &str) -> TypeName {
    TypeName::new(s).unwrap()
}

fn validator() -> Validator {
    let (registry, _) = RuleRegistry::with_types(&TypeSet::from_yaml_str(SCHEMA).unwrap());
    Validator::from_registry(&registry)
}

fn account() -> ValidatingBuilder {
    ValidatingBuilder::new(validator(), &name("acme.Account")).unwrap()
}

fn count_of(field: Option<&FieldValue>, x: i64) -> usize {
    match field {
        Some(FieldValue::Repeated(items)) => items.iter().filter(|v| **v == Value::Int(x)).count(),
        _ => 0,
    }
}

proptest! {
    #[test]
    fn set_once_invariant(
        v in any::<i64>().prop_filter("non-default", |v| *v != 0),
        v2 in prop_oneof![Just(0i64), Just(1i64), any::<i64>()],
        same in any::<bool>(),
    ) {
        let v2 = if same { v } else { v2 };
        let mut b = account();
        b.set("number", v).unwrap();
        let stored = Some(FieldValue::Singular(Value::Int(v)));

        let set_again = b.set("number", v2).map(|_| ());
        prop_assert!(matches!(set_again, Err(BuilderError::SetOnceViolation { .. })), "set: {:?}", set_again);
        prop_assert_eq!(b.get("number"), stored.as_ref());

        let merged = b
            .merge(&Record::new(name("acme.Account")).with_value("number", v2))
            .map(|_| ());
        if v2 == 0 {
            // A default value is absent and does not touch the field.
            prop_assert!(merged.is_ok());
        } else {
            prop_assert!(matches!(merged, Err(BuilderError::SetOnceViolation { .. })), "merge: {:?}", merged);
        }
        prop_assert_eq!(b.get("number"), stored.as_ref());

        let cleared = b.clear("number").map(|_| ());
        prop_assert!(matches!(cleared, Err(BuilderError::SetOnceViolation { .. })), "clear: {:?}", cleared);
        prop_assert_eq!(b.get("number"), stored.as_ref());
    }

    #[test]
    fn set_once_string_invariant(v in "[a-z]{1,12}", v2 in "[a-z]{1,12}", same in any::<bool>()) {
        let v2 = if same { v.clone() } else { v2 };
        let mut b = account();
        b.set("owner", v.as_str()).unwrap();
        prop_assert!(b.set("owner", v2.as_str()).is_err());
        prop_assert_eq!(b.get("owner"), Some(&FieldValue::Singular(Value::from(v.as_str()))));
    }

    #[test]
    fn distinct_error_keeps_one(xs in prop::collection::vec(-3i64..3, 1..10), x in -3i64..3) {
        let mut b = account();
        for item in &xs {
            let _ = b.add("codes", *item);
        }
        let _ = b.add("codes", x);
        let second = b.add("codes", x).map(|_| ());
        prop_assert!(
            matches!(second, Err(BuilderError::DuplicateElementViolation { .. })),
            "second add: {:?}", second
        );
        prop_assert_eq!(count_of(b.get("codes"), x), 1);
    }

    #[test]
    fn distinct_ignore_keeps_one(xs in prop::collection::vec(-3i64..3, 1..10), x in -3i64..3) {
        let mut b = account();
        for item in &xs {
            b.add("aliases", *item).unwrap();
        }
        b.add("aliases", x).unwrap();
        b.add("aliases", x).unwrap();
        prop_assert_eq!(count_of(b.get("aliases"), x), 1);
    }
}

#[test]
fn test_required_repeated_one_empty() {
    let mut b = ValidatingBuilder::new(validator(), &name("acme.Batch")).unwrap();
    b.add("inputs", "a.csv").unwrap();

    let err = b.build().unwrap_err();
    assert_eq!(err.violations.len(), 1);
    let v = &err.violations.violations()[0];
    assert_eq!(v.path.to_string(), "acme.Batch.outputs");
    assert_eq!(v.kind, ConstraintKind::Required);
    assert_eq!(v.message, "is required but empty");
    assert!(err.to_string().contains("acme.Batch.outputs: is required but empty"));
}

#[test]
fn test_required_repeated_both_filled() {
    let mut b = ValidatingBuilder::new(validator(), &name("acme.Batch")).unwrap();
    b.add("inputs", "a.csv").unwrap().add("outputs", "b.csv").unwrap();
    let record = b.build().unwrap();
    assert!(record.has("inputs") && record.has("outputs"));
}
