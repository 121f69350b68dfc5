//! # Validator
//!
//! Walks a record instance in schema declaration order, resolves the
//! effective constraints of every field occurrence, and collects every
//! violation. Evaluation never short-circuits: a record with `n`
//! independent failures yields `n` violations.
//!
//! ## Evaluation
//!
//! | Kind        | Singular                        | Repeated              | Map            |
//! |-------------|---------------------------------|-----------------------|----------------|
//! | `required`  | present (non-default; records stored) | non-empty       | non-empty      |
//! | `pattern`   | non-empty string matches        | each element          | each value     |
//! | `range`     | effective value within bounds   | each element          | each value     |
//! | `distinct`  | n/a                             | first duplicate       | not evaluated  |
//! | `validated` | nested violations under parent  | per element           | per value      |
//! | `set_once`  | builder only                    | builder only          | builder only   |
//!
//! Record-typed fields are always descended into. Without `validated` the
//! child's violations are appended flat; with it, each invalid child
//! contributes one parent violation carrying the child's as `nested`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use msgcheck_core::{
    Constraint, ConstraintKind, FieldDescriptor, FieldPath, FieldValue, MessageDescriptor, Record,
    SchemaSource, TypeName, TypeSet, Value,
};
use msgcheck_rules::{ConstraintResolver, ConstraintSet, RegistrySnapshot, RuleRegistry};

use crate::violation::{ValidationError, Violation, Violations};

/// Evaluates constraints against records.
///
/// Holds the schema and the resolver of one registry snapshot; cloning is
/// cheap and clones share both.
#[derive(Clone)]
pub struct Validator {
    types: Arc<TypeSet>,
    resolver: Arc<dyn ConstraintResolver>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("types", &self.types.len())
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// A validator over explicit schema and resolver.
    pub fn new(types: Arc<TypeSet>, resolver: Arc<dyn ConstraintResolver>) -> Self {
        Self { types, resolver }
    }

    /// A validator pinned to one registry snapshot.
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Self {
        let resolver: Arc<dyn ConstraintResolver> = snapshot.index().clone();
        Self::new(Arc::clone(snapshot.types()), resolver)
    }

    /// A validator pinned to the registry's current snapshot. Later
    /// extensions are not observed.
    pub fn from_registry(registry: &RuleRegistry) -> Self {
        Self::from_snapshot(&registry.snapshot())
    }

    /// The schema this validator walks.
    pub fn types(&self) -> &Arc<TypeSet> {
        &self.types
    }

    /// The descriptor of a type, if known.
    pub fn descriptor(&self, type_name: &TypeName) -> Option<&MessageDescriptor> {
        self.types.descriptor(type_name)
    }

    /// The constraints effective at `path`.
    pub fn constraints_for(&self, path: &FieldPath) -> ConstraintSet {
        self.resolver.constraints_for(path)
    }

    /// Every violation in `record`, in declaration order. Empty when every
    /// constraint holds.
    pub fn validate(&self, record: &Record) -> Vec<Violation> {
        self.validate_at(record, &FieldPath::root())
    }

    /// Validate `record` as if it occurred at `base`.
    pub fn validate_at(&self, record: &Record, base: &FieldPath) -> Vec<Violation> {
        let mut out = Vec::new();
        let Some(descriptor) = self.types.descriptor(record.type_name()) else {
            tracing::debug!(type_name = %record.type_name(), path = %base, "skipping record of unknown type");
            return out;
        };

        for field in descriptor.fields() {
            let path = base.child(descriptor.name().clone(), field.name());
            let constraints = self.resolver.constraints_for(&path);
            let value = record.get(field.name());
            tracing::trace!(path = %path, constraints = constraints.len(), "evaluating field");

            for resolved in constraints.iter() {
                evaluate(&resolved.constraint, field, value, &path, &mut out);
            }
            if field.is_message() {
                self.descend(value, &path, constraints.contains(ConstraintKind::Validated), &mut out);
            }
        }
        out
    }

    /// `Ok(())` if `record` is valid, otherwise every violation.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] carrying the full violation list.
    pub fn check(&self, record: &Record) -> Result<(), ValidationError> {
        let violations = self.validate(record);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                type_name: record.type_name().clone(),
                violations: Violations::from(violations),
            })
        }
    }

    fn descend(&self, value: Option<&FieldValue>, path: &FieldPath, validated: bool, out: &mut Vec<Violation>) {
        let children: Vec<(FieldPath, &Record)> = match value {
            Some(FieldValue::Singular(v)) => v.as_record().map(|r| (path.clone(), r)).into_iter().collect(),
            Some(FieldValue::Repeated(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.as_record().map(|r| (path.at_index(i), r)))
                .collect(),
            Some(FieldValue::Map(entries)) => entries
                .iter()
                .filter_map(|(k, v)| v.as_record().map(|r| (path.at_key(k.clone()), r)))
                .collect(),
            None => Vec::new(),
        };

        for (child_path, child) in children {
            let nested = self.validate_at(child, &child_path);
            if nested.is_empty() {
                continue;
            }
            if validated {
                let message = format!("{} is invalid", child.type_name());
                out.push(Violation::new(child_path, ConstraintKind::Validated, message).with_nested(nested));
            } else {
                out.extend(nested);
            }
        }
    }
}

// ─── Per-kind evaluation ─────────────────────────────────────────────

fn evaluate(
    constraint: &Constraint,
    field: &FieldDescriptor,
    value: Option<&FieldValue>,
    path: &FieldPath,
    out: &mut Vec<Violation>,
) {
    match constraint {
        Constraint::Required { .. } => {
            if value.is_some_and(FieldValue::is_present) {
                return;
            }
            let default = if field.cardinality().is_collection() {
                "is required but empty"
            } else {
                "is required"
            };
            let text = render(constraint.message(), default, path, None);
            out.push(Violation::new(path.clone(), ConstraintKind::Required, text));
        }
        Constraint::Pattern(pattern) => {
            // An empty singular string is unset; elements and map values
            // are stored data and always checked.
            let singular = matches!(value, Some(FieldValue::Singular(_)));
            for (at, v) in occurrences(value, path) {
                let Some(text) = v.as_str() else { continue };
                if (singular && text.is_empty()) || pattern.is_match(text) {
                    continue;
                }
                let default = format!("must match pattern {}", pattern.source());
                let message = render(constraint.message(), &default, &at, Some(v));
                out.push(Violation::new(at, ConstraintKind::Pattern, message).with_value(v));
            }
        }
        Constraint::Range(range) => {
            let unset;
            let mut values = occurrences(value, path);
            if value.is_none() && !field.cardinality().is_collection() {
                if let Some(default) = Value::default_for(field.kind()) {
                    unset = default;
                    values.push((path.clone(), &unset));
                }
            }
            for (at, v) in values {
                if let Err(failure) = range.check(v) {
                    let message = render(constraint.message(), &failure.to_string(), &at, Some(v));
                    out.push(Violation::new(at, ConstraintKind::Range, message).with_value(v));
                }
            }
        }
        Constraint::Distinct(_) => {
            let Some(FieldValue::Repeated(items)) = value else {
                return;
            };
            let mut seen = HashSet::with_capacity(items.len());
            if let Some((i, dup)) = items.iter().enumerate().find(|(_, v)| !seen.insert(*v)) {
                let at = path.at_index(i);
                let message = render(None, "duplicates an earlier element", &at, Some(dup));
                out.push(Violation::new(at, ConstraintKind::Distinct, message).with_value(dup));
            }
        }
        // Handled by descent.
        Constraint::Validated => {}
        // Mutation-time only.
        Constraint::SetOnce => {}
    }
}

/// Every stored value of a field with its occurrence path.
fn occurrences<'a>(value: Option<&'a FieldValue>, path: &FieldPath) -> Vec<(FieldPath, &'a Value)> {
    match value {
        Some(FieldValue::Singular(v)) => vec![(path.clone(), v)],
        Some(FieldValue::Repeated(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (path.at_index(i), v))
            .collect(),
        Some(FieldValue::Map(entries)) => entries
            .iter()
            .map(|(k, v)| (path.at_key(k.clone()), v))
            .collect(),
        None => Vec::new(),
    }
}

/// Expand `{path}` and `{value}` in a message override, or fall back.
fn render(template: Option<&str>, default: &str, path: &FieldPath, value: Option<&Value>) -> String {
    let Some(template) = template else {
        return default.to_string();
    };
    let value = value.map(ToString::to_string).unwrap_or_default();
    template
        .replace("{path}", &path.to_string())
        .replace("{value}", &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgcheck_core::MapKey;

    const ORDERS: &str = r#"
types:
  - name: acme.Order
    fields:
      - name: id
        kind: string
        constraints: { required: true, pattern: { regex: "ORD-[0-9]+", message: "{path} got {value}" } }
      - name: quantity
        kind: int
        constraints: { range: "[1..100]" }
      - name: tags
        kind: string
        cardinality: repeated
        constraints: { required: true, distinct: error, pattern: "[a-z]+" }
      - name: amount
        kind: { message: acme.Money }
        constraints: { required: true }
      - name: lines
        kind: { message: acme.Money }
        cardinality: repeated
        constraints: { validated: true }
      - name: labels
        kind: string
        cardinality: map
        constraints: { pattern: "[a-z]+" }
  - name: acme.Money
    fields:
      - name: units
        kind: int
        constraints: { range: "(0..]" }
      - name: currency
        kind: string
        constraints: { required: true }
"#;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    fn validator() -> Validator {
        let types = TypeSet::from_yaml_str(ORDERS).unwrap();
        let (registry, _) = RuleRegistry::with_types(&types);
        Validator::from_registry(&registry)
    }

    fn money(units: i64, currency: &str) -> Record {
        Record::new(name("acme.Money"))
            .with_value("units", units)
            .with_value("currency", currency)
    }

    fn valid_order() -> Record {
        Record::new(name("acme.Order"))
            .with_value("id", "ORD-1")
            .with_value("quantity", 3i64)
            .with_items("tags", ["a", "b"])
            .with_value("amount", money(5, "EUR"))
    }

    fn paths(violations: &[Violation]) -> Vec<String> {
        violations.iter().map(|v| v.path.to_string()).collect()
    }

    // ── Basics ───────────────────────────────────────────────────────

    #[test]
    fn test_valid_record_has_no_violations() {
        assert!(validator().validate(&valid_order()).is_empty());
        assert!(validator().check(&valid_order()).is_ok());
    }

    #[test]
    fn test_empty_record_reports_all_required_in_order() {
        let violations = validator().validate(&Record::new(name("acme.Order")));
        assert_eq!(
            paths(&violations),
            vec!["acme.Order.id", "acme.Order.quantity", "acme.Order.tags", "acme.Order.amount"]
        );
        assert_eq!(violations[0].kind, ConstraintKind::Required);
        assert_eq!(violations[1].kind, ConstraintKind::Range);
        assert_eq!(violations[1].value.as_deref(), Some("0"));
        assert_eq!(violations[2].message, "is required but empty");
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        assert!(validator().validate(&Record::new(name("acme.Ghost"))).is_empty());
    }

    // ── Pattern ──────────────────────────────────────────────────────

    #[test]
    fn test_pattern_message_placeholders() {
        let order = valid_order().with_value("id", "X-1");
        let violations = validator().validate(&order);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "acme.Order.id got \"X-1\"");
        assert_eq!(violations[0].value.as_deref(), Some("\"X-1\""));
    }

    #[test]
    fn test_pattern_on_elements_and_map_values() {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert(MapKey::from("eu"), Value::from("ok"));
        labels.insert(MapKey::from("us"), Value::from("NO"));
        let order = valid_order()
            .with_items("tags", ["a", "B2"])
            .with("labels", FieldValue::Map(labels));
        let violations = validator().validate(&order);
        assert_eq!(paths(&violations), vec!["acme.Order.tags[1]", "acme.Order.labels[\"us\"]"]);
    }

    #[test]
    fn test_pattern_checks_empty_elements() {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert(MapKey::from("eu"), Value::from(""));
        let order = valid_order()
            .with_items("tags", ["abc", ""])
            .with("labels", FieldValue::Map(labels));
        let violations = validator().validate(&order);
        assert_eq!(paths(&violations), vec!["acme.Order.tags[1]", "acme.Order.labels[\"eu\"]"]);
        assert!(violations.iter().all(|v| v.kind == ConstraintKind::Pattern));
    }

    #[test]
    fn test_pattern_skips_unset_singular() {
        let order = valid_order().with_value("id", "");
        let kinds: Vec<ConstraintKind> = validator().validate(&order).iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ConstraintKind::Required]);
    }

    // ── Range ────────────────────────────────────────────────────────

    #[test]
    fn test_range_names_violated_bound() {
        let order = valid_order().with_value("quantity", 101i64);
        let violations = validator().validate(&order);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "must be less than or equal to 100");
    }

    // ── Distinct ─────────────────────────────────────────────────────

    #[test]
    fn test_distinct_reports_first_duplicate() {
        let order = valid_order().with_items("tags", ["a", "b", "a", "b"]);
        let violations = validator().validate(&order);
        assert_eq!(paths(&violations), vec!["acme.Order.tags[2]"]);
        assert_eq!(violations[0].kind, ConstraintKind::Distinct);
    }

    // ── Nesting ──────────────────────────────────────────────────────

    #[test]
    fn test_unvalidated_child_violations_are_flat() {
        let order = valid_order().with_value("amount", money(0, ""));
        let violations = validator().validate(&order);
        assert_eq!(paths(&violations), vec!["acme.Order.amount.units", "acme.Order.amount.currency"]);
        assert!(violations.iter().all(|v| v.nested.is_empty()));
    }

    #[test]
    fn test_validated_children_nest_under_element() {
        let order = valid_order().with_items("lines", [money(1, "EUR"), money(-2, "EUR")]);
        let violations = validator().validate(&order);
        assert_eq!(violations.len(), 1);
        let parent = &violations[0];
        assert_eq!(parent.kind, ConstraintKind::Validated);
        assert_eq!(parent.path.to_string(), "acme.Order.lines[1]");
        assert_eq!(paths(&parent.nested), vec!["acme.Order.lines[1].units"]);
    }

    #[test]
    fn test_check_aggregates() {
        let order = valid_order().with_value("id", "").with_value("quantity", 0i64);
        match validator().check(&order) {
            Err(err) => {
                assert_eq!(err.type_name, name("acme.Order"));
                assert_eq!(err.violations.len(), 2);
            }
            other => panic!("Expected ValidationError, got: {other:?}"),
        }
    }
}
