//! # Rule Definitions
//!
//! A rule-shaped record type carries constraints on its own fields and a
//! target specification naming record-typed fields of other types. Binding
//! a rule transplants each rule field's constraints onto the same-named
//! sub-field of every target.
//!
//! ## Security Invariant
//!
//! Binding is checked in full at registration. Every target must resolve
//! to an existing record-typed field, and that field's record type must
//! contain every rule field by name with the same cardinality and kind. A
//! definition that fails any check is never constructed, so the index
//! cannot hold a constraint pointing at a field that does not exist.

use msgcheck_core::{
    Constraint, FieldDescriptor, FieldPath, MessageDescriptor, SchemaSource, TypeName,
};

use crate::error::RuleError;
use crate::target::{parse_target_spec, resolve_type};

/// One resolved target of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleBinding {
    /// Type declaring the target field.
    pub target: TypeName,
    /// The record-typed target field.
    pub target_field: String,
    /// Record type held by the target field.
    pub field_type: TypeName,
}

impl RuleBinding {
    /// The lookup path for rule field `field` under this binding:
    /// `(target, target_field) -> (field_type, field)`.
    pub fn path_of(&self, field: &str) -> FieldPath {
        FieldPath::of(self.target.clone(), self.target_field.clone())
            .child(self.field_type.clone(), field)
    }
}

impl std::fmt::Display for RuleBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.target, self.target_field)
    }
}

/// A rule type bound to its checked targets.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    rule_type: TypeName,
    bindings: Vec<RuleBinding>,
    fields: Vec<(String, Vec<Constraint>)>,
}

impl RuleDefinition {
    /// Parse `spec`, resolve every target against `schema`, and check each
    /// target's record type against the rule's fields.
    ///
    /// # Errors
    ///
    /// - [`RuleError::MalformedTarget`] if `spec` does not parse.
    /// - [`RuleError::UnknownTarget`] if a target type, target field, or
    ///   rule sub-field does not exist.
    /// - [`RuleError::NotAMessageField`] if a target field is scalar.
    /// - [`RuleError::TypeMismatch`] if a rule field's cardinality or kind
    ///   differs from the target sub-field's.
    pub fn bind(
        rule: &MessageDescriptor,
        spec: &str,
        schema: &dyn SchemaSource,
    ) -> Result<Self, RuleError> {
        let rule_type = rule.name();
        let refs = parse_target_spec(rule_type, spec)?;

        let mut bindings: Vec<RuleBinding> = Vec::with_capacity(refs.len());
        for target_ref in refs {
            let unknown = |target: String| RuleError::UnknownTarget {
                rule: rule_type.to_string(),
                target,
            };

            let target = resolve_type(rule_type, &target_ref.type_ref, schema)
                .ok_or_else(|| unknown(target_ref.to_string()))?;
            let target_desc = schema
                .descriptor(&target)
                .ok_or_else(|| unknown(target_ref.to_string()))?;
            let qualified = format!("{target}.{}", target_ref.field);
            let target_field = target_desc
                .field(&target_ref.field)
                .ok_or_else(|| unknown(qualified.clone()))?;

            let Some(field_type) = target_field.kind().message_type() else {
                return Err(RuleError::NotAMessageField {
                    rule: rule_type.to_string(),
                    target: qualified,
                    kind: target_field.kind().to_string(),
                });
            };
            let field_desc = schema
                .descriptor(field_type)
                .ok_or_else(|| unknown(field_type.to_string()))?;

            for rule_field in rule.fields() {
                let sub = field_desc
                    .field(rule_field.name())
                    .ok_or_else(|| unknown(format!("{qualified}.{}", rule_field.name())))?;
                if !rule_field.shape_matches(sub) {
                    return Err(RuleError::TypeMismatch {
                        rule: rule_type.to_string(),
                        target: format!("{qualified}.{}", sub.name()),
                        field: rule_field.name().to_string(),
                        expected: shape(sub),
                        found: shape(rule_field),
                    });
                }
            }

            let binding = RuleBinding {
                target,
                target_field: target_ref.field,
                field_type: field_type.clone(),
            };
            if !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }

        let fields = rule
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), f.constraints().to_vec()))
            .collect();

        Ok(Self {
            rule_type: rule_type.clone(),
            bindings,
            fields,
        })
    }

    /// The rule type.
    pub fn rule_type(&self) -> &TypeName {
        &self.rule_type
    }

    /// Resolved targets, in specification order, without duplicates.
    pub fn bindings(&self) -> &[RuleBinding] {
        &self.bindings
    }

    /// Rule fields and the constraints each carries.
    pub fn fields(&self) -> &[(String, Vec<Constraint>)] {
        &self.fields
    }

    /// Fold the bindings of `other` (same rule type) into this definition,
    /// skipping targets already bound. Returns how many were added.
    pub fn absorb(&mut self, other: &RuleDefinition) -> usize {
        let mut added = 0;
        for binding in &other.bindings {
            if !self.bindings.contains(binding) {
                self.bindings.push(binding.clone());
                added += 1;
            }
        }
        added
    }

    /// Every `(path, constraint)` pair this rule contributes to the index,
    /// bindings first, then rule fields in declaration order.
    pub fn contributions(&self) -> impl Iterator<Item = (FieldPath, &Constraint)> + '_ {
        self.bindings.iter().flat_map(move |binding| {
            self.fields.iter().flat_map(move |(field, constraints)| {
                let path = binding.path_of(field);
                constraints.iter().map(move |c| (path.clone(), c))
            })
        })
    }
}

fn shape(field: &FieldDescriptor) -> String {
    format!("{} {}", field.cardinality(), field.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgcheck_core::{ConstraintKind, TypeSet};

    const SCHEMA: &str = r#"
types:
  - name: acme.T
    fields:
      - name: amount
        kind: { message: acme.Money }
      - name: refunds
        kind: { message: acme.Money }
        cardinality: repeated
      - name: note
        kind: string
  - name: acme.U
    fields:
      - name: total
        kind: { message: acme.Money }
  - name: acme.Money
    fields:
      - name: value
        kind: int
      - name: currency
        kind: string
"#;

    fn schema_with(rule: &str) -> TypeSet {
        TypeSet::from_yaml_str(&format!("{SCHEMA}{rule}")).unwrap()
    }

    fn bind(set: &TypeSet, rule: &str) -> Result<RuleDefinition, RuleError> {
        let desc = set.descriptor(&TypeName::new(rule).unwrap()).unwrap();
        RuleDefinition::bind(desc, desc.rule_target().unwrap_or(""), set)
    }

    const POSITIVE: &str = r#"
  - name: acme.rules.Positive
    rule_target: "T.amount, U.total; T.refunds"
    fields:
      - name: value
        kind: int
        constraints: { range: "(0..]" }
"#;

    #[test]
    fn test_bind_resolves_all_targets() {
        let set = schema_with(POSITIVE);
        let def = bind(&set, "acme.rules.Positive").unwrap();
        let targets: Vec<String> = def.bindings().iter().map(ToString::to_string).collect();
        assert_eq!(targets, vec!["acme.T.amount", "acme.U.total", "acme.T.refunds"]);
        assert!(def.bindings().iter().all(|b| b.field_type.as_str() == "acme.Money"));
    }

    #[test]
    fn test_contributions_are_two_step_paths() {
        let set = schema_with(POSITIVE);
        let def = bind(&set, "acme.rules.Positive").unwrap();
        let paths: Vec<String> = def.contributions().map(|(p, _)| p.to_string()).collect();
        assert_eq!(
            paths,
            vec!["acme.T.amount.value", "acme.U.total.value", "acme.T.refunds.value"]
        );
        assert!(def.contributions().all(|(_, c)| c.kind() == ConstraintKind::Range));
    }

    #[test]
    fn test_duplicate_targets_collapse() {
        let set = schema_with(
            r#"
  - name: acme.rules.Twice
    rule_target: "T.amount, acme.T.amount"
    fields:
      - name: value
        kind: int
        constraints: { range: "[1..]" }
"#,
        );
        let def = bind(&set, "acme.rules.Twice").unwrap();
        assert_eq!(def.bindings().len(), 1);
    }

    #[test]
    fn test_unknown_target_type() {
        let set = schema_with(
            "  - name: acme.rules.R\n    rule_target: \"Nope.amount\"\n    fields:\n      - { name: value, kind: int }\n",
        );
        match bind(&set, "acme.rules.R") {
            Err(RuleError::UnknownTarget { target, .. }) => assert_eq!(target, "Nope.amount"),
            other => panic!("Expected UnknownTarget, got: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_target_field() {
        let set = schema_with(
            "  - name: acme.rules.R\n    rule_target: \"T.missing\"\n    fields:\n      - { name: value, kind: int }\n",
        );
        match bind(&set, "acme.rules.R") {
            Err(RuleError::UnknownTarget { target, .. }) => assert_eq!(target, "acme.T.missing"),
            other => panic!("Expected UnknownTarget, got: {other:?}"),
        }
    }

    #[test]
    fn test_missing_sub_field() {
        let set = schema_with(
            "  - name: acme.rules.R\n    rule_target: \"T.amount\"\n    fields:\n      - { name: cents, kind: int }\n",
        );
        match bind(&set, "acme.rules.R") {
            Err(RuleError::UnknownTarget { target, .. }) => {
                assert_eq!(target, "acme.T.amount.cents");
            }
            other => panic!("Expected UnknownTarget, got: {other:?}"),
        }
    }

    #[test]
    fn test_scalar_target_rejected() {
        let set = schema_with(
            "  - name: acme.rules.R\n    rule_target: \"T.note\"\n    fields:\n      - { name: value, kind: int }\n",
        );
        match bind(&set, "acme.rules.R") {
            Err(RuleError::NotAMessageField { target, kind, .. }) => {
                assert_eq!(target, "acme.T.note");
                assert_eq!(kind, "string");
            }
            other => panic!("Expected NotAMessageField, got: {other:?}"),
        }
    }

    #[test]
    fn test_kind_mismatch() {
        let set = schema_with(
            "  - name: acme.rules.R\n    rule_target: \"T.amount\"\n    fields:\n      - { name: value, kind: string }\n",
        );
        match bind(&set, "acme.rules.R") {
            Err(RuleError::TypeMismatch { field, expected, found, .. }) => {
                assert_eq!(field, "value");
                assert_eq!(expected, "singular int");
                assert_eq!(found, "singular string");
            }
            other => panic!("Expected TypeMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn test_cardinality_mismatch() {
        let set = schema_with(
            "  - name: acme.rules.R\n    rule_target: \"T.amount\"\n    fields:\n      - { name: value, kind: int, cardinality: repeated }\n",
        );
        assert!(matches!(bind(&set, "acme.rules.R"), Err(RuleError::TypeMismatch { .. })));
    }

    #[test]
    fn test_absorb_merges_new_bindings_only() {
        let set = schema_with(POSITIVE);
        let mut first = bind(&set, "acme.rules.Positive").unwrap();
        let again = first.clone();
        assert_eq!(first.absorb(&again), 0);
        assert_eq!(first, again);
    }
}
