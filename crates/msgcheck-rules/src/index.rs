//! # Constraint Index
//!
//! Maps schema paths to the constraints effective there. Two kinds of
//! entries exist:
//!
//! - **Direct** entries are single-step paths `(Owner, field)` holding the
//!   constraints declared on the field itself.
//! - **Rule** entries are two-step paths
//!   `(Target, target_field) -> (FieldType, rule_field)` holding
//!   constraints transplanted by a bound rule.
//!
//! Lookups for a path of any depth combine the direct entry of its last
//! step with the rule entry of its last two steps, so a rule bound to
//! `Order.amount` applies wherever an `Order` occurs.
//!
//! ## Precedence
//!
//! A direct constraint always wins over a rule constraint of the same kind.
//! Among rules, the first registered wins. Losing constraints are dropped,
//! never merged.

use std::collections::BTreeMap;
use std::fmt;

use msgcheck_core::{Constraint, ConstraintKind, FieldPath, TypeName, TypeSet};

use crate::definition::RuleDefinition;

/// Where an effective constraint came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Declared on the field itself.
    Direct,
    /// Transplanted from the named rule type.
    Rule(TypeName),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Rule(rule) => write!(f, "rule {rule}"),
        }
    }
}

/// One effective constraint and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstraint {
    /// The constraint.
    pub constraint: Constraint,
    /// Where it came from.
    pub origin: Origin,
}

/// The constraints effective at one path, at most one per kind, iterated
/// in [`ConstraintKind`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    by_kind: BTreeMap<ConstraintKind, ResolvedConstraint>,
}

impl ConstraintSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless a constraint of the same kind is already present.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, constraint: Constraint, origin: Origin) -> bool {
        let kind = constraint.kind();
        if self.by_kind.contains_key(&kind) {
            return false;
        }
        self.by_kind
            .insert(kind, ResolvedConstraint { constraint, origin });
        true
    }

    /// The constraint of `kind`, with its origin.
    pub fn get(&self, kind: ConstraintKind) -> Option<&ResolvedConstraint> {
        self.by_kind.get(&kind)
    }

    /// The constraint of `kind`.
    pub fn constraint(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.get(kind).map(|r| &r.constraint)
    }

    /// Whether a constraint of `kind` is effective.
    pub fn contains(&self, kind: ConstraintKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Constraints in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedConstraint> {
        self.by_kind.values()
    }

    /// Number of effective kinds.
    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    /// Whether the path is unconstrained.
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

/// Effective-constraint lookup by field path.
///
/// An absent entry is the empty set, never an error.
pub trait ConstraintResolver: Send + Sync {
    /// The constraints effective at `path`. Element markers are ignored.
    fn constraints_for(&self, path: &FieldPath) -> ConstraintSet;
}

/// Immutable index from schema path to constraint set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintIndex {
    entries: BTreeMap<FieldPath, ConstraintSet>,
}

impl ConstraintIndex {
    /// Fold the direct constraints of every type in `types` and the
    /// contributions of every rule in `rules` (in order) into an index.
    ///
    /// Pure: the same inputs always produce an equal index.
    pub fn build(types: &TypeSet, rules: &[RuleDefinition]) -> Self {
        let mut entries: BTreeMap<FieldPath, ConstraintSet> = BTreeMap::new();

        for descriptor in types.iter() {
            for field in descriptor.fields() {
                if field.constraints().is_empty() {
                    continue;
                }
                let set = entries
                    .entry(FieldPath::of(descriptor.name().clone(), field.name()))
                    .or_default();
                for constraint in field.constraints() {
                    set.insert(constraint.clone(), Origin::Direct);
                }
            }
        }

        for rule in rules {
            for (path, constraint) in rule.contributions() {
                let kind = constraint.kind();
                let shadowed_directly = path
                    .leaf()
                    .and_then(|leaf| entries.get(&leaf))
                    .is_some_and(|direct| direct.contains(kind));
                if shadowed_directly {
                    tracing::debug!(
                        rule = %rule.rule_type(),
                        path = %path,
                        kind = %kind,
                        "rule constraint dropped: declared directly on the field"
                    );
                    continue;
                }
                let inserted = entries
                    .entry(path.clone())
                    .or_default()
                    .insert(constraint.clone(), Origin::Rule(rule.rule_type().clone()));
                if !inserted {
                    tracing::debug!(
                        rule = %rule.rule_type(),
                        path = %path,
                        kind = %kind,
                        "rule constraint dropped: an earlier rule already applies"
                    );
                }
            }
        }

        tracing::debug!(
            entries = entries.len(),
            types = types.len(),
            rules = rules.len(),
            "constraint index built"
        );
        Self { entries }
    }

    /// The stored entry at exactly `path` (element markers ignored).
    pub fn get(&self, path: &FieldPath) -> Option<&ConstraintSet> {
        self.entries.get(&path.schema_path())
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &ConstraintSet)> {
        self.entries.iter()
    }

    /// Number of paths with at least one constraint.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConstraintResolver for ConstraintIndex {
    fn constraints_for(&self, path: &FieldPath) -> ConstraintSet {
        let steps = path.schema_path();
        let mut set = ConstraintSet::new();

        if let Some(direct) = steps.leaf().and_then(|leaf| self.entries.get(&leaf)) {
            for resolved in direct.iter() {
                set.insert(resolved.constraint.clone(), resolved.origin.clone());
            }
        }

        if steps.len() >= 2 {
            let suffix = FieldPath::from_steps(steps.steps()[steps.len() - 2..].to_vec());
            if let Some(ruled) = self.entries.get(&suffix) {
                for resolved in ruled.iter() {
                    set.insert(resolved.constraint.clone(), resolved.origin.clone());
                }
            }
        }

        set
    }
}
