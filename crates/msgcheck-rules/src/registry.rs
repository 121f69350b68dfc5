//! # Rule Registry
//!
//! Holds the known record types, the registered rule definitions, and the
//! constraint index folded from both, as one immutable
//! [`RegistrySnapshot`] published through an [`ArcSwap`].
//!
//! ## Copy-on-extend
//!
//! Writers ([`RuleRegistry::register`], [`RuleRegistry::extend`]) load the
//! current snapshot, build a successor, and publish it with
//! compare-and-swap, retrying from the new current snapshot if another
//! writer got there first. Readers load the current snapshot without
//! blocking and see either the old or the new one, never a mix.
//!
//! There is no unregister. Registered rules are never discarded.

use std::sync::Arc;

use arc_swap::ArcSwap;
use msgcheck_core::{FieldPath, SchemaSource, TypeName, TypeSet};

use crate::definition::RuleDefinition;
use crate::error::RuleError;
use crate::index::{ConstraintIndex, ConstraintResolver, ConstraintSet};

/// One published registry state.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    types: Arc<TypeSet>,
    rules: Vec<RuleDefinition>,
    index: Arc<ConstraintIndex>,
}

impl RegistrySnapshot {
    fn new(types: Arc<TypeSet>, rules: Vec<RuleDefinition>) -> Self {
        let index = Arc::new(ConstraintIndex::build(&types, &rules));
        Self { types, rules, index }
    }

    /// Known record types.
    pub fn types(&self) -> &Arc<TypeSet> {
        &self.types
    }

    /// Registered rules, in registration order.
    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    /// The published index.
    pub fn index(&self) -> &Arc<ConstraintIndex> {
        &self.index
    }

    /// Fold the types and rules of this snapshot into a fresh index.
    ///
    /// Always equal to [`RegistrySnapshot::index`].
    pub fn rebuild_index(&self) -> ConstraintIndex {
        ConstraintIndex::build(&self.types, &self.rules)
    }

    /// The registered rule of type `rule`, if any.
    pub fn rule(&self, rule: &TypeName) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.rule_type() == rule)
    }
}

/// Outcome of [`RuleRegistry::extend`].
#[derive(Debug, Clone)]
pub struct Extension {
    /// The index published by this extension.
    pub index: Arc<ConstraintIndex>,
    /// Rule types registered by this extension, in type order.
    pub registered: Vec<TypeName>,
    /// Rule types found but rejected, with the reason.
    pub rejected: Vec<(TypeName, RuleError)>,
}

/// The shared registry of types, rules, and their constraint index.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    snap: ArcSwap<RegistrySnapshot>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with `types`; rule-shaped types among them are
    /// registered as by [`RuleRegistry::extend`].
    pub fn with_types(types: &TypeSet) -> (Self, Extension) {
        let registry = Self::new();
        let extension = registry.extend(types);
        (registry, extension)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snap.load_full()
    }

    /// The current index. Repeated calls with no intervening registration
    /// return equal indices.
    pub fn index(&self) -> Arc<ConstraintIndex> {
        Arc::clone(&self.snap.load().index)
    }

    /// Bind the already known type `rule` to the targets in `spec` and
    /// publish a new index including its constraints.
    ///
    /// Registering a rule type that is already registered adds only the
    /// targets not yet bound; binding the same target twice is a no-op.
    /// Returns the definition as registered.
    ///
    /// # Errors
    ///
    /// [`RuleError::UnknownRuleType`] if `rule` is not a known type, and
    /// any binding error from [`RuleDefinition::bind`]. The registry is
    /// unchanged on error.
    pub fn register(&self, rule: &TypeName, spec: &str) -> Result<RuleDefinition, RuleError> {
        loop {
            let cur = self.snap.load_full();
            let descriptor = cur.types.descriptor(rule).ok_or_else(|| RuleError::UnknownRuleType {
                rule: rule.to_string(),
            })?;
            let definition = RuleDefinition::bind(descriptor, spec, &*cur.types)?;

            let mut rules = cur.rules.clone();
            let registered = merge_rule(&mut rules, definition);
            let next = Arc::new(RegistrySnapshot::new(Arc::clone(&cur.types), rules));

            let prev = self.snap.compare_and_swap(&cur, next);
            if Arc::ptr_eq(&prev, &cur) {
                tracing::debug!(
                    rule = %rule,
                    targets = registered.bindings().len(),
                    "rule registered"
                );
                return Ok(registered);
            }
        }
    }

    /// Add the types of `new_types` not yet known, register every
    /// rule-shaped type among them, and publish the resulting index.
    ///
    /// Rules are bound against the union of known and new types. A rule
    /// that fails to bind is reported in [`Extension::rejected`], logged,
    /// and left out of the index; it does not prevent the others. Its type
    /// stays known, so later extensions do not retry it; [`register`]
    /// binds it explicitly once its targets exist.
    ///
    /// [`register`]: RuleRegistry::register
    pub fn extend(&self, new_types: &TypeSet) -> Extension {
        loop {
            let cur = self.snap.load_full();
            let mut types = TypeSet::clone(&cur.types);
            let added = types.absorb(new_types);

            let mut rules = cur.rules.clone();
            let mut registered = Vec::new();
            let mut rejected = Vec::new();
            for name in &added {
                let Some(descriptor) = types.descriptor(name) else {
                    continue;
                };
                let Some(spec) = descriptor.rule_target() else {
                    continue;
                };
                match RuleDefinition::bind(descriptor, spec, &types) {
                    Ok(definition) => {
                        merge_rule(&mut rules, definition);
                        registered.push(name.clone());
                    }
                    Err(e) => rejected.push((name.clone(), e)),
                }
            }

            let next = Arc::new(RegistrySnapshot::new(Arc::new(types), rules));
            let index = Arc::clone(&next.index);

            let prev = self.snap.compare_and_swap(&cur, next);
            if Arc::ptr_eq(&prev, &cur) {
                for (rule, error) in &rejected {
                    tracing::warn!(rule = %rule, error = %error, "rule rejected");
                }
                tracing::debug!(
                    added = added.len(),
                    registered = registered.len(),
                    rejected = rejected.len(),
                    entries = index.len(),
                    "registry extended"
                );
                return Extension {
                    index,
                    registered,
                    rejected,
                };
            }
        }
    }
}

impl ConstraintResolver for RuleRegistry {
    fn constraints_for(&self, path: &FieldPath) -> ConstraintSet {
        self.snap.load().index.constraints_for(path)
    }
}

/// Insert `definition`, or fold its bindings into the existing rule of the
/// same type. Returns the stored definition.
fn merge_rule(rules: &mut Vec<RuleDefinition>, definition: RuleDefinition) -> RuleDefinition {
    match rules
        .iter_mut()
        .find(|r| r.rule_type() == definition.rule_type())
    {
        Some(existing) => {
            existing.absorb(&definition);
            existing.clone()
        }
        None => {
            rules.push(definition.clone());
            definition
        }
    }
}
