//! # Validating Builder
//!
//! Incremental, single-owner construction of one record. Mutations are
//! checked eagerly against the mutation-time constraints; everything else
//! is checked once, by the validator, when the record is built.
//!
//! ## States
//!
//! ```text
//! Open ──build()──▶ Built (Ok(Record))
//!   │
//!   └──build()──▶ Failed (Err(ValidationError))
//! ```
//!
//! `build` consumes the builder, so neither terminal state can be mutated
//! again; there is no way back to `Open`.
//!
//! ## Eager checks
//!
//! - **set-once, singular.** The field locks once it holds a non-default
//!   value. Any later `set`, a `merge` touching it, or `clear` fails,
//!   even when the offered value equals the stored one. An explicit
//!   default does not lock.
//! - **set-once, repeated/map.** Any number of `add`/`put` calls populate
//!   the field. Clearing a populated field spends it; any later
//!   population fails.
//! - **distinct.** Each repeated field with a distinct constraint keeps a
//!   seen-set next to its value. A duplicate fails under `error` and is
//!   dropped under `ignore`.
//!
//! A failed mutation has no effect. `add_all` and `merge` are
//! all-or-nothing.

use std::collections::{BTreeMap, HashSet};

use msgcheck_core::{
    Cardinality, Constraint, ConstraintKind, DistinctPolicy, FieldDescriptor, FieldPath,
    FieldValue, MapKey, MapKeyKind, MessageDescriptor, Record, TypeName, Value, ValueKind,
};
use msgcheck_rules::ConstraintSet;
use msgcheck_validate::{ValidationError, Validator, Violation};

use crate::error::BuilderError;

// ─── Per-field state ─────────────────────────────────────────────────

/// Mutation-time constraints of one field.
#[derive(Debug, Clone, Copy, Default)]
struct Policy {
    set_once: bool,
    distinct: Option<DistinctPolicy>,
}

impl Policy {
    fn from_constraints(constraints: &ConstraintSet) -> Self {
        let distinct = match constraints.constraint(ConstraintKind::Distinct) {
            Some(Constraint::Distinct(policy)) => Some(*policy),
            _ => None,
        };
        Self {
            set_once: constraints.contains(ConstraintKind::SetOnce),
            distinct,
        }
    }
}

/// Working value of one field plus its tracked flags.
#[derive(Debug, Clone, Default)]
struct Slot {
    value: Option<FieldValue>,
    /// Singular set-once field holding a non-default value.
    locked: bool,
    /// Collection set-once field cleared after being populated.
    spent: bool,
    seen: HashSet<Value>,
}

impl Slot {
    fn set(&mut self, value: Value, policy: Policy, at: &At<'_>) -> Result<(), BuilderError> {
        if self.locked {
            return Err(at.set_once());
        }
        self.locked = policy.set_once && !value.is_default();
        self.value = Some(FieldValue::Singular(value));
        Ok(())
    }

    fn clear(&mut self, policy: Policy, at: &At<'_>) -> Result<(), BuilderError> {
        if self.locked {
            return Err(at.set_once());
        }
        if policy.set_once && self.value.as_ref().is_some_and(FieldValue::is_present) {
            self.spent = true;
        }
        self.value = None;
        self.seen.clear();
        Ok(())
    }

    fn add(&mut self, element: Value, policy: Policy, at: &At<'_>) -> Result<(), BuilderError> {
        if self.spent {
            return Err(at.set_once());
        }
        if let Some(distinct) = policy.distinct {
            if self.seen.contains(&element) {
                return match distinct {
                    DistinctPolicy::Ignore => Ok(()),
                    DistinctPolicy::Error => {
                        let existing = match &self.value {
                            Some(FieldValue::Repeated(items)) => items.iter().position(|v| *v == element),
                            _ => None,
                        };
                        Err(BuilderError::DuplicateElementViolation {
                            field: at.field.to_string(),
                            path: existing.map_or_else(|| at.path.clone(), |i| at.path.at_index(i)),
                            value: element.to_string(),
                        })
                    }
                };
            }
            self.seen.insert(element.clone());
        }
        match &mut self.value {
            Some(FieldValue::Repeated(items)) => items.push(element),
            _ => self.value = Some(FieldValue::Repeated(vec![element])),
        }
        Ok(())
    }

    fn put(&mut self, key: MapKey, value: Value, at: &At<'_>) -> Result<(), BuilderError> {
        if self.spent {
            return Err(at.set_once());
        }
        match &mut self.value {
            Some(FieldValue::Map(entries)) => {
                entries.insert(key, value);
            }
            _ => self.value = Some(FieldValue::Map(BTreeMap::from([(key, value)]))),
        }
        Ok(())
    }
}

/// The field a mutation addresses.
struct At<'a> {
    field: &'a str,
    path: FieldPath,
}

impl At<'_> {
    fn set_once(&self) -> BuilderError {
        tracing::debug!(path = %self.path, "set-once field refused a change");
        BuilderError::SetOnceViolation {
            field: self.field.to_string(),
            path: self.path.clone(),
        }
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Builds one record of a known type.
///
/// Not shareable across threads for mutation; each builder is owned by
/// one caller and shares nothing mutable with other builders or with the
/// registry.
#[derive(Debug)]
pub struct ValidatingBuilder {
    validator: Validator,
    descriptor: MessageDescriptor,
    policies: BTreeMap<String, Policy>,
    slots: BTreeMap<String, Slot>,
}

impl ValidatingBuilder {
    /// An empty builder for `type_name`.
    ///
    /// # Errors
    ///
    /// [`BuilderError::UnknownType`] if the validator's schema does not
    /// know the type.
    pub fn new(validator: Validator, type_name: &TypeName) -> Result<Self, BuilderError> {
        let descriptor = validator
            .descriptor(type_name)
            .cloned()
            .ok_or_else(|| BuilderError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        let policies = descriptor
            .fields()
            .iter()
            .map(|field| {
                let path = FieldPath::of(type_name.clone(), field.name());
                let policy = Policy::from_constraints(&validator.constraints_for(&path));
                (field.name().to_string(), policy)
            })
            .collect();
        Ok(Self {
            validator,
            descriptor,
            policies,
            slots: BTreeMap::new(),
        })
    }

    /// A builder seeded from `record`, as if every present field had been
    /// merged in. Set-once fields holding values start locked.
    ///
    /// # Errors
    ///
    /// As [`ValidatingBuilder::new`] and [`ValidatingBuilder::merge`].
    pub fn from_record(validator: Validator, record: &Record) -> Result<Self, BuilderError> {
        let mut builder = Self::new(validator, record.type_name())?;
        builder.merge(record)?;
        Ok(builder)
    }

    /// The record type under construction.
    pub fn type_name(&self) -> &TypeName {
        self.descriptor.name()
    }

    /// Assign a singular field.
    ///
    /// # Errors
    ///
    /// [`BuilderError::SetOnceViolation`] if the field is set-once and
    /// already locked; shape and kind errors otherwise.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self, BuilderError> {
        let value = value.into();
        let desc = lookup(&self.descriptor, field)?;
        let at = self.at(field);
        if desc.cardinality() != Cardinality::Singular {
            return Err(cardinality_mismatch(&at, "singular", desc.cardinality()));
        }
        expect_kind(desc.kind(), &value, &at)?;
        let policy = self.policy(field);
        self.slots.entry(field.to_string()).or_default().set(value, policy, &at)?;
        Ok(self)
    }

    /// Unset a field of any cardinality.
    ///
    /// # Errors
    ///
    /// [`BuilderError::SetOnceViolation`] if the field is a locked
    /// singular set-once field.
    pub fn clear(&mut self, field: &str) -> Result<&mut Self, BuilderError> {
        lookup(&self.descriptor, field)?;
        let at = self.at(field);
        let policy = self.policy(field);
        if let Some(slot) = self.slots.get_mut(field) {
            slot.clear(policy, &at)?;
        }
        Ok(self)
    }

    /// Append one element to a repeated field. Under `distinct: ignore` a
    /// duplicate is dropped and the call succeeds.
    ///
    /// # Errors
    ///
    /// [`BuilderError::DuplicateElementViolation`] under `distinct: error`;
    /// [`BuilderError::SetOnceViolation`] if the field is spent.
    pub fn add(&mut self, field: &str, element: impl Into<Value>) -> Result<&mut Self, BuilderError> {
        let element = element.into();
        let desc = lookup(&self.descriptor, field)?;
        let at = self.at(field);
        if desc.cardinality() != Cardinality::Repeated {
            return Err(cardinality_mismatch(&at, "repeated", desc.cardinality()));
        }
        expect_kind(desc.kind(), &element, &at)?;
        let policy = self.policy(field);
        self.slots.entry(field.to_string()).or_default().add(element, policy, &at)?;
        Ok(self)
    }

    /// Append several elements; on any failure none are kept.
    pub fn add_all<I, V>(&mut self, field: &str, elements: I) -> Result<&mut Self, BuilderError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let before = self.slots.get(field).cloned();
        for element in elements {
            let added = self.add(field, element).map(|_| ());
            if let Err(e) = added {
                match before {
                    Some(slot) => self.slots.insert(field.to_string(), slot),
                    None => self.slots.remove(field),
                };
                return Err(e);
            }
        }
        Ok(self)
    }

    /// Insert or replace one entry of a map field.
    ///
    /// # Errors
    ///
    /// [`BuilderError::SetOnceViolation`] if the field is spent; shape and
    /// kind errors for the key or value otherwise.
    pub fn put(
        &mut self,
        field: &str,
        key: impl Into<MapKey>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, BuilderError> {
        let (key, value) = (key.into(), value.into());
        let desc = lookup(&self.descriptor, field)?;
        let at = self.at(field);
        let Cardinality::Map { key: key_kind } = desc.cardinality() else {
            return Err(cardinality_mismatch(&at, "map", desc.cardinality()));
        };
        if !key.kind_matches(key_kind) {
            return Err(BuilderError::KindMismatch {
                path: at.path.clone(),
                expected: format!("{} keys", key_kind_name(key_kind)),
                found: format!("{} key", key_name(&key)),
            });
        }
        expect_kind(desc.kind(), &value, &at)?;
        self.slots.entry(field.to_string()).or_default().put(key, value, &at)?;
        Ok(self)
    }

    /// Apply every present field of `other`: singular fields are set,
    /// repeated elements added, map entries put. All-or-nothing.
    ///
    /// # Errors
    ///
    /// [`BuilderError::RecordTypeMismatch`] for a record of another type;
    /// otherwise the first failure of the underlying mutation, after which
    /// the builder is as it was before the call.
    pub fn merge(&mut self, other: &Record) -> Result<&mut Self, BuilderError> {
        if other.type_name() != self.descriptor.name() {
            return Err(BuilderError::RecordTypeMismatch {
                expected: self.descriptor.name().to_string(),
                found: other.type_name().to_string(),
            });
        }
        let before = self.slots.clone();
        if let Err(e) = self.merge_fields(other) {
            self.slots = before;
            return Err(e);
        }
        Ok(self)
    }

    fn merge_fields(&mut self, other: &Record) -> Result<(), BuilderError> {
        for (field, value) in other.fields() {
            if !value.is_present() {
                continue;
            }
            match value {
                FieldValue::Singular(v) => {
                    self.set(field, v.clone())?;
                }
                FieldValue::Repeated(items) => {
                    for item in items {
                        self.add(field, item.clone())?;
                    }
                }
                FieldValue::Map(entries) => {
                    for (k, v) in entries {
                        self.put(field, k.clone(), v.clone())?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The current working value of a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.slots.get(field).and_then(|slot| slot.value.as_ref())
    }

    /// Violations the working copy would fail `build` with, without
    /// building.
    pub fn check(&self) -> Vec<Violation> {
        self.validator.validate(&self.to_record())
    }

    /// Validate the working copy and hand it over.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] enumerating every violation; no partial record
    /// is exposed.
    pub fn build(self) -> Result<Record, ValidationError> {
        let record = self.to_record();
        match self.validator.check(&record) {
            Ok(()) => {
                tracing::trace!(type_name = %record.type_name(), "record built");
                Ok(record)
            }
            Err(e) => {
                tracing::debug!(
                    type_name = %record.type_name(),
                    violations = e.violations.len(),
                    "record failed validation at build"
                );
                Err(e)
            }
        }
    }

    fn to_record(&self) -> Record {
        self.slots
            .iter()
            .filter_map(|(field, slot)| slot.value.as_ref().map(|v| (field, v)))
            .fold(Record::new(self.descriptor.name().clone()), |record, (field, value)| {
                record.with(field.clone(), value.clone())
            })
    }

    fn at<'a>(&self, field: &'a str) -> At<'a> {
        At {
            field,
            path: FieldPath::of(self.descriptor.name().clone(), field),
        }
    }

    fn policy(&self, field: &str) -> Policy {
        self.policies.get(field).copied().unwrap_or_default()
    }
}

// ─── Shape and kind checks ───────────────────────────────────────────

fn lookup<'a>(descriptor: &'a MessageDescriptor, field: &str) -> Result<&'a FieldDescriptor, BuilderError> {
    descriptor.field(field).ok_or_else(|| BuilderError::UnknownField {
        type_name: descriptor.name().to_string(),
        field: field.to_string(),
    })
}

fn cardinality_mismatch(at: &At<'_>, expected: &str, actual: Cardinality) -> BuilderError {
    BuilderError::CardinalityMismatch {
        path: at.path.clone(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn expect_kind(kind: &ValueKind, value: &Value, at: &At<'_>) -> Result<(), BuilderError> {
    if value.kind_matches(kind) {
        return Ok(());
    }
    Err(BuilderError::KindMismatch {
        path: at.path.clone(),
        expected: kind.to_string(),
        found: value_kind_name(value),
    })
}

fn value_kind_name(value: &Value) -> String {
    match value {
        Value::Bool(_) => "bool".to_string(),
        Value::Int(_) => "int".to_string(),
        Value::Uint(_) => "uint".to_string(),
        Value::Float(_) => "float".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Bytes(_) => "bytes".to_string(),
        Value::Enum(_) => "enum".to_string(),
        Value::Message(record) => format!("message {}", record.type_name()),
    }
}

fn key_kind_name(kind: MapKeyKind) -> &'static str {
    match kind {
        MapKeyKind::Bool => "bool",
        MapKeyKind::Int => "int",
        MapKeyKind::Uint => "uint",
        MapKeyKind::String => "string",
    }
}

fn key_name(key: &MapKey) -> &'static str {
    match key {
        MapKey::Bool(_) => "bool",
        MapKey::Int(_) => "int",
        MapKey::Uint(_) => "uint",
        MapKey::String(_) => "string",
    }
}
