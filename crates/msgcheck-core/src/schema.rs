//! # Schema Descriptors
//!
//! Read-only reflection of record types: declared fields in declaration
//! order, their cardinality and value kind, and the constraints declared
//! directly on them. This is the schema-introspection boundary consumed by
//! the rule registry (binding checks) and the validator (recursion).
//!
//! ## Security Invariant
//!
//! Descriptors are checked at construction. A constraint that cannot apply
//! to its field (a pattern on an integer, distinct on a singular field) is
//! rejected here with [`SchemaError::InapplicableConstraint`], so evaluation
//! never has to guess what an inapplicable constraint would mean.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, ConstraintKind};
use crate::error::SchemaError;
use crate::name::TypeName;

// ─── Kinds ───────────────────────────────────────────────────────────

/// Key kind of a map field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKeyKind {
    /// Boolean keys.
    Bool,
    /// Signed integer keys.
    Int,
    /// Unsigned integer keys.
    Uint,
    /// Text keys.
    String,
}

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one value (possibly unset).
    Singular,
    /// An ordered list of values.
    Repeated,
    /// Key/value entries.
    Map {
        /// Kind of the entry keys.
        key: MapKeyKind,
    },
}

impl Cardinality {
    /// Whether the field holds a collection.
    pub fn is_collection(&self) -> bool {
        !matches!(self, Self::Singular)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular => f.write_str("singular"),
            Self::Repeated => f.write_str("repeated"),
            Self::Map { key } => write!(f, "map<{key:?}>"),
        }
    }
}

/// Kind of a field's value (for maps, of the entry values).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating point.
    Float,
    /// UTF-8 text.
    String,
    /// Raw bytes.
    Bytes,
    /// Enum number.
    Enum,
    /// Nested record of the named type.
    Message(TypeName),
}

impl ValueKind {
    /// Whether values of this kind are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float)
    }

    /// The nested record type, if this is a record kind.
    pub fn message_type(&self) -> Option<&TypeName> {
        match self {
            Self::Message(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Uint => f.write_str("uint"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Enum => f.write_str("enum"),
            Self::Message(name) => write!(f, "message {name}"),
        }
    }
}

// ─── Field descriptor ────────────────────────────────────────────────

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    cardinality: Cardinality,
    kind: ValueKind,
    constraints: Vec<Constraint>,
}

impl FieldDescriptor {
    /// Build a field of `owner`, checking its name and every constraint's
    /// applicability.
    pub fn new(
        owner: &TypeName,
        name: impl Into<String>,
        cardinality: Cardinality,
        kind: ValueKind,
        constraints: Vec<Constraint>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
            return Err(SchemaError::InvalidFieldName {
                type_name: owner.to_string(),
                field: name,
            });
        }

        let mut seen: Vec<ConstraintKind> = Vec::with_capacity(constraints.len());
        for constraint in &constraints {
            let kind_of = constraint.kind();
            if seen.contains(&kind_of) {
                return Err(SchemaError::DuplicateConstraint {
                    type_name: owner.to_string(),
                    field: name,
                    kind: kind_of,
                });
            }
            seen.push(kind_of);

            if let Some(reason) = inapplicable(constraint, cardinality, &kind) {
                return Err(SchemaError::InapplicableConstraint {
                    type_name: owner.to_string(),
                    field: name,
                    kind: kind_of,
                    reason,
                });
            }
        }

        Ok(Self {
            name,
            cardinality,
            kind,
            constraints,
        })
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Singular, repeated, or map.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Value kind (map value kind for maps).
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Constraints declared directly on this field.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether the field's values are records.
    pub fn is_message(&self) -> bool {
        self.kind.message_type().is_some()
    }

    /// Whether another field has the same cardinality and value kind.
    pub fn shape_matches(&self, other: &FieldDescriptor) -> bool {
        self.cardinality == other.cardinality && self.kind == other.kind
    }
}

/// Why `constraint` cannot apply to a field of this shape, if it cannot.
fn inapplicable(constraint: &Constraint, cardinality: Cardinality, kind: &ValueKind) -> Option<String> {
    match constraint {
        Constraint::Required { .. } | Constraint::SetOnce => None,
        Constraint::Pattern(_) if *kind != ValueKind::String => {
            Some(format!("pattern needs string values, field holds {kind}"))
        }
        Constraint::Range(_) if !kind.is_numeric() => {
            Some(format!("range needs numeric values, field holds {kind}"))
        }
        Constraint::Validated if kind.message_type().is_none() => {
            Some(format!("validated needs record values, field holds {kind}"))
        }
        Constraint::Distinct(_) if cardinality != Cardinality::Repeated => {
            Some(format!("distinct needs a repeated field, field is {cardinality}"))
        }
        Constraint::Pattern(_)
        | Constraint::Range(_)
        | Constraint::Validated
        | Constraint::Distinct(_) => None,
    }
}

// ─── Message descriptor ──────────────────────────────────────────────

/// One declared record type.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDescriptor {
    name: TypeName,
    fields: Vec<FieldDescriptor>,
    rule_target: Option<String>,
    nested: Vec<TypeName>,
}

impl MessageDescriptor {
    /// Build a record type. Field names must be unique.
    pub fn new(
        name: TypeName,
        fields: Vec<FieldDescriptor>,
        rule_target: Option<String>,
        nested: Vec<TypeName>,
    ) -> Result<Self, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    type_name: name.to_string(),
                    field: field.name.clone(),
                });
            }
        }
        let rule_target = rule_target.filter(|t| !t.trim().is_empty());
        Ok(Self {
            name,
            fields,
            rule_target,
            nested,
        })
    }

    /// The type name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The target specification, if this type is rule-shaped.
    pub fn rule_target(&self) -> Option<&str> {
        self.rule_target.as_deref()
    }

    /// Whether this type declares a non-empty target specification.
    pub fn is_rule_shaped(&self) -> bool {
        self.rule_target.is_some()
    }

    /// Types declared inside this one.
    pub fn nested(&self) -> &[TypeName] {
        &self.nested
    }
}

// ─── Schema source ───────────────────────────────────────────────────

/// Read-only schema introspection.
pub trait SchemaSource: Send + Sync {
    /// The descriptor of a type, if known.
    fn descriptor(&self, name: &TypeName) -> Option<&MessageDescriptor>;

    /// Whether a type is known.
    fn contains(&self, name: &TypeName) -> bool {
        self.descriptor(name).is_some()
    }
}

/// An ordered set of record type descriptors.
///
/// Iteration follows insertion order, so registration and index building
/// are reproducible for a fixed input.
#[derive(Debug, Clone, Default)]
pub struct TypeSet {
    order: Vec<Arc<MessageDescriptor>>,
    by_name: BTreeMap<TypeName, usize>,
}

impl TypeSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, rejecting duplicate names.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = MessageDescriptor>,
    {
        let mut set = Self::new();
        for descriptor in descriptors {
            set.insert(descriptor)?;
        }
        Ok(set)
    }

    /// Add a type.
    pub fn insert(&mut self, descriptor: MessageDescriptor) -> Result<(), SchemaError> {
        if self.by_name.contains_key(descriptor.name()) {
            return Err(SchemaError::DuplicateType(descriptor.name().to_string()));
        }
        self.by_name
            .insert(descriptor.name().clone(), self.order.len());
        self.order.push(Arc::new(descriptor));
        Ok(())
    }

    /// Add every type of `other` not already present; returns the names
    /// actually added, in order.
    pub fn absorb(&mut self, other: &TypeSet) -> Vec<TypeName> {
        let mut added = Vec::new();
        for descriptor in &other.order {
            if self.by_name.contains_key(descriptor.name()) {
                continue;
            }
            self.by_name
                .insert(descriptor.name().clone(), self.order.len());
            self.order.push(Arc::clone(descriptor));
            added.push(descriptor.name().clone());
        }
        added
    }

    /// Descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.order.iter().map(|d| d.as_ref())
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl SchemaSource for TypeSet {
    fn descriptor(&self, name: &TypeName) -> Option<&MessageDescriptor> {
        self.by_name.get(name).map(|&i| self.order[i].as_ref())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{DistinctPolicy, Pattern, Range};

    fn owner() -> TypeName {
        TypeName::new("acme.Order").unwrap()
    }

    fn field(name: &str, cardinality: Cardinality, kind: ValueKind, constraints: Vec<Constraint>) -> Result<FieldDescriptor, SchemaError> {
        FieldDescriptor::new(&owner(), name, cardinality, kind, constraints)
    }

    #[test]
    fn test_pattern_only_on_strings() {
        let pattern = Constraint::Pattern(Pattern::new("[0-9]+", None).unwrap());
        assert!(field("id", Cardinality::Singular, ValueKind::String, vec![pattern.clone()]).is_ok());
        assert!(field("ids", Cardinality::Repeated, ValueKind::String, vec![pattern.clone()]).is_ok());
        let err = field("n", Cardinality::Singular, ValueKind::Int, vec![pattern]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InapplicableConstraint { kind: ConstraintKind::Pattern, .. }
        ));
    }

    #[test]
    fn test_range_only_on_numbers() {
        let range = Constraint::Range(Range::parse("[0..]", None).unwrap());
        assert!(field("n", Cardinality::Singular, ValueKind::Uint, vec![range.clone()]).is_ok());
        assert!(field("s", Cardinality::Singular, ValueKind::Bytes, vec![range]).is_err());
    }

    #[test]
    fn test_distinct_only_on_repeated() {
        let distinct = Constraint::Distinct(DistinctPolicy::Error);
        assert!(field("tags", Cardinality::Repeated, ValueKind::String, vec![distinct.clone()]).is_ok());
        assert!(field("tag", Cardinality::Singular, ValueKind::String, vec![distinct.clone()]).is_err());
        let map = Cardinality::Map { key: MapKeyKind::String };
        assert!(field("labels", map, ValueKind::String, vec![distinct]).is_err());
    }

    #[test]
    fn test_validated_only_on_records() {
        let money = ValueKind::Message(TypeName::new("acme.Money").unwrap());
        assert!(field("amount", Cardinality::Singular, money, vec![Constraint::Validated]).is_ok());
        assert!(field("n", Cardinality::Singular, ValueKind::Int, vec![Constraint::Validated]).is_err());
    }

    #[test]
    fn test_duplicate_constraint_kind_rejected() {
        let err = field(
            "id",
            Cardinality::Singular,
            ValueKind::String,
            vec![Constraint::required(), Constraint::required()],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConstraint { .. }));
    }

    #[test]
    fn test_invalid_field_names() {
        for bad in ["", "a.b", "a b"] {
            assert!(field(bad, Cardinality::Singular, ValueKind::Int, vec![]).is_err());
        }
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let a = field("id", Cardinality::Singular, ValueKind::String, vec![]).unwrap();
        let err = MessageDescriptor::new(owner(), vec![a.clone(), a], None, vec![]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn test_blank_rule_target_is_not_rule_shaped() {
        let d = MessageDescriptor::new(owner(), vec![], Some("  ".into()), vec![]).unwrap();
        assert!(!d.is_rule_shaped());
        let r = MessageDescriptor::new(owner(), vec![], Some("Other.f".into()), vec![]).unwrap();
        assert!(r.is_rule_shaped());
    }

    #[test]
    fn test_type_set_preserves_order_and_rejects_duplicates() {
        let a = MessageDescriptor::new(TypeName::new("z.A").unwrap(), vec![], None, vec![]).unwrap();
        let b = MessageDescriptor::new(TypeName::new("a.B").unwrap(), vec![], None, vec![]).unwrap();
        let mut set = TypeSet::from_descriptors([a.clone(), b]).unwrap();
        let names: Vec<&str> = set.iter().map(|d| d.name().as_str()).collect();
        assert_eq!(names, vec!["z.A", "a.B"]);
        assert!(matches!(set.insert(a), Err(SchemaError::DuplicateType(_))));
    }

    #[test]
    fn test_absorb_skips_known_types() {
        let a = MessageDescriptor::new(TypeName::new("x.A").unwrap(), vec![], None, vec![]).unwrap();
        let b = MessageDescriptor::new(TypeName::new("x.B").unwrap(), vec![], None, vec![]).unwrap();
        let mut set = TypeSet::from_descriptors([a.clone()]).unwrap();
        let other = TypeSet::from_descriptors([a, b]).unwrap();
        let added = set.absorb(&other);
        assert_eq!(added, vec![TypeName::new("x.B").unwrap()]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&TypeName::new("x.A").unwrap()));
    }
}
