//! # Record Values
//!
//! Dynamic, already-decoded record instances. This is the value-access
//! side of the schema boundary: the validator and builder read fields
//! through [`Record::get`] and never see a wire encoding.
//!
//! ## Presence
//!
//! Records store only fields that were explicitly assigned. Singular
//! scalars use implicit presence: a stored default (`""`, `0`, `false`,
//! empty bytes, enum `0`) reads the same as an unset field. Singular record
//! fields are present iff stored. Repeated and map fields are present iff
//! non-empty. See [`Record::has`].
//!
//! ## Equality
//!
//! [`Value`] implements total `Eq` and `Hash` so that values can be kept in
//! seen-sets. Floats compare by bit pattern: `NaN` equals itself and
//! `0.0` differs from `-0.0`.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::name::TypeName;
use crate::schema::{MapKeyKind, ValueKind};

// ─── Scalar and nested values ────────────────────────────────────────

/// One field value (or one element of a repeated/map field).
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Enum number.
    Enum(i32),
    /// Nested record.
    Message(Record),
}

impl Value {
    /// Whether the value fits a declared kind.
    pub fn kind_matches(&self, kind: &ValueKind) -> bool {
        match (self, kind) {
            (Self::Bool(_), ValueKind::Bool)
            | (Self::Int(_), ValueKind::Int)
            | (Self::Uint(_), ValueKind::Uint)
            | (Self::Float(_), ValueKind::Float)
            | (Self::String(_), ValueKind::String)
            | (Self::Bytes(_), ValueKind::Bytes)
            | (Self::Enum(_), ValueKind::Enum) => true,
            (Self::Message(record), ValueKind::Message(type_name)) => {
                record.type_name() == type_name
            }
            _ => false,
        }
    }

    /// Whether this is the default value of its kind. Records are never
    /// default: an explicitly stored record is present.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Int(n) => *n == 0,
            Self::Uint(n) => *n == 0,
            Self::Float(n) => n.to_bits() == 0,
            Self::String(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::Enum(n) => *n == 0,
            Self::Message(_) => false,
        }
    }

    /// The default value for a scalar kind. `None` for record kinds, which
    /// have no default instance.
    pub fn default_for(kind: &ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Bool => Some(Self::Bool(false)),
            ValueKind::Int => Some(Self::Int(0)),
            ValueKind::Uint => Some(Self::Uint(0)),
            ValueKind::Float => Some(Self::Float(0.0)),
            ValueKind::String => Some(Self::String(String::new())),
            ValueKind::Bytes => Some(Self::Bytes(Vec::new())),
            ValueKind::Enum => Some(Self::Enum(0)),
            ValueKind::Message(_) => None,
        }
    }

    /// Text view, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Nested record view, if this is a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Message(r) => Some(r),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Uint(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::Enum(n) => n.hash(state),
            Self::Message(r) => r.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Enum(n) => write!(f, "#{n}"),
            Self::Message(r) => write!(f, "{r}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Message(v)
    }
}

// ─── Map keys ────────────────────────────────────────────────────────

/// Key of a map field entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    /// Boolean key.
    Bool(bool),
    /// Signed integer key.
    Int(i64),
    /// Unsigned integer key.
    Uint(u64),
    /// Text key.
    String(String),
}

impl MapKey {
    /// Whether the key fits a declared key kind.
    pub fn kind_matches(&self, kind: MapKeyKind) -> bool {
        matches!(
            (self, kind),
            (Self::Bool(_), MapKeyKind::Bool)
                | (Self::Int(_), MapKeyKind::Int)
                | (Self::Uint(_), MapKeyKind::Uint)
                | (Self::String(_), MapKeyKind::String)
        )
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for MapKey {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<bool> for MapKey {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MapKey {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for MapKey {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

// ─── Field values ────────────────────────────────────────────────────

/// The stored content of one field, shaped by its cardinality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// A singular field.
    Singular(Value),
    /// A repeated field, in insertion order.
    Repeated(Vec<Value>),
    /// A map field, ordered by key.
    Map(BTreeMap<MapKey, Value>),
}

impl FieldValue {
    /// Whether the field counts as present (see module docs).
    pub fn is_present(&self) -> bool {
        match self {
            Self::Singular(v) => !v.is_default(),
            Self::Repeated(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
        }
    }
}

// ─── Record ──────────────────────────────────────────────────────────

/// An immutable record instance of a named type.
///
/// Fields are keyed by name; iteration order of [`Record::fields`] is by
/// name, while validation follows the schema's declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    type_name: TypeName,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// An empty record: every field unset.
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            fields: BTreeMap::new(),
        }
    }

    /// Return this record with `field` replaced.
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Shorthand for a singular field.
    pub fn with_value(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, FieldValue::Singular(value.into()))
    }

    /// Shorthand for a repeated field.
    pub fn with_items<I, V>(self, field: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with(
            field,
            FieldValue::Repeated(items.into_iter().map(Into::into).collect()),
        )
    }

    /// The record's type.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The stored value of a field, or `None` if never assigned.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Whether `field` counts as present.
    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(FieldValue::is_present)
    }

    /// All stored fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of stored fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is stored.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            match value {
                FieldValue::Singular(v) => write!(f, "{name}: {v}")?,
                FieldValue::Repeated(items) => {
                    write!(f, "{name}: [")?;
                    for (j, item) in items.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{item}")?;
                    }
                    f.write_str("]")?;
                }
                FieldValue::Map(entries) => {
                    write!(f, "{name}: {{")?;
                    for (j, (k, v)) in entries.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{k}: {v}")?;
                    }
                    f.write_str("}")?;
                }
            }
        }
        if self.fields.is_empty() {
            f.write_str("}")
        } else {
            f.write_str(" }")
        }
    }
}
