//! # Schema Declarations
//!
//! Serde model for schema declaration documents (YAML or JSON) and their
//! conversion into checked [`MessageDescriptor`]s.
//!
//! ```yaml
//! types:
//!   - name: acme.orders.Order
//!     fields:
//!       - name: id
//!         kind: string
//!         constraints: { required: true, pattern: "ORD-[0-9]+" }
//!       - name: amount
//!         kind: { message: acme.orders.Money }
//!         constraints: { required: { message: "an order needs an amount" } }
//!       - name: tags
//!         kind: string
//!         cardinality: repeated
//!         constraints: { distinct: error }
//!   - name: acme.orders.PositiveMoney
//!     rule_target: "Order.amount"
//!     fields:
//!       - name: units
//!         kind: int
//!         constraints: { range: "[1..]" }
//! ```
//!
//! Patterns are compiled and ranges parsed here, once, so a malformed
//! declaration fails at load time and never at validation time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constraint::{Bound, Constraint, DistinctPolicy, Number, Pattern, Range};
use crate::error::SchemaError;
use crate::name::TypeName;
use crate::schema::{Cardinality, FieldDescriptor, MapKeyKind, MessageDescriptor, TypeSet, ValueKind};

/// A declaration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Declared types, in order.
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// One declared record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    /// Fully qualified name.
    pub name: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Target specification; present on rule-shaped types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_target: Option<String>,
    /// Fully qualified names of nested types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<String>,
}

/// One declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Value kind.
    pub kind: KindDecl,
    /// Singular (default), repeated, or map.
    #[serde(default)]
    pub cardinality: CardinalityDecl,
    /// Map key kind; defaults to string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<MapKeyKind>,
    /// Constraints declared on this field.
    #[serde(default)]
    pub constraints: ConstraintDecls,
}

/// A field's value kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindDecl {
    /// A scalar kind name.
    Scalar(ScalarKind),
    /// A nested record type.
    Message {
        /// Fully qualified record type name.
        message: String,
    },
}

/// Scalar kind names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `uint`
    Uint,
    /// `float`
    Float,
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// `enum`
    Enum,
}

/// Declared cardinality.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityDecl {
    /// One value.
    #[default]
    Singular,
    /// A list.
    Repeated,
    /// Key/value entries.
    Map,
}

/// Constraints declared on one field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintDecls {
    /// `true`, or `{ message }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<RequiredDecl>,
    /// A regex, or `{ regex, message }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternDecl>,
    /// Interval notation, or explicit bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeDecl>,
    /// Report nested violations under this field.
    #[serde(default)]
    pub validated: bool,
    /// `true`, `error`, or `ignore`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<DistinctDecl>,
    /// Value may be assigned once.
    #[serde(default)]
    pub set_once: bool,
}

/// `required` declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredDecl {
    /// `required: true`
    Flag(bool),
    /// `required: { message: ... }`
    Detailed {
        /// Message override.
        message: Option<String>,
    },
}

/// `pattern` declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternDecl {
    /// `pattern: "[a-z]+"`
    Source(String),
    /// `pattern: { regex: ..., message: ... }`
    Detailed {
        /// The regular expression.
        regex: String,
        /// Message override.
        #[serde(default)]
        message: Option<String>,
    },
}

/// A numeric literal in a range declaration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberDecl {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer beyond `i64`.
    Uint(u64),
    /// Floating point.
    Float(f64),
}

impl From<NumberDecl> for Number {
    fn from(n: NumberDecl) -> Self {
        match n {
            NumberDecl::Int(v) => Number::Int(v),
            NumberDecl::Uint(v) => Number::Uint(v),
            NumberDecl::Float(v) => Number::Float(v),
        }
    }
}

fn inclusive() -> bool {
    true
}

/// `range` declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeDecl {
    /// `range: "[0..100)"`
    Notation(String),
    /// Explicit bounds, or notation with a message override.
    Detailed {
        /// Interval notation; takes precedence over explicit bounds.
        #[serde(default)]
        notation: Option<String>,
        /// Lower bound.
        #[serde(default)]
        min: Option<NumberDecl>,
        /// Upper bound.
        #[serde(default)]
        max: Option<NumberDecl>,
        /// Whether `min` itself is allowed.
        #[serde(default = "inclusive")]
        min_inclusive: bool,
        /// Whether `max` itself is allowed.
        #[serde(default = "inclusive")]
        max_inclusive: bool,
        /// Message override.
        #[serde(default)]
        message: Option<String>,
    },
}

/// `distinct` declaration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistinctDecl {
    /// `distinct: true` means policy `error`.
    Flag(bool),
    /// `distinct: error` or `distinct: ignore`.
    Policy(PolicyDecl),
}

/// Named distinct policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecl {
    /// Reject duplicates.
    Error,
    /// Drop duplicates silently.
    Ignore,
}

// ─── Conversion ──────────────────────────────────────────────────────

impl ConstraintDecls {
    /// Compile into constraints, in kind order.
    pub fn compile(&self) -> Result<Vec<Constraint>, SchemaError> {
        let mut out = Vec::new();

        match &self.required {
            Some(RequiredDecl::Flag(true)) => out.push(Constraint::required()),
            Some(RequiredDecl::Detailed { message }) => out.push(Constraint::Required {
                message: message.clone(),
            }),
            Some(RequiredDecl::Flag(false)) | None => {}
        }

        match &self.pattern {
            Some(PatternDecl::Source(source)) => {
                out.push(Constraint::Pattern(Pattern::new(source.clone(), None)?));
            }
            Some(PatternDecl::Detailed { regex, message }) => {
                out.push(Constraint::Pattern(Pattern::new(regex.clone(), message.clone())?));
            }
            None => {}
        }

        match &self.range {
            Some(RangeDecl::Notation(notation)) => {
                out.push(Constraint::Range(Range::parse(notation, None)?));
            }
            Some(RangeDecl::Detailed {
                notation,
                min,
                max,
                min_inclusive,
                max_inclusive,
                message,
            }) => {
                let range = match notation {
                    Some(n) => Range::parse(n, message.clone())?,
                    None => Range::new(
                        min.map(|v| Bound { value: v.into(), inclusive: *min_inclusive }),
                        max.map(|v| Bound { value: v.into(), inclusive: *max_inclusive }),
                        message.clone(),
                    )?,
                };
                out.push(Constraint::Range(range));
            }
            None => {}
        }

        if self.validated {
            out.push(Constraint::Validated);
        }

        match self.distinct {
            Some(DistinctDecl::Flag(true)) | Some(DistinctDecl::Policy(PolicyDecl::Error)) => {
                out.push(Constraint::Distinct(DistinctPolicy::Error));
            }
            Some(DistinctDecl::Policy(PolicyDecl::Ignore)) => {
                out.push(Constraint::Distinct(DistinctPolicy::Ignore));
            }
            Some(DistinctDecl::Flag(false)) | None => {}
        }

        if self.set_once {
            out.push(Constraint::SetOnce);
        }

        Ok(out)
    }
}

impl FieldDecl {
    /// Convert into a checked descriptor owned by `owner`.
    pub fn to_descriptor(&self, owner: &TypeName) -> Result<FieldDescriptor, SchemaError> {
        let kind = match &self.kind {
            KindDecl::Scalar(ScalarKind::Bool) => ValueKind::Bool,
            KindDecl::Scalar(ScalarKind::Int) => ValueKind::Int,
            KindDecl::Scalar(ScalarKind::Uint) => ValueKind::Uint,
            KindDecl::Scalar(ScalarKind::Float) => ValueKind::Float,
            KindDecl::Scalar(ScalarKind::String) => ValueKind::String,
            KindDecl::Scalar(ScalarKind::Bytes) => ValueKind::Bytes,
            KindDecl::Scalar(ScalarKind::Enum) => ValueKind::Enum,
            KindDecl::Message { message } => ValueKind::Message(TypeName::new(message.clone())?),
        };
        let cardinality = match self.cardinality {
            CardinalityDecl::Singular => Cardinality::Singular,
            CardinalityDecl::Repeated => Cardinality::Repeated,
            CardinalityDecl::Map => Cardinality::Map {
                key: self.key.unwrap_or(MapKeyKind::String),
            },
        };
        FieldDescriptor::new(
            owner,
            self.name.clone(),
            cardinality,
            kind,
            self.constraints.compile()?,
        )
    }
}

impl TypeDecl {
    /// Convert into a checked descriptor.
    pub fn to_descriptor(&self) -> Result<MessageDescriptor, SchemaError> {
        let name = TypeName::new(self.name.clone())?;
        let fields = self
            .fields
            .iter()
            .map(|f| f.to_descriptor(&name))
            .collect::<Result<Vec<_>, _>>()?;
        let nested = self
            .nested
            .iter()
            .map(|n| TypeName::new(n.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        MessageDescriptor::new(name, fields, self.rule_target.clone(), nested)
    }
}

impl SchemaDocument {
    /// Parse a YAML document.
    pub fn from_yaml_str(source_name: &str, text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::Load {
            source_name: source_name.to_string(),
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Parse a JSON document.
    pub fn from_json_str(source_name: &str, text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Load {
            source_name: source_name.to_string(),
            reason: format!("invalid JSON: {e}"),
        })
    }

    /// Convert every declared type into a checked descriptor.
    pub fn to_descriptors(&self) -> Result<Vec<MessageDescriptor>, SchemaError> {
        self.types.iter().map(TypeDecl::to_descriptor).collect()
    }
}

// ─── Loading ─────────────────────────────────────────────────────────

impl TypeSet {
    /// Build a type set from one YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let doc = SchemaDocument::from_yaml_str("<inline>", text)?;
        Self::from_descriptors(doc.to_descriptors()?)
    }

    /// Build a type set from one JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let doc = SchemaDocument::from_json_str("<inline>", text)?;
        Self::from_descriptors(doc.to_descriptors()?)
    }

    /// Load every `*.yaml`, `*.yml`, and `*.json` file in `dir`, in
    /// file-name order, into one type set.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Load`] naming the file if any document
    /// cannot be read or parsed, and the usual descriptor errors if a
    /// declaration is invalid. A type declared again by a later file is
    /// [`SchemaError::RedeclaredType`], naming both files.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::Load {
            source_name: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if path.is_file() && matches!(ext, "yaml" | "yml" | "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut set = Self::new();
        let mut declared_in: BTreeMap<TypeName, PathBuf> = BTreeMap::new();
        for path in files {
            let doc = load_file(&path)?;
            let descriptors = doc.to_descriptors()?;
            tracing::debug!(
                file = %path.display(),
                types = descriptors.len(),
                "loaded schema declarations"
            );
            for descriptor in descriptors {
                let name = descriptor.name().clone();
                if let Some(first) = declared_in.get(&name) {
                    return Err(SchemaError::RedeclaredType {
                        type_name: name.to_string(),
                        file: path.display().to_string(),
                        first_file: first.display().to_string(),
                    });
                }
                set.insert(descriptor)?;
                declared_in.insert(name, path.clone());
            }
        }
        Ok(set)
    }
}

/// Read and parse one declaration file, choosing the format by extension.
pub fn load_file(path: &Path) -> Result<SchemaDocument, SchemaError> {
    let name = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
        source_name: name.clone(),
        reason: format!("cannot read file: {e}"),
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => SchemaDocument::from_json_str(&name, &text),
        _ => SchemaDocument::from_yaml_str(&name, &text),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
