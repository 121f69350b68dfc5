//! # Constraint Model
//!
//! The closed set of declarative constraints a field can carry. Every
//! consumer (index, validator, builder) matches [`Constraint`] exhaustively,
//! so adding a kind is a compile-checked change in each of them.
//!
//! ## Kinds
//!
//! | Kind        | Enforced by            | Meaning                                       |
//! |-------------|------------------------|-----------------------------------------------|
//! | `required`  | validator              | field present / collection non-empty          |
//! | `pattern`   | validator              | text fully matches a regular expression       |
//! | `range`     | validator              | numeric value within declared bounds          |
//! | `validated` | validator              | nested record violations reported under field |
//! | `distinct`  | validator and builder  | no duplicate elements in a repeated field     |
//! | `set_once`  | builder only           | value may not change once set                 |

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

use crate::error::SchemaError;
use crate::value::Value;

// ─── Kinds ───────────────────────────────────────────────────────────

/// Discriminant of a [`Constraint`], ordered by evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    /// Field must be present.
    Required,
    /// Text must match a pattern.
    Pattern,
    /// Number must lie within bounds.
    Range,
    /// Nested record violations are attached under the field.
    Validated,
    /// Repeated elements must be unique.
    Distinct,
    /// Value may be assigned at most once.
    SetOnce,
}

impl ConstraintKind {
    /// All kinds in evaluation order.
    pub const ALL: [ConstraintKind; 6] = [
        Self::Required,
        Self::Pattern,
        Self::Range,
        Self::Validated,
        Self::Distinct,
        Self::SetOnce,
    ];

    /// Declaration key for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Pattern => "pattern",
            Self::Range => "range",
            Self::Validated => "validated",
            Self::Distinct => "distinct",
            Self::SetOnce => "set_once",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the builder does when a distinct field receives a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistinctPolicy {
    /// Reject the duplicate.
    Error,
    /// Treat the duplicate as already applied.
    Ignore,
}

impl fmt::Display for DistinctPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Ignore => f.write_str("ignore"),
        }
    }
}

// ─── Constraint ──────────────────────────────────────────────────────

/// One declarative constraint with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// The field must be present.
    Required {
        /// Message override.
        message: Option<String>,
    },
    /// Text must fully match.
    Pattern(Pattern),
    /// Numbers must lie within bounds.
    Range(Range),
    /// Nested violations are reported under this field.
    Validated,
    /// Repeated elements must be unique.
    Distinct(DistinctPolicy),
    /// Assignable once.
    SetOnce,
}

impl Constraint {
    /// A `required` constraint with the default message.
    pub fn required() -> Self {
        Self::Required { message: None }
    }

    /// The discriminant.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::Required { .. } => ConstraintKind::Required,
            Self::Pattern(_) => ConstraintKind::Pattern,
            Self::Range(_) => ConstraintKind::Range,
            Self::Validated => ConstraintKind::Validated,
            Self::Distinct(_) => ConstraintKind::Distinct,
            Self::SetOnce => ConstraintKind::SetOnce,
        }
    }

    /// The message override, if one was declared.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Required { message } => message.as_deref(),
            Self::Pattern(p) => p.message.as_deref(),
            Self::Range(r) => r.message.as_deref(),
            Self::Validated | Self::Distinct(_) | Self::SetOnce => None,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { .. } => f.write_str("required"),
            Self::Pattern(p) => write!(f, "pattern /{}/", p.source()),
            Self::Range(r) => write!(f, "range {r}"),
            Self::Validated => f.write_str("validated"),
            Self::Distinct(policy) => write!(f, "distinct ({policy})"),
            Self::SetOnce => f.write_str("set_once"),
        }
    }
}

// ─── Pattern ─────────────────────────────────────────────────────────

/// A compiled, fully anchored regular expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    message: Option<String>,
}

impl Pattern {
    /// Compile `source` for full-match evaluation.
    pub fn new(source: impl Into<String>, message: Option<String>) -> Result<Self, SchemaError> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            SchemaError::InvalidPattern {
                pattern: source.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source,
            regex,
            message,
        })
    }

    /// The pattern as declared.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `text` matches in full.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.message == other.message
    }
}

// ─── Range ───────────────────────────────────────────────────────────

/// A numeric literal used as a range bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point.
    Float(f64),
}

impl Number {
    /// Numeric view of a value, if it is numeric.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(Self::Int(*n)),
            Value::Uint(n) => Some(Self::Uint(*n)),
            Value::Float(n) => Some(Self::Float(*n)),
            _ => None,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Some(Self::Int(n));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Some(Self::Uint(n));
        }
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Self::Float)
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Uint(n) => n as f64,
            Self::Float(n) => n,
        }
    }

    fn as_i128(self) -> Option<i128> {
        match self {
            Self::Int(n) => Some(i128::from(n)),
            Self::Uint(n) => Some(i128::from(n)),
            Self::Float(_) => None,
        }
    }

    /// Compare two numbers; integers compare exactly, anything involving a
    /// float compares as `f64`. `None` when a NaN is involved.
    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

/// One end of a [`Range`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    /// The limit.
    pub value: Number,
    /// Whether the limit itself is allowed.
    pub inclusive: bool,
}

/// Which bound a value fell outside of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeFailure {
    /// Below (or at an exclusive) lower bound.
    Below(Bound),
    /// Above (or at an exclusive) upper bound.
    Above(Bound),
}

impl fmt::Display for RangeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Below(b) if b.inclusive => write!(f, "must be greater than or equal to {}", b.value),
            Self::Below(b) => write!(f, "must be greater than {}", b.value),
            Self::Above(b) if b.inclusive => write!(f, "must be less than or equal to {}", b.value),
            Self::Above(b) => write!(f, "must be less than {}", b.value),
        }
    }
}

/// Numeric bounds, either of which may be open.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    min: Option<Bound>,
    max: Option<Bound>,
    message: Option<String>,
}

impl Range {
    /// Build a range from explicit bounds.
    ///
    /// At least one bound is required, and the bounds must admit at least
    /// one value.
    pub fn new(
        min: Option<Bound>,
        max: Option<Bound>,
        message: Option<String>,
    ) -> Result<Self, SchemaError> {
        let range = Self { min, max, message };
        if min.is_none() && max.is_none() {
            return Err(SchemaError::InvalidRange {
                range: range.to_string(),
                reason: "at least one bound is required".to_string(),
            });
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            let empty = match lo.value.compare(hi.value) {
                Some(Ordering::Greater) | None => true,
                Some(Ordering::Equal) => !(lo.inclusive && hi.inclusive),
                Some(Ordering::Less) => false,
            };
            if empty {
                return Err(SchemaError::InvalidRange {
                    range: range.to_string(),
                    reason: "the bounds admit no value".to_string(),
                });
            }
        }
        Ok(range)
    }

    /// Parse interval notation: `[1..10]`, `(0..1)`, `[0..)`, `(..100]`.
    pub fn parse(notation: &str, message: Option<String>) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidRange {
            range: notation.to_string(),
            reason: reason.to_string(),
        };
        let text = notation.trim();
        let mut chars = text.chars();
        let open = chars.next().ok_or_else(|| invalid("empty range"))?;
        let close = chars.next_back().ok_or_else(|| invalid("missing closing bracket"))?;
        let min_inclusive = match open {
            '[' => true,
            '(' => false,
            _ => return Err(invalid("range must start with '[' or '('")),
        };
        let max_inclusive = match close {
            ']' => true,
            ')' => false,
            _ => return Err(invalid("range must end with ']' or ')'")),
        };
        let (lo, hi) = chars
            .as_str()
            .split_once("..")
            .ok_or_else(|| invalid("expected '..' between bounds"))?;
        let bound = |text: &str, inclusive: bool| -> Result<Option<Bound>, SchemaError> {
            if text.trim().is_empty() {
                return Ok(None);
            }
            let value = Number::parse(text).ok_or_else(|| invalid("bound is not a number"))?;
            Ok(Some(Bound { value, inclusive }))
        };
        Self::new(bound(lo, min_inclusive)?, bound(hi, max_inclusive)?, message)
    }

    /// The lower bound, if any.
    pub fn min(&self) -> Option<Bound> {
        self.min
    }

    /// The upper bound, if any.
    pub fn max(&self) -> Option<Bound> {
        self.max
    }

    /// Check a value. Non-numeric values pass; applicability is enforced
    /// when the schema is built.
    pub fn check(&self, value: &Value) -> Result<(), RangeFailure> {
        let Some(n) = Number::of(value) else {
            return Ok(());
        };
        if let Some(lo) = self.min {
            let ok = match n.compare(lo.value) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => lo.inclusive,
                Some(Ordering::Less) | None => false,
            };
            if !ok {
                return Err(RangeFailure::Below(lo));
            }
        }
        if let Some(hi) = self.max {
            let ok = match n.compare(hi.value) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => hi.inclusive,
                Some(Ordering::Greater) | None => false,
            };
            if !ok {
                return Err(RangeFailure::Above(hi));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.min {
            Some(b) => write!(f, "{}{}", if b.inclusive { '[' } else { '(' }, b.value)?,
            None => f.write_str("(")?,
        }
        f.write_str("..")?;
        match self.max {
            Some(b) => write!(f, "{}{}", b.value, if b.inclusive { ']' } else { ')' }),
            None => f.write_str(")"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
