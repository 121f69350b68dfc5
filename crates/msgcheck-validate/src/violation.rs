//! # Violations
//!
//! A [`Violation`] is a snapshot of one constraint failure: where it
//! happened, which kind failed, a rendered message, and the offending value
//! rendered as text. It holds no reference into the source record and
//! stays valid after the record is dropped.
//!
//! [`ValidationError`] is the aggregate returned when a record fails
//! validation. Its message enumerates every violation, nested ones
//! indented under their parent.

use std::fmt;

use msgcheck_core::{ConstraintKind, FieldPath, TypeName};
use thiserror::Error;

/// A single constraint failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location of the failing field occurrence, element markers included.
    pub path: FieldPath,
    /// The failing constraint kind.
    pub kind: ConstraintKind,
    /// Human-readable description.
    pub message: String,
    /// The offending value, rendered, when there is one.
    pub value: Option<String>,
    /// Violations of a nested record, for `validated` fields.
    pub nested: Vec<Violation>,
}

impl Violation {
    /// A violation without value or nested violations.
    pub fn new(path: FieldPath, kind: ConstraintKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
            value: None,
            nested: Vec::new(),
        }
    }

    /// Attach the rendered offending value.
    #[must_use]
    pub fn with_value(mut self, value: impl fmt::Display) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Attach nested violations.
    #[must_use]
    pub fn with_nested(mut self, nested: Vec<Violation>) -> Self {
        self.nested = nested;
        self
    }

    /// This violation plus every nested one, depth first.
    pub fn count(&self) -> usize {
        1 + self.nested.iter().map(Violation::count).sum::<usize>()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}: {}", "", self.path, self.message, indent = 2 * (depth + 1))?;
        for child in &self.nested {
            writeln!(f)?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Every failure one record produced, top level in evaluation order.
///
/// Failures of `validated` children hang off their parent and are reached
/// through [`Violations::flatten`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    /// Top-level failures; nested ones are not counted.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the record passed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Top-level failures as a slice.
    pub fn violations(&self) -> &[Violation] {
        &self.items
    }

    /// Top-level failures in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.items.iter()
    }

    /// Failures at every depth, each parent before its children.
    pub fn flatten(&self) -> Vec<&Violation> {
        fn walk<'a>(v: &'a Violation, out: &mut Vec<&'a Violation>) {
            out.push(v);
            for child in &v.nested {
                walk(child, out);
            }
        }
        let mut out = Vec::with_capacity(self.total());
        for v in &self.items {
            walk(v, &mut out);
        }
        out
    }

    /// Number of failures at every depth.
    pub fn total(&self) -> usize {
        self.items.iter().map(Violation::count).sum()
    }

    /// Hand back the top-level list.
    pub fn into_inner(self) -> Vec<Violation> {
        self.items
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(items: Vec<Violation>) -> Self {
        Self { items }
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// One line per failure at every depth, children indented under their
/// parent.
impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for v in &self.items {
            f.write_str(sep)?;
            v.fmt_indented(f, 0)?;
            sep = "\n";
        }
        Ok(())
    }
}

/// A record failed validation.
///
/// Carries the full, non-empty list of violations. This is the one error
/// meant to be shown to an end user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{type_name} failed validation with {count} violation(s):\n{violations}", count = .violations.len())]
pub struct ValidationError {
    /// Type of the rejected record.
    pub type_name: TypeName,
    /// Every violation found.
    pub violations: Violations,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(field: &str) -> FieldPath {
        FieldPath::of(TypeName::new("acme.Order").unwrap(), field)
    }

    #[test]
    fn test_violation_display_format() {
        let v = Violation::new(path("id"), ConstraintKind::Pattern, "must match pattern ORD-[0-9]+")
            .with_value("\"X\"");
        assert_eq!(v.to_string(), "  acme.Order.id: must match pattern ORD-[0-9]+");
        assert_eq!(v.value.as_deref(), Some("\"X\""));
    }

    #[test]
    fn test_nested_violations_indent() {
        let inner_path = path("amount").child(TypeName::new("acme.Money").unwrap(), "units");
        let v = Violation::new(path("amount"), ConstraintKind::Validated, "acme.Money is invalid")
            .with_nested(vec![Violation::new(inner_path, ConstraintKind::Range, "must be greater than 0")]);
        assert_eq!(
            v.to_string(),
            "  acme.Order.amount: acme.Money is invalid\n    acme.Order.amount.units: must be greater than 0"
        );
        assert_eq!(v.count(), 2);
    }

    #[test]
    fn test_validation_error_enumerates_all() {
        let err = ValidationError {
            type_name: TypeName::new("acme.Order").unwrap(),
            violations: Violations::from(vec![
                Violation::new(path("id"), ConstraintKind::Required, "is required"),
                Violation::new(path("tags"), ConstraintKind::Required, "is required but empty"),
            ]),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("acme.Order failed validation with 2 violation(s):"));
        assert!(msg.contains("acme.Order.id: is required"));
        assert!(msg.contains("acme.Order.tags: is required but empty"));
    }

    #[test]
    fn test_collection_walks_nested_failures() {
        let units = path("amount").child(TypeName::new("acme.Money").unwrap(), "units");
        let currency = path("amount").child(TypeName::new("acme.Money").unwrap(), "currency");
        let violations = Violations::from(vec![
            Violation::new(path("amount"), ConstraintKind::Validated, "acme.Money is invalid").with_nested(vec![
                Violation::new(units, ConstraintKind::Range, "must be greater than 0"),
                Violation::new(currency, ConstraintKind::Required, "is required"),
            ]),
            Violation::new(path("id"), ConstraintKind::Required, "is required"),
        ]);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations.total(), 4);
        let order: Vec<String> = violations.flatten().iter().map(|v| v.path.to_string()).collect();
        assert_eq!(
            order,
            vec!["acme.Order.amount", "acme.Order.amount.units", "acme.Order.amount.currency", "acme.Order.id"]
        );
        assert_eq!(
            violations.to_string(),
            "  acme.Order.amount: acme.Money is invalid\n    acme.Order.amount.units: must be greater than 0\n    acme.Order.amount.currency: is required\n  acme.Order.id: is required"
        );
    }
}
