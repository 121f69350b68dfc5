//! # Type Names
//!
//! Newtype wrapper for fully qualified record type names
//! (`acme.orders.Order`). Names are validated at construction: no bare
//! strings cross the schema boundary.
//!
//! ## Scoping
//!
//! Rule target references may be partially qualified. They are resolved
//! against the enclosing scopes of the rule type, innermost first, the way
//! protobuf resolves relative type references. [`TypeName::scopes`] yields
//! those candidates.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Fully qualified name of a record type.
///
/// Dot-separated, non-empty segments. Nested types are written with their
/// enclosing type as part of the scope (`acme.Outer.Inner`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    /// Create a validated type name.
    pub fn new(name: impl Into<String>) -> Result<Self, SchemaError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.split('.').any(|segment| segment.trim().is_empty()) {
            return Err(SchemaError::InvalidTypeName(name));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(SchemaError::InvalidTypeName(name));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The full dotted name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last segment (`Order` for `acme.orders.Order`).
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything before the last segment, if any.
    pub fn scope(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(scope, _)| scope)
    }

    /// Enclosing scopes, innermost first.
    ///
    /// For `acme.orders.Order` yields `acme.orders.Order`, `acme.orders`,
    /// `acme`. The type itself is included so that references to its own
    /// nested types resolve.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        let full = self.0.as_str();
        std::iter::successors(Some(full), |current| {
            current.rsplit_once('.').map(|(scope, _)| scope)
        })
    }

    /// Qualify a relative reference under `scope`.
    pub fn qualify(scope: &str, relative: &str) -> Result<Self, SchemaError> {
        Self::new(format!("{scope}.{relative}"))
    }
}

impl TryFrom<String> for TypeName {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TypeName {
    type Error = SchemaError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(name: TypeName) -> Self {
        name.0
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name_and_scope() {
        let name = TypeName::new("acme.orders.Order").unwrap();
        assert_eq!(name.simple_name(), "Order");
        assert_eq!(name.scope(), Some("acme.orders"));
    }

    #[test]
    fn test_unscoped_name() {
        let name = TypeName::new("Order").unwrap();
        assert_eq!(name.simple_name(), "Order");
        assert_eq!(name.scope(), None);
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(TypeName::new("").is_err());
        assert!(TypeName::new("acme..Order").is_err());
        assert!(TypeName::new(".Order").is_err());
        assert!(TypeName::new("acme.Order.").is_err());
        assert!(TypeName::new("acme.Or der").is_err());
    }

    #[test]
    fn test_scopes_innermost_first() {
        let name = TypeName::new("acme.orders.Order").unwrap();
        let scopes: Vec<&str> = name.scopes().collect();
        assert_eq!(scopes, vec!["acme.orders.Order", "acme.orders", "acme"]);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let name: TypeName = serde_json::from_str("\"acme.Order\"").unwrap();
        assert_eq!(name.as_str(), "acme.Order");
        assert!(serde_json::from_str::<TypeName>("\"acme..Order\"").is_err());
    }
}
