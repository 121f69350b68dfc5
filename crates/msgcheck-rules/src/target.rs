//! # Target Specifications
//!
//! Rule types name the fields they apply to with a flat target string:
//!
//! ```text
//! spec      := reference ( sep reference )*
//! sep       := ',' | ';'
//! reference := type-ref '.' field
//! ```
//!
//! The string is parsed once, at registration, into [`TargetRef`]s, and
//! each type reference is resolved to a known [`TypeName`]. Nothing is
//! re-parsed at validation time.

use msgcheck_core::{SchemaSource, TypeName};

use crate::error::RuleError;

/// One parsed `Type.field` reference, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    /// Type reference as written; possibly partially qualified.
    pub type_ref: String,
    /// Target field name.
    pub field: String,
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_ref, self.field)
    }
}

/// Parse a target specification written on `rule`.
///
/// # Errors
///
/// [`RuleError::MalformedTarget`] for an empty specification, an empty
/// entry, or an entry without a `Type.` prefix.
pub fn parse_target_spec(rule: &TypeName, spec: &str) -> Result<Vec<TargetRef>, RuleError> {
    let malformed = |reason: String| RuleError::MalformedTarget {
        rule: rule.to_string(),
        spec: spec.to_string(),
        reason,
    };

    if spec.trim().is_empty() {
        return Err(malformed("empty target specification".to_string()));
    }

    let mut refs = Vec::new();
    for entry in spec.split([',', ';']) {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(malformed("empty target entry".to_string()));
        }
        let Some((type_ref, field)) = entry.rsplit_once('.') else {
            return Err(malformed(format!("'{entry}' is not of the form Type.field")));
        };
        if type_ref.is_empty() || field.is_empty() || TypeName::new(type_ref).is_err() {
            return Err(malformed(format!("'{entry}' is not of the form Type.field")));
        }
        if entry.chars().any(char::is_whitespace) {
            return Err(malformed(format!("'{entry}' contains whitespace")));
        }
        refs.push(TargetRef {
            type_ref: type_ref.to_string(),
            field: field.to_string(),
        });
    }
    Ok(refs)
}

/// Resolve a type reference written on `rule`.
///
/// Candidates are tried innermost scope first: each enclosing scope of the
/// rule type qualified with the reference, then the reference as a fully
/// qualified name.
pub fn resolve_type(rule: &TypeName, type_ref: &str, schema: &dyn SchemaSource) -> Option<TypeName> {
    let scoped = rule
        .scopes()
        .filter_map(|scope| TypeName::qualify(scope, type_ref).ok());
    let absolute = TypeName::new(type_ref).ok();
    scoped
        .chain(absolute)
        .find(|candidate| schema.contains(candidate))
}
