//! # Registration Errors
//!
//! Construction-time failures of a rule definition. A rejected definition
//! never enters the index; the caller decides whether that aborts startup
//! or is logged and skipped.

use thiserror::Error;

/// Why a rule could not be registered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// The rule type itself is not a known schema type.
    #[error("rule type {rule} is not a known type")]
    UnknownRuleType {
        /// The rule type.
        rule: String,
    },

    /// The target specification does not parse.
    #[error("rule {rule} has a malformed target '{spec}': {reason}")]
    MalformedTarget {
        /// The rule type.
        rule: String,
        /// The specification as written.
        spec: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A target reference does not resolve to an existing field.
    #[error("rule {rule} targets {target}, which does not exist")]
    UnknownTarget {
        /// The rule type.
        rule: String,
        /// The unresolved reference (type, field, or sub-field).
        target: String,
    },

    /// A rule field's shape differs from the corresponding target field.
    #[error("rule {rule} field '{field}' is {found}, but {target} is {expected}")]
    TypeMismatch {
        /// The rule type.
        rule: String,
        /// The target sub-field.
        target: String,
        /// The rule field name.
        field: String,
        /// Shape of the target sub-field.
        expected: String,
        /// Shape of the rule field.
        found: String,
    },

    /// The target field does not hold records, so it cannot host
    /// transplanted constraints.
    #[error("rule {rule} targets {target}, which holds {kind} values, not records")]
    NotAMessageField {
        /// The rule type.
        rule: String,
        /// The target field.
        target: String,
        /// The target field's value kind.
        kind: String,
    },
}
