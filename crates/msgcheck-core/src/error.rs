//! # Error Types — Schema Construction
//!
//! Errors raised while building the schema model: invalid names, malformed
//! declarations, constraints attached where they cannot apply, and load
//! failures. All errors use `thiserror` for derive-based `Display` and
//! `Error` implementations.
//!
//! ## Design
//!
//! - Schema errors are construction-time: a descriptor that fails these
//!   checks never exists, so the validator never sees an inapplicable
//!   constraint.
//! - Every variant names the type and field involved.

use thiserror::Error;

use crate::constraint::ConstraintKind;

/// Error while constructing or loading schema descriptors.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A type name is empty, has an empty segment, or contains whitespace.
    #[error("invalid type name '{0}'")]
    InvalidTypeName(String),

    /// A field name is empty or contains a dot or whitespace.
    #[error("invalid field name '{field}' on {type_name}")]
    InvalidFieldName {
        /// The owning type.
        type_name: String,
        /// The rejected field name.
        field: String,
    },

    /// Two types with the same name were declared.
    #[error("type {0} is declared more than once")]
    DuplicateType(String),

    /// A type in a declaration directory was already declared by an
    /// earlier file.
    #[error("type {type_name} in '{file}' is already declared in '{first_file}'")]
    RedeclaredType {
        /// The repeated type name.
        type_name: String,
        /// The file carrying the second declaration.
        file: String,
        /// The file that declared it first.
        first_file: String,
    },

    /// Two fields with the same name were declared on one type.
    #[error("field '{field}' is declared more than once on {type_name}")]
    DuplicateField {
        /// The owning type.
        type_name: String,
        /// The repeated field name.
        field: String,
    },

    /// Two constraints of the same kind were declared on one field.
    #[error("constraint '{kind}' is declared more than once on {type_name}.{field}")]
    DuplicateConstraint {
        /// The owning type.
        type_name: String,
        /// The field carrying the constraint.
        field: String,
        /// The repeated constraint kind.
        kind: ConstraintKind,
    },

    /// A constraint was attached to a field it cannot apply to.
    #[error("constraint '{kind}' cannot apply to {type_name}.{field}: {reason}")]
    InapplicableConstraint {
        /// The owning type.
        type_name: String,
        /// The field carrying the constraint.
        field: String,
        /// The rejected constraint kind.
        kind: ConstraintKind,
        /// Why the constraint does not fit the field.
        reason: String,
    },

    /// A pattern failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// A range declaration is malformed or empty.
    #[error("invalid range '{range}': {reason}")]
    InvalidRange {
        /// The range as declared.
        range: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A declaration file could not be read or parsed.
    #[error("schema load error for '{source_name}': {reason}")]
    Load {
        /// File name or other source identifier.
        source_name: String,
        /// Reason the declarations could not be loaded.
        reason: String,
    },

    /// IO error reading a declaration directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
