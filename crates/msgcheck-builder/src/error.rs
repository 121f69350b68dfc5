//! # Mutation Errors
//!
//! Failures raised synchronously by a builder mutation. A failed mutation
//! leaves the builder exactly as it was; the builder stays open and usable
//! for other fields.

use msgcheck_core::FieldPath;
use thiserror::Error;

/// Why a builder mutation was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// The record type is not known to the validator's schema.
    #[error("unknown record type {type_name}")]
    UnknownType {
        /// The requested type.
        type_name: String,
    },

    /// The field is not declared on the record type.
    #[error("{type_name} has no field '{field}'")]
    UnknownField {
        /// The record type.
        type_name: String,
        /// The requested field.
        field: String,
    },

    /// The operation does not fit the field's cardinality (`set` on a
    /// repeated field, `add` on a map, ...).
    #[error("field {path} is {actual}, but the operation needs {expected}")]
    CardinalityMismatch {
        /// The field.
        path: FieldPath,
        /// Cardinality the operation needs.
        expected: String,
        /// Declared cardinality.
        actual: String,
    },

    /// The value (or map key) does not fit the field's declared kind.
    #[error("field {path} holds {expected}, got {found}")]
    KindMismatch {
        /// The field.
        path: FieldPath,
        /// Declared kind.
        expected: String,
        /// Kind of the offered value.
        found: String,
    },

    /// `merge` was given a record of another type.
    #[error("cannot merge a {found} into a {expected} builder")]
    RecordTypeMismatch {
        /// The builder's record type.
        expected: String,
        /// The offered record's type.
        found: String,
    },

    /// The field is set-once and its value may no longer change.
    #[error("field {path} is set-once and already holds a value")]
    SetOnceViolation {
        /// The field name.
        field: String,
        /// The field's path.
        path: FieldPath,
    },

    /// The element is already present in a field with `distinct: error`.
    #[error("field {path} already contains {value}")]
    DuplicateElementViolation {
        /// The field name.
        field: String,
        /// Path of the existing equal element.
        path: FieldPath,
        /// The rejected element, rendered.
        value: String,
    },
}
