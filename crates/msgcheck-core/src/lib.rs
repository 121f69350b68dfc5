//! # msgcheck-core — Foundational Types for msgcheck
//!
//! This crate is the bedrock of the msgcheck workspace. It defines the
//! schema model the rule registry and validator consume, the dynamic record
//! values they inspect, and the closed constraint model they evaluate.
//! Every other crate in the workspace depends on `msgcheck-core`; it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype names.** `TypeName` is validated at construction. No bare
//!    strings identify record types.
//!
//! 2. **Closed constraint set.** `Constraint` is a sum type with six
//!    variants, matched exhaustively everywhere. Adding a kind forces every
//!    consumer to handle it.
//!
//! 3. **Checked descriptors.** A `FieldDescriptor` cannot carry a
//!    constraint that does not apply to it; patterns are compiled and
//!    ranges parsed once, at load time.
//!
//! 4. **Structural paths.** `FieldPath` equality is step-sequence equality;
//!    the element-free `schema_path()` is the constraint lookup key.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `msgcheck-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod constraint;
pub mod decl;
pub mod error;
pub mod name;
pub mod path;
pub mod schema;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use constraint::{
    Bound, Constraint, ConstraintKind, DistinctPolicy, Number, Pattern, Range, RangeFailure,
};
pub use decl::SchemaDocument;
pub use error::SchemaError;
pub use name::TypeName;
pub use path::{Element, FieldPath, FieldStep};
pub use schema::{
    Cardinality, FieldDescriptor, MapKeyKind, MessageDescriptor, SchemaSource, TypeSet, ValueKind,
};
pub use value::{FieldValue, MapKey, Record, Value};
