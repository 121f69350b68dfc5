//! # msgcheck-rules — Rule Registry and Constraint Index
//!
//! Associates constraints with schema fields. Two sources feed the index:
//! constraints declared directly on a field, and constraints declared on
//! a separate rule-shaped record type whose target specification binds it
//! to record-typed fields of other types.
//!
//! ## Flow
//!
//! ```text
//! TypeSet ──extend──▶ RuleRegistry ──snapshot──▶ ConstraintIndex
//!                          │                          │
//!            parse + bind (RuleDefinition)      constraints_for(path)
//! ```
//!
//! - [`target`] parses target specifications and resolves partially
//!   qualified type references.
//! - [`definition`] checks a rule against each target and yields its
//!   contributions.
//! - [`index`] folds direct and rule constraints, direct first, and
//!   answers lookups.
//! - [`registry`] publishes immutable snapshots with compare-and-swap.
//!
//! ## Crate Policy
//!
//! - Depends only on `msgcheck-core` internally.
//! - All binding checks happen at registration. Lookups never fail.

pub mod definition;
pub mod error;
pub mod index;
pub mod registry;
pub mod target;

pub use definition::{RuleBinding, RuleDefinition};
pub use error::RuleError;
pub use index::{ConstraintIndex, ConstraintResolver, ConstraintSet, Origin, ResolvedConstraint};
pub use registry::{Extension, RegistrySnapshot, RuleRegistry};
pub use target::{parse_target_spec, resolve_type, TargetRef};
