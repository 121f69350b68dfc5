//! # msgcheck-validate — Record Validation
//!
//! Evaluates the effective constraints of every field occurrence in a
//! record and reports every failure as data.
//!
//! ## Validation (`validator`)
//!
//! [`Validator::validate`] walks a record in schema declaration order,
//! recursing into record-typed fields, and returns the full list of
//! [`Violation`]s. It never errors and never short-circuits, which keeps
//! it usable for "check without building" callers that want the raw list.
//!
//! ## Violations (`violation`)
//!
//! [`Violation`] is an immutable snapshot of one failure. [`ValidationError`]
//! is the aggregate raised at the builder's finalization boundary (or by
//! [`Validator::check`]); it enumerates every violation.
//!
//! ## Crate Policy
//!
//! - Constraint failures are values until `check`/`build` turns them into
//!   the one error type.
//! - A missing constraint entry is success, never an error.

pub mod validator;
pub mod violation;

pub use validator::Validator;
pub use violation::{ValidationError, Violation, Violations};
