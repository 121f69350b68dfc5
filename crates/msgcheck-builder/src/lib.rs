//! # msgcheck-builder — Validating Builder
//!
//! Incremental construction of one record with a split enforcement model:
//!
//! - **Eager** (every mutation): set-once and distinct-on-insert. Failures
//!   are immediate, local [`BuilderError`]s with no partial effect.
//! - **At build** (`build()` only): required, pattern, range, and nested
//!   validity, through the validator. Failures are one aggregated
//!   [`ValidationError`](msgcheck_validate::ValidationError).
//!
//! ## Design
//!
//! The builder's lifecycle is encoded by ownership. Mutations borrow the
//! builder; `build` consumes it. A built or failed builder cannot be
//! touched again, so there is no runtime "already built" state to check.
//!
//! Per-field flags (set-once lock, spent marker, distinct seen-set) live
//! next to the working value. They are never reconstructed by re-reading
//! the value, which is what lets "explicitly set to the default" differ
//! from "locked".

pub mod builder;
pub mod error;

pub use builder::ValidatingBuilder;
pub use error::BuilderError;
