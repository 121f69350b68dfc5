//! # msgcheck-cli — Constraint Checking from the Command Line
//!
//! Thin front end over the library crates: load schema declarations from a
//! directory, inspect the constraint index they produce, and validate JSON
//! records against it.
//!
//! ## Subcommands
//!
//! - `index`: print every effective constraint with its origin
//! - `validate`: decode JSON records and report their violations
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers return `anyhow::Result<u8>`; the binary maps it to the exit code.
//! - JSON decoding is the only logic owned here. Constraint semantics stay
//!   in the library crates.

pub mod decode;
pub mod index;
pub mod validate;

pub use decode::{decode_record, DecodeError};
