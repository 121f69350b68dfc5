//! # Validate Subcommand
//!
//! Decodes JSON records against the loaded schema and reports every
//! constraint violation, one file at a time.
//!
//! ```bash
//! msgcheck validate --schemas schemas/ --type acme.orders.Order order-1.json order-2.json
//! ```
//!
//! Exit code 0 when every file decodes and validates cleanly, 1 otherwise.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use msgcheck_core::TypeName;
use msgcheck_validate::{Validator, Violation};

use crate::decode::decode_record;
use crate::index::load_registry;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory of `*.yaml` / `*.yml` / `*.json` schema declarations.
    #[arg(long)]
    pub schemas: PathBuf,

    /// Fully qualified record type of every input file.
    #[arg(long = "type", value_name = "NAME")]
    pub type_name: String,

    /// JSON documents to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let (registry, _ext) = load_registry(&args.schemas)?;
    let validator = Validator::from_registry(&registry);
    let type_name = TypeName::new(&args.type_name)
        .with_context(|| format!("invalid --type '{}'", args.type_name))?;
    if validator.descriptor(&type_name).is_none() {
        anyhow::bail!("unknown record type {type_name}");
    }

    let mut failed = 0usize;
    for file in &args.files {
        match check_file(&validator, &type_name, file) {
            Ok(violations) if violations.is_empty() => println!("{}: OK", file.display()),
            Ok(violations) => {
                failed += 1;
                println!("{}: {} violation(s)", file.display(), violations.len());
                for v in &violations {
                    println!("{v}");
                }
            }
            Err(e) => {
                failed += 1;
                println!("{}: ERROR {e:#}", file.display());
            }
        }
    }

    println!();
    println!("{} of {} file(s) valid", args.files.len() - failed, args.files.len());
    Ok(if failed == 0 { 0 } else { 1 })
}

/// Read, decode, and validate one JSON file.
pub fn check_file(validator: &Validator, type_name: &TypeName, path: &Path) -> Result<Vec<Violation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    let record = decode_record(&**validator.types(), type_name, &json)?;
    let violations = validator.validate(&record);
    tracing::debug!(file = %path.display(), violations = violations.len(), "validated record");
    Ok(violations)
}
