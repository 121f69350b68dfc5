//! # Index Subcommand
//!
//! Loads a directory of schema declarations, registers every rule-shaped
//! type found there, and prints the resulting constraint index.
//!
//! ```bash
//! msgcheck index --schemas schemas/
//! msgcheck index --schemas schemas/ --strict   # exit 1 on a rejected rule
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use msgcheck_core::TypeSet;
use msgcheck_rules::{ConstraintIndex, Extension, RuleRegistry};

/// Arguments for the index subcommand.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Directory of `*.yaml` / `*.yml` / `*.json` schema declarations.
    #[arg(long)]
    pub schemas: PathBuf,

    /// Fail when any rule-shaped type is rejected.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the index subcommand.
pub fn run_index(args: &IndexArgs) -> Result<u8> {
    let (_registry, ext) = load_registry(&args.schemas)?;

    for line in render_index(&ext.index) {
        println!("{line}");
    }
    for (rule, err) in &ext.rejected {
        println!("rejected {rule}: {err}");
    }
    println!();
    println!(
        "{} path(s), {} rule(s) registered, {} rejected",
        ext.index.len(),
        ext.registered.len(),
        ext.rejected.len()
    );

    if args.strict && !ext.rejected.is_empty() {
        return Ok(1);
    }
    Ok(0)
}

/// Load schema declarations from `dir` into a fresh registry.
pub fn load_registry(dir: &Path) -> Result<(RuleRegistry, Extension)> {
    let types = TypeSet::load_dir(dir)
        .with_context(|| format!("failed to load schemas from {}", dir.display()))?;
    tracing::info!(types = types.len(), dir = %dir.display(), "loaded schema declarations");
    Ok(RuleRegistry::with_types(&types))
}

/// One line per effective constraint: `path: constraint (origin)`.
pub fn render_index(index: &ConstraintIndex) -> Vec<String> {
    index
        .iter()
        .flat_map(|(path, set)| {
            set.iter()
                .map(move |r| format!("{path}: {} ({})", r.constraint, r.origin))
        })
        .collect()
}
