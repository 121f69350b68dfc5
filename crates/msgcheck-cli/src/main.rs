//! # msgcheck CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use msgcheck_cli::index::{run_index, IndexArgs};
use msgcheck_cli::validate::{run_validate, ValidateArgs};

/// Declarative field constraints for structured records.
///
/// Loads schema declarations (YAML or JSON), registers the rule types found
/// among them, and validates JSON records against the resulting constraints.
#[derive(Parser, Debug)]
#[command(name = "msgcheck", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the constraint index built from a schema directory.
    Index(IndexArgs),

    /// Validate JSON records against a schema directory.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "msgcheck starting");

    let result = match cli.command {
        Commands::Index(args) => run_index(&args),
        Commands::Validate(args) => run_validate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_index() {
        let cli = Cli::try_parse_from(["msgcheck", "index", "--schemas", "schemas"]).unwrap();
        match cli.command {
            Commands::Index(args) => {
                assert_eq!(args.schemas, PathBuf::from("schemas"));
                assert!(!args.strict);
            }
            other => panic!("Expected Index, got: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_index_strict() {
        let cli =
            Cli::try_parse_from(["msgcheck", "index", "--schemas", "s", "--strict"]).unwrap();
        if let Commands::Index(args) = cli.command {
            assert!(args.strict);
        }
    }

    #[test]
    fn cli_parse_index_requires_schemas() {
        assert!(Cli::try_parse_from(["msgcheck", "index"]).is_err());
    }

    #[test]
    fn cli_parse_validate() {
        let cli = Cli::try_parse_from([
            "msgcheck",
            "validate",
            "--schemas",
            "schemas",
            "--type",
            "acme.orders.Order",
            "a.json",
            "b.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.type_name, "acme.orders.Order");
                assert_eq!(args.files, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
            }
            other => panic!("Expected Validate, got: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_validate_requires_files() {
        let result = Cli::try_parse_from([
            "msgcheck", "validate", "--schemas", "s", "--type", "acme.T",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_validate_requires_type() {
        let result = Cli::try_parse_from(["msgcheck", "validate", "--schemas", "s", "a.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli0 = Cli::try_parse_from(["msgcheck", "index", "--schemas", "s"]).unwrap();
        assert_eq!(cli0.verbose, 0);

        let cli1 = Cli::try_parse_from(["msgcheck", "-v", "index", "--schemas", "s"]).unwrap();
        assert_eq!(cli1.verbose, 1);

        let cli3 = Cli::try_parse_from(["msgcheck", "index", "--schemas", "s", "-vvv"]).unwrap();
        assert_eq!(cli3.verbose, 3);
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["msgcheck"]).is_err());
    }

    #[test]
    fn cli_parse_invalid_subcommand_errors() {
        assert!(Cli::try_parse_from(["msgcheck", "lock"]).is_err());
    }
}
