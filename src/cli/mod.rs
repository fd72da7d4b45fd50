//! # CLI Module
//!
//! This module defines the command-line interface for sceneqa using `clap`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Initialize a new configuration file |
//! | `list` | List the registered rules |
//! | `collections` | Show the workflow collections |
//! | `explain` | Describe one rule |
//! | `audit` | Run a collection's rules on a scene |
//! | `fix` | Repair the issues fixable rules report |
//!
//! ## Global Options
//!
//! - `-v, --verbose` - Increase verbosity level (use multiple times: -v, -vv, -vvv)
//! - `-c, --config <FILE>` - Path to configuration file
//! - `-C, --directory <DIR>` - Working directory (defaults to current directory)
//!
//! ## Examples
//!
//! ```bash
//! # Initialize configuration
//! sceneqa init --collection rigging
//!
//! # Audit a scene with the look-dev collection
//! sceneqa audit shot010.json --collection look-dev
//!
//! # Machine-readable report
//! sceneqa audit shot010.json --format json -o report.json
//!
//! # Fix without prompting
//! sceneqa fix shot010.json --yes
//! ```

pub mod commands;
pub mod exit_codes;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{AuditArgs, CollectionsArgs, ExplainArgs, FixArgs, InitArgs, ListArgs};

/// sceneqa - Quality checks for 3D scene graphs
#[derive(Parser, Debug)]
#[command(name = "sceneqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working directory (defaults to current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(InitArgs),

    /// List the registered rules
    List(ListArgs),

    /// Show the workflow collections and their categories
    Collections(CollectionsArgs),

    /// Describe one rule
    Explain(ExplainArgs),

    /// Run a collection's rules on a scene
    Audit(AuditArgs),

    /// Repair the issues reported by fixable rules
    Fix(FixArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_audit_filters() {
        let cli = Cli::parse_from([
            "sceneqa",
            "audit",
            "scene.json",
            "--collection",
            "rigging",
            "--skip",
            "Scene,Shaders",
            "-vv",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Audit(args) => {
                assert_eq!(args.scene, PathBuf::from("scene.json"));
                assert_eq!(args.selection.collection.as_deref(), Some("rigging"));
                assert_eq!(
                    args.selection.skip,
                    Some(vec!["Scene".to_string(), "Shaders".to_string()])
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
