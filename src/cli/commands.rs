//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bunny provider - plan and apply storage zones and edge rules.
#[derive(Parser, Debug)]
#[command(name = "bunny-provider")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show resource schemas.
    Schema {
        /// Resource type (all types if not specified).
        resource_type: Option<String>,
    },

    /// Check a proposed change without calling the API.
    Check {
        /// Resource type.
        resource_type: String,

        /// Desired configuration (JSON or YAML).
        #[arg(short, long)]
        config: PathBuf,

        /// Last applied state (JSON or YAML).
        #[arg(short, long)]
        state: Option<PathBuf>,
    },

    /// Create a resource.
    Create {
        /// Resource type.
        resource_type: String,

        /// Desired configuration (JSON or YAML).
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Refresh a resource from the API.
    Read {
        /// Resource type.
        resource_type: String,

        /// Last applied state (JSON or YAML).
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Apply a changed configuration to an existing resource.
    Update {
        /// Resource type.
        resource_type: String,

        /// Desired configuration (JSON or YAML).
        #[arg(short, long)]
        config: PathBuf,

        /// Last applied state (JSON or YAML).
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Delete a resource.
    Delete {
        /// Resource type.
        resource_type: String,

        /// Last applied state (JSON or YAML).
        #[arg(short, long)]
        state: PathBuf,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "bunny-provider",
            "check",
            "bunny_storagezone",
            "--config",
            "zone.yaml",
            "--state",
            "state.json",
            "--output",
            "json",
        ])
        .expect("valid arguments");

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Check { resource_type, config, state } => {
                assert_eq!(resource_type, "bunny_storagezone");
                assert_eq!(config, PathBuf::from("zone.yaml"));
                assert_eq!(state, Some(PathBuf::from("state.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_update_needs_state() {
        let result = Cli::try_parse_from([
            "bunny-provider",
            "update",
            "bunny_storagezone",
            "--config",
            "zone.yaml",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
