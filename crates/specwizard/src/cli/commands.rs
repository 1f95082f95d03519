//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::facet::FilterCriterion;
use crate::hunt::HuntMode;

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Facets command arguments.
#[derive(Debug, Args)]
pub struct FacetsCommand {
    /// Only list this specification group
    #[arg(short, long)]
    pub group: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Checked specification, as GROUP/KEY=VALUE (repeatable)
    #[arg(short, long = "spec", value_name = "GROUP/KEY=VALUE")]
    pub specs: Vec<FilterCriterion>,

    /// Also list products that have none of the checked specifications
    #[arg(short, long)]
    pub invert: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// With-spec command arguments.
#[derive(Debug, Args)]
pub struct WithSpecCommand {
    /// Specification key
    pub key: String,

    /// Specification value
    pub value: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON export to read
    pub input: PathBuf,

    /// Dataset file to write (defaults to the configured dataset path)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Treasure hunt commands.
#[derive(Debug, Subcommand)]
pub enum HuntCommand {
    /// List hunt steps in play order
    List,

    /// Add a step, or replace the picture of an existing one
    Add {
        /// Code printed on the QR label
        code: String,

        /// Picture of where the label is hidden
        image: PathBuf,
    },

    /// Remove a step
    Remove {
        /// Code of the step to remove
        code: String,
    },

    /// Play the hunt, reading scanned codes from stdin
    Play {
        /// Clue order (defaults to the configured mode)
        #[arg(short, long, value_enum)]
        mode: Option<HuntModeArg>,

        /// Seed for the random clue order
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Hunt mode for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HuntModeArg {
    /// Stored order
    Sequential,
    /// Shuffled, treasure last
    Random,
}

impl From<HuntModeArg> for HuntMode {
    fn from(arg: HuntModeArg) -> Self {
        match arg {
            HuntModeArg::Sequential => Self::Sequential,
            HuntModeArg::Random => Self::Random,
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunt_mode_arg_conversion() {
        assert_eq!(HuntMode::from(HuntModeArg::Sequential), HuntMode::Sequential);
        assert_eq!(HuntMode::from(HuntModeArg::Random), HuntMode::Random);
    }

    #[test]
    fn test_hunt_mode_arg_value_names() {
        let names: Vec<_> = HuntModeArg::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["sequential", "random"]);
    }
}
