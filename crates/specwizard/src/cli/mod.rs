//! Command-line interface for specwizard.
//!
//! This module provides the CLI structure for the `specwiz` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, FacetsCommand, HuntCommand, HuntModeArg, ImportCommand, SearchCommand,
    StatsCommand, WithSpecCommand,
};

/// specwiz - Find products by their specifications
///
/// Browse a product dataset by checking specification values, see which
/// products match all of them, and run QR-code treasure hunts.
#[derive(Debug, Parser)]
#[command(name = "specwiz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show product and specification counts
    Stats(StatsCommand),

    /// List specification values that can be checked
    Facets(FacetsCommand),

    /// List products matching all checked specifications
    Search(SearchCommand),

    /// List products with one specification value
    WithSpec(WithSpecCommand),

    /// Build a dataset from a JSON export
    Import(ImportCommand),

    /// Manage and play the treasure hunt
    #[command(subcommand)]
    Hunt(HuntCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
