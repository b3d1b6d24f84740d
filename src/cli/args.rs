//! Defines the command-line arguments and subcommands for the instantia CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::document::Format;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "instantia",
    version,
    about = "Executes metamodel instantiation programs and emits the resulting instance graph."
)]
pub struct InstantiaArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a program and write the output document.
    Run {
        /// The program document (JSON or YAML).
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
        /// Output format of the document.
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Write the document to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Fail with exit code 1 if the run recorded any diagnostic.
        #[arg(long)]
        deny_diagnostics: bool,
    },
    /// Execute a program and print only its type graph.
    Types {
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Execute a program and report its diagnostics.
    Check {
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Flags that override the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct EngineArgs {
    /// Engine configuration file (JSON or YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Seed of the instance identity generator.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Abort on the first diagnostic.
    #[arg(long)]
    pub strict: bool,
    /// Maximum macro nesting depth.
    #[arg(long)]
    pub max_depth: Option<usize>,
}
