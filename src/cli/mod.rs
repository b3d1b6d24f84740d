//! The instantia Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::Path;
use std::process;

use clap::Parser;
use tracing::debug;

use crate::cli::args::{Command, EngineArgs, InstantiaArgs};
use crate::config::EngineConfig;
use crate::diagnostics::Policy;
use crate::document::{self, Format};
use crate::engine::Engine;
use crate::{err_msg, InstantiaError};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = InstantiaArgs::parse();

    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::Run {
            file,
            engine,
            format,
            output,
            deny_diagnostics,
        } => handle_run(&file, &engine, format, output.as_deref(), deny_diagnostics),
        Command::Types {
            file,
            engine,
            format,
        } => handle_types(&file, &engine, format),
        Command::Check { file, engine } => handle_check(&file, &engine),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            output::print_error(e);
            process::exit(1);
        }
    }
}

/// Builds the engine configuration: file first, then flags.
pub fn resolve_config(args: &EngineArgs) -> Result<EngineConfig, InstantiaError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if args.strict {
        config.policy = Policy::Strict;
    }
    debug!(?config, "resolved engine configuration");
    Ok(config)
}

// The handlers return Ok(false) when the run succeeded but the exit code should be 1.

fn handle_run(
    path: &Path,
    args: &EngineArgs,
    format: Format,
    output_path: Option<&Path>,
    deny_diagnostics: bool,
) -> Result<bool, InstantiaError> {
    let program = document::load_program(path)?;
    let config = resolve_config(args)?;
    let doc = Engine::new(&program, config).run()?;

    let text = document::encode(&doc, format)?;
    match output_path {
        Some(out) => std::fs::write(out, text)
            .map_err(|e| err_msg!(Io, "cannot write '{}'", out.display()).caused_by(e))?,
        None => println!("{}", text.trim_end()),
    }

    if !doc.diagnostics.is_empty() {
        output::print_diagnostics(&doc.diagnostics).map_err(stderr_error)?;
    }
    Ok(!(deny_diagnostics && !doc.diagnostics.is_empty()))
}

fn handle_types(path: &Path, args: &EngineArgs, format: Format) -> Result<bool, InstantiaError> {
    let program = document::load_program(path)?;
    let config = resolve_config(args)?;
    let doc = Engine::new(&program, config).run()?;
    println!("{}", document::encode(&doc.types, format)?.trim_end());
    Ok(true)
}

fn handle_check(path: &Path, args: &EngineArgs) -> Result<bool, InstantiaError> {
    let program = document::load_program(path)?;
    let config = resolve_config(args)?;
    let doc = Engine::new(&program, config).run()?;
    output::print_diagnostics(&doc.diagnostics).map_err(stderr_error)?;
    output::print_summary(doc.instances.instances().count(), doc.diagnostics.len()).map_err(stderr_error)?;
    Ok(doc.diagnostics.is_empty())
}

fn stderr_error(e: std::io::Error) -> InstantiaError {
    err_msg!(Io, "cannot write to stderr").caused_by(e)
}
