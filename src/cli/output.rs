//! Handles all user-facing output for the CLI.
//!
//! Documents go to stdout (or a file); diagnostics and errors go to stderr, colorized when
//! the terminal supports it.

use std::io::{self, Write};

use miette::Report;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::diagnostics::DiagnosticRecord;
use crate::InstantiaError;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints each recorded diagnostic as `kind: message (at location)`.
pub fn print_diagnostics(records: &[DiagnosticRecord]) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    write_records(&mut stderr, records)
}

/// Prints a one-line summary in green when clean, yellow otherwise.
pub fn print_summary(instances: usize, diagnostics: usize) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    write_summary(&mut stderr, instances, diagnostics)
}

/// Prints an InstantiaError with full miette diagnostics.
pub fn print_error(error: InstantiaError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_records(out: &mut impl WriteColor, records: &[DiagnosticRecord]) -> io::Result<()> {
    records.iter().try_for_each(|record| write_record(out, record))
}

fn write_record(out: &mut impl WriteColor, record: &DiagnosticRecord) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    write!(out, "{}", record.kind)?;
    out.reset()?;
    write!(out, ": {}", record.message)?;
    if let Some(location) = &record.location {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, " (at {})", location)?;
        out.reset()?;
    }
    writeln!(out)
}

fn write_summary(out: &mut impl WriteColor, instances: usize, diagnostics: usize) -> io::Result<()> {
    let color = if diagnostics == 0 { Color::Green } else { Color::Yellow };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    writeln!(out, "{} instances, {} diagnostics", instances, diagnostics)?;
    out.reset()
}
