//!
//! # Overview
//!
//! This module defines the unified, `miette`-based diagnostic system for the instantiation engine.
//! Every failure mode of loading, evaluating, or executing a program is an [`InstantiaError`].
//! Errors are built with the `err_msg!` macro and then optionally placed with
//! [`InstantiaError::at`] and [`InstantiaError::with_help`].
//!
//! # Degradation
//!
//! Most evaluation failures are not fatal. The evaluator and the execution engine record them
//! in a [`Diagnostics`] sink and continue with a sentinel value (or skip the branch). The sink's
//! [`Policy`] decides afterwards whether any recorded diagnostic aborts the run.
//!
//! - **Use `err_msg!` for every error.**
//!   - `err_msg!(UnresolvedReference, "unknown macro '{}'", name)`
//!
//! - **Never format a location into the message.**
//!   The sink attaches the current execution location when the error is recorded.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type-safe error classification that corresponds to `InstantiaError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// A static element or runtime handle could not be resolved
    UnresolvedReference,
    /// An expression shape or operand combination the evaluator does not combine
    UnsupportedExpression,
    /// Division or remainder by zero
    DivisionByZero,
    /// Macro calls or enum defaults nested deeper than the configured limit
    RecursionLimit,
    /// Malformed input or configuration documents
    Input,
    /// Filesystem failures
    Io,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::UnresolvedReference => "unresolved_reference",
            ErrorType::UnsupportedExpression => "unsupported_expression",
            ErrorType::DivisionByZero => "division_by_zero",
            ErrorType::RecursionLimit => "recursion_limit",
            ErrorType::Input => "input",
            ErrorType::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    /// Execution location, e.g. `unit shop > macro item > create apple`.
    pub location: Option<String>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Unified error type for all engine failure modes.
#[derive(Debug, Error)]
pub enum InstantiaError {
    #[error("Unresolved reference: {message}")]
    UnresolvedReference {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Unsupported expression: {message}")]
    UnsupportedExpression {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Division by zero: {message}")]
    DivisionByZero {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Recursion limit exceeded: {message}")]
    RecursionLimit {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Input error: {message}")]
    Input {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl InstantiaError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            InstantiaError::UnresolvedReference { ctx, .. } => ctx,
            InstantiaError::UnsupportedExpression { ctx, .. } => ctx,
            InstantiaError::DivisionByZero { ctx, .. } => ctx,
            InstantiaError::RecursionLimit { ctx, .. } => ctx,
            InstantiaError::Input { ctx, .. } => ctx,
            InstantiaError::Io { ctx, .. } => ctx,
        }
    }

    fn get_ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            InstantiaError::UnresolvedReference { ctx, .. } => ctx,
            InstantiaError::UnsupportedExpression { ctx, .. } => ctx,
            InstantiaError::DivisionByZero { ctx, .. } => ctx,
            InstantiaError::RecursionLimit { ctx, .. } => ctx,
            InstantiaError::Input { ctx, .. } => ctx,
            InstantiaError::Io { ctx, .. } => ctx,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            InstantiaError::UnresolvedReference { message, .. } => message,
            InstantiaError::UnsupportedExpression { message, .. } => message,
            InstantiaError::DivisionByZero { message, .. } => message,
            InstantiaError::RecursionLimit { message, .. } => message,
            InstantiaError::Input { message, .. } => message,
            InstantiaError::Io { message, .. } => message,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            InstantiaError::UnresolvedReference { .. } => ErrorType::UnresolvedReference,
            InstantiaError::UnsupportedExpression { .. } => ErrorType::UnsupportedExpression,
            InstantiaError::DivisionByZero { .. } => ErrorType::DivisionByZero,
            InstantiaError::RecursionLimit { .. } => ErrorType::RecursionLimit,
            InstantiaError::Input { .. } => ErrorType::Input,
            InstantiaError::Io { .. } => ErrorType::Io,
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.get_ctx().location.as_deref()
    }

    /// Places the error at an execution location, keeping an existing one.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.get_ctx_mut();
        if ctx.location.is_none() {
            ctx.location = Some(location.into());
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.get_ctx_mut().help = Some(help.into());
        self
    }

    /// Attaches an underlying cause.
    pub fn caused_by(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        let slot = match &mut self {
            InstantiaError::UnresolvedReference { source, .. } => source,
            InstantiaError::UnsupportedExpression { source, .. } => source,
            InstantiaError::DivisionByZero { source, .. } => source,
            InstantiaError::RecursionLimit { source, .. } => source,
            InstantiaError::Input { source, .. } => source,
            InstantiaError::Io { source, .. } => source,
        };
        *slot = Some(Box::new(cause));
        self
    }

    /// Serializable summary used in the output document.
    pub fn to_record(&self) -> DiagnosticRecord {
        DiagnosticRecord {
            kind: self.error_type(),
            message: self.message().to_string(),
            location: self.get_ctx().location.clone(),
        }
    }
}

impl Diagnostic for InstantiaError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("instantia::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let ctx = self.get_ctx();
        match (&ctx.help, &ctx.location) {
            (Some(help), Some(location)) => Some(Box::new(format!("{help} (at {location})"))),
            (Some(help), None) => Some(Box::new(help)),
            (None, Some(location)) => Some(Box::new(format!("at {location}"))),
            (None, None) => None,
        }
    }
}

/// Constructs an `InstantiaError` variant with a formatted message and an empty context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($arg:tt)+) => {
        $crate::InstantiaError::$variant {
            message: format!($($arg)+),
            ctx: $crate::diagnostics::ErrorContext::none(),
            source: None,
        }
    };
}

/// A diagnostic as it appears in the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub kind: ErrorType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Whether recorded diagnostics abort the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Record diagnostics, substitute sentinels, keep going.
    #[default]
    Lenient,
    /// Fail the run with the first recorded diagnostic.
    Strict,
}

/// Collects degradations produced while executing a program.
///
/// The sink tracks the current execution location as a stack of frames so that every
/// recorded error knows where it happened.
#[derive(Debug, Default)]
pub struct Diagnostics {
    policy: Policy,
    records: Vec<InstantiaError>,
    frames: Vec<String>,
}

impl Diagnostics {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            records: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn enter(&mut self, frame: impl Into<String>) {
        self.frames.push(frame.into());
    }

    pub fn leave(&mut self) {
        self.frames.pop();
    }

    pub fn location(&self) -> Option<String> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.join(" > "))
        }
    }

    /// Records a degradation at the current location.
    pub fn push(&mut self, err: InstantiaError) {
        let err = match self.location() {
            Some(location) => err.at(location),
            None => err,
        };
        tracing::warn!(kind = %err.error_type(), location = ?err.location(), "{}", err.message());
        self.records.push(err);
    }

    /// Under the strict policy, turns the earliest recorded diagnostic into a failure.
    pub fn check(&mut self) -> Result<(), InstantiaError> {
        if self.policy == Policy::Strict && !self.records.is_empty() {
            return Err(self.records.remove(0));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstantiaError> {
        self.records.iter()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.iter().map(InstantiaError::to_record).collect()
    }
}
