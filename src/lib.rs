pub use crate::diagnostics::{DiagnosticRecord, Diagnostics, ErrorContext, InstantiaError, Policy};

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod runtime;

pub use crate::config::EngineConfig;
pub use crate::document::OutputDocument;
pub use crate::engine::Engine;

/// Runs `program` once with `config` and returns its output document.
pub fn instantiate(program: &ast::Program, config: EngineConfig) -> Result<OutputDocument, InstantiaError> {
    Engine::new(program, config).run()
}
