//! Engine configuration.
//!
//! Every field has a default, so a configuration file only needs to mention what it changes:
//!
//! ```yaml
//! policy: strict
//! seed: 7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Policy;
use crate::document::{self, Format};
use crate::InstantiaError;

pub const DEFAULT_SEED: u64 = 0x5EED;
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Whether diagnostics abort the run.
    pub policy: Policy,
    /// Seed of the instance identity generator. Equal seeds give equal output documents.
    pub seed: u64,
    /// Maximum nesting of macro calls and of expressions.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Lenient,
            seed: DEFAULT_SEED,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn strict() -> Self {
        Self {
            policy: Policy::Strict,
            ..Self::default()
        }
    }

    /// Loads a configuration file; the format follows the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InstantiaError> {
        let path = path.as_ref();
        let text = document::read_file(path)?;
        Self::parse(&text, Format::from_path(path))
    }

    pub fn parse(text: &str, format: Format) -> Result<Self, InstantiaError> {
        document::decode(text, format).map_err(|e| e.with_help("expected the keys policy, seed and max_depth"))
    }
}
