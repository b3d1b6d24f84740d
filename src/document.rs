//! Reading program documents and writing output documents.
//!
//! The engine itself never touches the filesystem; this module is the boundary. Programs and
//! configuration are read as JSON or YAML, and the [`OutputDocument`] is written in either
//! format.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ast::Program;
use crate::diagnostics::DiagnosticRecord;
use crate::err_msg;
use crate::runtime::{ObjectInstance, TypeEntry, TypeReferenceId};
use crate::InstantiaError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// `.yaml` and `.yml` are YAML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

// ============================================================================
// OUTPUT DOCUMENT
// ============================================================================

/// One top-level instantiation unit and the instances it produced, in creation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedInstance {
    pub name: String,
    pub instances: Vec<ObjectInstance>,
}

/// All units, in source declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SerializedInstances {
    pub units: Vec<SerializedInstance>,
}

impl SerializedInstances {
    pub fn unit(&self, name: &str) -> Option<&SerializedInstance> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SerializedInstance> {
        self.units.iter()
    }

    /// Every instance of every unit.
    pub fn instances(&self) -> impl Iterator<Item = &ObjectInstance> {
        self.units.iter().flat_map(|u| u.instances.iter())
    }
}

/// The complete result of a run: the type graph, the instance graph and any degradations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub types: BTreeMap<TypeReferenceId, TypeEntry>,
    pub instances: SerializedInstances,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<DiagnosticRecord>,
}

// ============================================================================
// ENCODING
// ============================================================================

pub fn read_file(path: &Path) -> Result<String, InstantiaError> {
    std::fs::read_to_string(path)
        .map_err(|e| err_msg!(Io, "cannot read '{}'", path.display()).caused_by(e))
}

pub fn decode<T: DeserializeOwned>(text: &str, format: Format) -> Result<T, InstantiaError> {
    match format {
        Format::Json => serde_json::from_str(text)
            .map_err(|e| err_msg!(Input, "invalid JSON document: {}", e).caused_by(e)),
        Format::Yaml => serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Input, "invalid YAML document: {}", e).caused_by(e)),
    }
}

pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<String, InstantiaError> {
    match format {
        Format::Json => serde_json::to_string_pretty(value)
            .map_err(|e| err_msg!(Input, "cannot encode JSON: {}", e).caused_by(e)),
        Format::Yaml => serde_yaml::to_string(value)
            .map_err(|e| err_msg!(Input, "cannot encode YAML: {}", e).caused_by(e)),
    }
}

/// Reads a validated program; the format follows the file extension.
pub fn load_program(path: impl AsRef<Path>) -> Result<Program, InstantiaError> {
    let path = path.as_ref();
    let text = read_file(path)?;
    decode(&text, Format::from_path(path))
        .map_err(|e| e.at(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("p.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("p.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("p.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("p")), Format::Json);
    }

    #[test]
    fn test_yaml_program_decodes() {
        let yaml = "
units:
  - name: shop
    statements:
      - kind: create
        class: { package: shop, class: Item }
        name: apple
";
        let program: Program = decode(yaml, Format::Yaml).unwrap();
        assert_eq!(program.units[0].name, "shop");
        assert!(program.macros.is_empty());
    }

    #[test]
    fn test_malformed_document_is_input_error() {
        let err = decode::<Program>("{ not json", Format::Json).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Input);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_program("does/not/exist.json").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Io);
    }
}
