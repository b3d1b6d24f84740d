//! Type-reference registry.
//!
//! Canonicalizes static metamodel elements into stable string keys. A key is derived only from
//! the defining document path, the element kind and the element's structural path, so the same
//! element always yields the same key:
//!
//! ```text
//! models/shop.mm#/class/Item
//! models/shop.mm#/interface/Named
//! models/shop.mm#/attribute/Item/price
//! models/shop.mm#/relation/Item/next
//! models/shop.mm#/enum_entry/Color/Red
//! ```
//!
//! Keys are computed lazily on first request and cached for the rest of the run. Every resolved
//! element is also recorded as a [`TypeEntry`] for the type-graph export.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{ElementRef, Metamodel};
use crate::diagnostics::Diagnostics;
use crate::err_msg;
use crate::InstantiaError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeReferenceId(String);

impl TypeReferenceId {
    pub const UNKNOWN: &'static str = "unknown";

    /// Sentinel for an element that could not be resolved.
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Class,
    Interface,
    Attribute,
    Relation,
    EnumEntry,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Attribute => "attribute",
            ElementKind::Relation => "relation",
            ElementKind::EnumEntry => "enum_entry",
        }
    }
}

/// One node of the exported type graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeEntry {
    pub kind: ElementKind,
    pub document: String,
    pub name: String,
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    cache: HashMap<ElementRef, TypeReferenceId>,
    entries: BTreeMap<TypeReferenceId, TypeEntry>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical key of `element`, computing it on first request.
    ///
    /// # Errors
    /// `UnresolvedReference` if the handle does not name an element of `model`.
    pub fn resolve(
        &mut self,
        model: &Metamodel,
        element: &ElementRef,
    ) -> Result<TypeReferenceId, InstantiaError> {
        if let Some(id) = self.cache.get(element) {
            return Ok(id.clone());
        }
        let (id, entry) = canonicalize(model, element)?;
        self.cache.insert(element.clone(), id.clone());
        self.entries.entry(id.clone()).or_insert(entry);
        Ok(id)
    }

    /// Lenient resolution: a dangling handle is recorded in `diagnostics` and yields the
    /// `unknown` sentinel key.
    pub fn resolve_or_unknown(
        &mut self,
        model: &Metamodel,
        element: &ElementRef,
        diagnostics: &mut Diagnostics,
    ) -> TypeReferenceId {
        match self.resolve(model, element) {
            Ok(id) => id,
            Err(err) => {
                diagnostics.push(err);
                TypeReferenceId::unknown()
            }
        }
    }

    pub fn entry(&self, id: &TypeReferenceId) -> Option<&TypeEntry> {
        self.entries.get(id)
    }

    /// Resolved entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&TypeReferenceId, &TypeEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> BTreeMap<TypeReferenceId, TypeEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn canonicalize(
    model: &Metamodel,
    element: &ElementRef,
) -> Result<(TypeReferenceId, TypeEntry), InstantiaError> {
    let unresolved = || err_msg!(UnresolvedReference, "{} does not exist in the metamodel", element);

    match element {
        ElementRef::Class { class } => {
            let (package, decl) = model.class(class).ok_or_else(unresolved)?;
            let kind = if decl.interface {
                ElementKind::Interface
            } else {
                ElementKind::Class
            };
            Ok((
                key(&package.path, kind, &[decl.name.as_str()]),
                TypeEntry {
                    kind,
                    document: package.path.clone(),
                    name: decl.name.clone(),
                    qualified_name: format!("{}.{}", package.name, decl.name),
                    datatype: None,
                    target: None,
                },
            ))
        }
        ElementRef::Attribute { owner, name } => {
            let (declaring, attr) = model.attribute_owner(owner, name).ok_or_else(unresolved)?;
            let (package, _) = model.class(&declaring).ok_or_else(unresolved)?;
            Ok((
                key(&package.path, ElementKind::Attribute, &[declaring.class.as_str(), attr.name.as_str()]),
                TypeEntry {
                    kind: ElementKind::Attribute,
                    document: package.path.clone(),
                    name: attr.name.clone(),
                    qualified_name: format!("{}.{}", declaring, attr.name),
                    datatype: Some(attr.datatype.to_string()),
                    target: None,
                },
            ))
        }
        ElementRef::Relation { owner, name } => {
            let (declaring, relation) = model.relation_owner(owner, name).ok_or_else(unresolved)?;
            let (package, _) = model.class(&declaring).ok_or_else(unresolved)?;
            Ok((
                key(&package.path, ElementKind::Relation, &[declaring.class.as_str(), relation.name.as_str()]),
                TypeEntry {
                    kind: ElementKind::Relation,
                    document: package.path.clone(),
                    name: relation.name.clone(),
                    qualified_name: format!("{}.{}", declaring, relation.name),
                    datatype: None,
                    target: Some(relation.target.to_string()),
                },
            ))
        }
        ElementRef::EnumEntry { entry } => {
            let (package, decl, entry_decl) = model.enum_entry(entry).ok_or_else(unresolved)?;
            Ok((
                key(&package.path, ElementKind::EnumEntry, &[decl.name.as_str(), entry_decl.name.as_str()]),
                TypeEntry {
                    kind: ElementKind::EnumEntry,
                    document: package.path.clone(),
                    name: entry_decl.name.clone(),
                    qualified_name: entry.to_string(),
                    datatype: None,
                    target: None,
                },
            ))
        }
    }
}

fn key(document: &str, kind: ElementKind, path: &[&str]) -> TypeReferenceId {
    TypeReferenceId(format!("{}#/{}/{}", document, kind.as_str(), path.join("/")))
}
