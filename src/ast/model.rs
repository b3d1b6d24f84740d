//! Static metamodel: packages of classes, interfaces, attributes, relations and enumerations.
//!
//! The model is immutable during a run. Element handles ([`ClassRef`], [`EnumEntryRef`],
//! [`ElementRef`]) name elements structurally; they are resolved against the model by the
//! type-reference registry and may dangle.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::Expr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Metamodel {
    #[serde(default)]
    pub packages: Vec<Package>,
}

/// One defining document of the metamodel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    /// Path of the defining document; the stable prefix of every type key.
    pub path: String,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub interface: bool,
    #[serde(default)]
    pub supertypes: Vec<ClassRef>,
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    #[serde(default)]
    pub relations: Vec<RelationDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    pub datatype: DataType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataType {
    String,
    Number,
    Boolean,
    Enum { package: String, name: String },
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => f.write_str("string"),
            DataType::Number => f.write_str("number"),
            DataType::Boolean => f.write_str("boolean"),
            DataType::Enum { package, name } => write!(f, "{}.{}", package, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDecl {
    pub name: String,
    pub target: ClassRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<EnumEntryDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumEntryDecl {
    pub name: String,
    /// Literal default; entries without one evaluate to their qualified name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Expr>,
}

// ============================================================================
// ELEMENT HANDLES
// ============================================================================

/// `package.Class`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassRef {
    pub package: String,
    pub class: String,
}

impl ClassRef {
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.class)
    }
}

/// `package.Enum.Entry`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumEntryRef {
    pub package: String,
    #[serde(rename = "enum")]
    pub enumeration: String,
    pub entry: String,
}

impl EnumEntryRef {
    pub fn new(
        package: impl Into<String>,
        enumeration: impl Into<String>,
        entry: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            enumeration: enumeration.into(),
            entry: entry.into(),
        }
    }
}

impl fmt::Display for EnumEntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.package, self.enumeration, self.entry)
    }
}

/// Any static element that can be turned into a type key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementRef {
    /// A class or interface.
    Class { class: ClassRef },
    /// An attribute looked up on `owner` or one of its supertypes.
    Attribute { owner: ClassRef, name: String },
    /// A relation looked up on `owner` or one of its supertypes.
    Relation { owner: ClassRef, name: String },
    EnumEntry { entry: EnumEntryRef },
}

impl ElementRef {
    pub fn class(class: &ClassRef) -> Self {
        ElementRef::Class {
            class: class.clone(),
        }
    }

    pub fn attribute(owner: &ClassRef, name: &str) -> Self {
        ElementRef::Attribute {
            owner: owner.clone(),
            name: name.to_string(),
        }
    }

    pub fn relation(owner: &ClassRef, name: &str) -> Self {
        ElementRef::Relation {
            owner: owner.clone(),
            name: name.to_string(),
        }
    }

    pub fn enum_entry(entry: &EnumEntryRef) -> Self {
        ElementRef::EnumEntry {
            entry: entry.clone(),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Class { class } => write!(f, "class {}", class),
            ElementRef::Attribute { owner, name } => write!(f, "attribute {}.{}", owner, name),
            ElementRef::Relation { owner, name } => write!(f, "relation {}.{}", owner, name),
            ElementRef::EnumEntry { entry } => write!(f, "enum entry {}", entry),
        }
    }
}

// ============================================================================
// LOOKUPS
// ============================================================================

impl Metamodel {
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn class(&self, class: &ClassRef) -> Option<(&Package, &ClassDecl)> {
        let package = self.package(&class.package)?;
        let decl = package.classes.iter().find(|c| c.name == class.class)?;
        Some((package, decl))
    }

    pub fn enum_entry(&self, entry: &EnumEntryRef) -> Option<(&Package, &EnumDecl, &EnumEntryDecl)> {
        let package = self.package(&entry.package)?;
        let decl = package.enums.iter().find(|e| e.name == entry.enumeration)?;
        let entry_decl = decl.entries.iter().find(|e| e.name == entry.entry)?;
        Some((package, decl, entry_decl))
    }

    /// Finds the class declaring attribute `name`, searching `owner` then its supertypes
    /// depth-first in declaration order.
    pub fn attribute_owner(&self, owner: &ClassRef, name: &str) -> Option<(ClassRef, &AttributeDecl)> {
        self.find_member(owner, |decl| decl.attributes.iter().find(|a| a.name == name))
    }

    /// Finds the class declaring relation `name`, searching like [`Metamodel::attribute_owner`].
    pub fn relation_owner(&self, owner: &ClassRef, name: &str) -> Option<(ClassRef, &RelationDecl)> {
        self.find_member(owner, |decl| decl.relations.iter().find(|r| r.name == name))
    }

    fn find_member<'m, T>(
        &'m self,
        owner: &ClassRef,
        select: impl Fn(&'m ClassDecl) -> Option<&'m T>,
    ) -> Option<(ClassRef, &'m T)> {
        let mut visited = HashSet::new();
        let mut pending = vec![owner.clone()];
        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some((_, decl)) = self.class(&current) else {
                continue;
            };
            if let Some(member) = select(decl) {
                return Some((current, member));
            }
            // Reverse so the first declared supertype is searched first.
            pending.extend(decl.supertypes.iter().rev().cloned());
        }
        None
    }
}
