//! AST module for instantiation programs
//!
//! The surface grammar is parsed and validated elsewhere; this module defines the data the
//! engine consumes: a static metamodel ([`Metamodel`]) and a program of macros and top-level
//! instantiation units ([`Program`]). Every type derives serde so a program can be supplied as
//! a JSON or YAML document.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod model;

pub use model::{
    AttributeDecl, ClassDecl, ClassRef, DataType, ElementRef, EnumDecl, EnumEntryDecl,
    EnumEntryRef, Metamodel, Package, RelationDecl,
};

// ============================================================================
// PROGRAM
// ============================================================================

/// A validated instantiation program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Program {
    #[serde(default)]
    pub model: Metamodel,
    #[serde(default)]
    pub macros: Vec<MacroDecl>,
    #[serde(default)]
    pub units: Vec<InstantiationUnit>,
}

impl Program {
    /// Looks up a macro declaration by name.
    pub fn find_macro(&self, name: &str) -> Option<&MacroDecl> {
        self.macros.iter().find(|m| m.name == name)
    }
}

/// A parameterized, reusable instantiation sub-program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Vec<Statement>,
}

/// A formal macro parameter. The declared class is informational only; argument typing is
/// checked before execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassRef>,
}

/// One top-level named block whose statements build part of the output graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantiationUnit {
    pub name: String,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `A.B x { ... }`
    Create(InstanceDecl),
    /// `x { ... }`
    Reopen(InstanceMutation),
    /// `t = M(args)` or `v = M(args).member` or a bare `M(args)`
    Call(MacroCall),
    /// `for v in x -> rel { ... }`
    ForEach(ReferenceLoop),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDecl {
    pub class: ClassRef,
    pub name: String,
    #[serde(default)]
    pub body: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceMutation {
    pub target: Target,
    #[serde(default)]
    pub body: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroCall {
    #[serde(rename = "macro")]
    pub macro_name: String,
    #[serde(default)]
    pub args: Vec<Argument>,
    /// Caller-side variable receiving the result; `member` selects one named result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign: Option<Target>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLoop {
    pub variable: String,
    pub source: Target,
    pub relation: String,
    #[serde(default)]
    pub body: Vec<Statement>,
}

/// A sub-statement inside an instance body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    /// `name = expr`
    Attribute { name: String, value: Expr },
    /// `relation -> target`
    Reference { relation: String, target: Target },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Argument {
    Constant { value: Expr },
    Variable { target: Target },
}

/// A variable, optionally selecting a member of the tuple bound to it (`t.member`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

impl Target {
    pub fn var(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            member: None,
        }
    }

    pub fn member(variable: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            member: Some(member.into()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}", self.variable, member),
            None => write!(f, "{}", self.variable),
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Bool {
        value: bool,
    },
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Variable {
        name: String,
    },
    EnumValue {
        entry: EnumEntryRef,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Any expression shape this engine does not know.
    #[serde(other)]
    Unsupported,
}

impl Expr {
    pub fn bool(value: bool) -> Self {
        Expr::Bool { value }
    }

    pub fn number(value: f64) -> Self {
        Expr::Number { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String {
            value: value.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable { name: name.into() }
    }

    pub fn enum_value(entry: EnumEntryRef) -> Self {
        Expr::EnumValue { entry }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Pretty-prints the expression in surface syntax.
    pub fn pretty(&self) -> String {
        match self {
            Expr::Bool { value } => value.to_string(),
            Expr::Number { value } => value.to_string(),
            Expr::String { value } => format!("\"{}\"", value),
            Expr::Variable { name } => name.clone(),
            Expr::EnumValue { entry } => entry.to_string(),
            Expr::Binary { op, lhs, rhs } => {
                format!("({} {} {})", lhs.pretty(), op, rhs.pretty())
            }
            Expr::Unsupported => "<unsupported>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "^")]
    Xor,
    /// Any operator symbol this engine does not know.
    #[serde(other)]
    Unsupported,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Xor => "^",
            BinaryOp::Unsupported => "?",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_documents_deserialize() {
        let json = r#"[
            {"kind": "create", "class": {"package": "shop", "class": "Item"}, "name": "x",
             "body": [{"kind": "attribute", "name": "price", "value": {"kind": "number", "value": 3}}]},
            {"kind": "reopen", "target": {"variable": "x"},
             "body": [{"kind": "reference", "relation": "next", "target": {"variable": "t", "member": "y"}}]},
            {"kind": "call", "macro": "make", "args": [{"kind": "constant", "value": {"kind": "string", "value": "A"}}],
             "assign": {"variable": "t"}},
            {"kind": "for_each", "variable": "v", "source": {"variable": "x"}, "relation": "next", "body": []}
        ]"#;
        let statements: Vec<Statement> = serde_json::from_str(json).unwrap();
        assert_eq!(statements.len(), 4);
        let Statement::Reopen(mutation) = &statements[1] else {
            panic!("expected reopen, got {:?}", statements[1]);
        };
        assert_eq!(
            mutation.body[0],
            Assignment::Reference {
                relation: "next".to_string(),
                target: Target::member("t", "y"),
            }
        );
        let Statement::Call(call) = &statements[2] else {
            panic!("expected call");
        };
        assert_eq!(call.macro_name, "make");
        assert_eq!(call.assign, Some(Target::var("t")));
    }

    #[test]
    fn test_unknown_expression_kind_is_unsupported() {
        let expr: Expr = serde_json::from_str(r#"{"kind": "lambda"}"#).unwrap();
        assert_eq!(expr, Expr::Unsupported);
    }

    #[test]
    fn test_unknown_operator_is_unsupported() {
        let expr: Expr = serde_json::from_str(
            r#"{"kind": "binary", "op": "&&", "lhs": {"kind": "bool", "value": true}, "rhs": {"kind": "bool", "value": false}}"#,
        )
        .unwrap();
        assert_eq!(expr, Expr::binary(BinaryOp::Unsupported, Expr::bool(true), Expr::bool(false)));
        assert_eq!(expr.pretty(), "(true ? false)");
    }

    #[test]
    fn test_binary_operator_symbols() {
        let expr: Expr = serde_json::from_str(
            r#"{"kind": "binary", "op": "^", "lhs": {"kind": "number", "value": 2}, "rhs": {"kind": "number", "value": 4}}"#,
        )
        .unwrap();
        assert_eq!(expr, Expr::binary(BinaryOp::Xor, Expr::number(2.0), Expr::number(4.0)));
        assert_eq!(expr.pretty(), "(2 ^ 4)");
    }
}
