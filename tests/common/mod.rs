//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use instantia::ast::{
    Argument, Assignment, ClassRef, Expr, InstanceDecl, InstanceMutation, InstantiationUnit,
    MacroCall, MacroDecl, Param, Program, ReferenceLoop, Statement, Target,
};
use instantia::document::{self, SerializedInstance};
use instantia::runtime::ObjectInstance;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn load_fixture(name: &str) -> Program {
    document::load_program(fixture(name)).unwrap()
}

/// A program over the shop metamodel with the given macros and a single unit `main`.
pub fn shop_program(macros: Vec<MacroDecl>, statements: Vec<Statement>) -> Program {
    let mut program = load_fixture("shop.json");
    program.macros = macros;
    program.units = vec![InstantiationUnit {
        name: "main".to_string(),
        statements,
    }];
    program
}

pub fn item() -> ClassRef {
    ClassRef::new("shop", "Item")
}

pub fn cart() -> ClassRef {
    ClassRef::new("shop", "Cart")
}

pub fn create(class: ClassRef, name: &str, body: Vec<Assignment>) -> Statement {
    Statement::Create(InstanceDecl {
        class,
        name: name.to_string(),
        body,
    })
}

pub fn reopen(target: Target, body: Vec<Assignment>) -> Statement {
    Statement::Reopen(InstanceMutation { target, body })
}

pub fn call(macro_name: &str, args: Vec<Argument>, assign: Option<Target>) -> Statement {
    Statement::Call(MacroCall {
        macro_name: macro_name.to_string(),
        args,
        assign,
    })
}

pub fn for_each(variable: &str, source: &str, relation: &str, body: Vec<Statement>) -> Statement {
    Statement::ForEach(ReferenceLoop {
        variable: variable.to_string(),
        source: Target::var(source),
        relation: relation.to_string(),
        body,
    })
}

pub fn attr(name: &str, value: Expr) -> Assignment {
    Assignment::Attribute {
        name: name.to_string(),
        value,
    }
}

pub fn refer(relation: &str, target: Target) -> Assignment {
    Assignment::Reference {
        relation: relation.to_string(),
        target,
    }
}

pub fn macro_decl(name: &str, params: &[&str], body: Vec<Statement>) -> MacroDecl {
    MacroDecl {
        name: name.to_string(),
        params: params
            .iter()
            .map(|p| Param {
                name: p.to_string(),
                class: None,
            })
            .collect(),
        body,
    }
}

/// The `index`-th instance created by `unit`.
pub fn nth(unit: &SerializedInstance, index: usize) -> &ObjectInstance {
    &unit.instances[index]
}
