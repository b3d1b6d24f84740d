//! Runtime module for the instantiation engine
//!
//! This module provides the runtime value types, the evaluation environment, the two
//! reference-identity registries, the expression evaluator and the object instance model.
//! The macro execution engine in [`crate::engine`] drives all of them through an
//! [`ExecutionContext`](context::ExecutionContext).

pub mod context;
pub mod environment;
pub mod eval;
pub mod instance;
pub mod registry;
pub mod types;
pub mod value;

pub use context::ExecutionContext;
pub use environment::Environment;
pub use eval::{apply_binary, Evaluator, VARIABLE_PLACEHOLDER};
pub use instance::ObjectInstance;
pub use registry::{InstanceId, InstanceRegistry};
pub use types::{ElementKind, TypeEntry, TypeReferenceId, TypeRegistry};
pub use value::{Scalar, Value};
