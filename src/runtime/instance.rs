//! Object instances and the rules for building them.
//!
//! An [`ObjectInstance`] is one vertex of the output graph. Attributes are single valued and
//! last-write-wins; references are multi valued and every assignment appends, keeping
//! insertion order and duplicates. The identity and type of an instance are fixed when it is
//! created; reopening an instance only adds attributes and references.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::ast::{Assignment, ClassRef, ElementRef, Expr, InstanceDecl, Target};
use crate::err_msg;
use crate::runtime::context::ExecutionContext;
use crate::runtime::environment::Environment;
use crate::runtime::registry::InstanceId;
use crate::runtime::types::TypeReferenceId;
use crate::runtime::value::{Scalar, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInstance {
    pub id: InstanceId,
    pub type_ref: TypeReferenceId,
    pub attributes: BTreeMap<String, Scalar>,
    pub references: BTreeMap<String, Vec<InstanceId>>,
    /// The declared class handle, kept for resolving member elements.
    #[serde(skip)]
    pub class: ClassRef,
}

impl ObjectInstance {
    pub fn new(id: InstanceId, class: ClassRef, type_ref: TypeReferenceId) -> Self {
        Self {
            id,
            type_ref,
            attributes: BTreeMap::new(),
            references: BTreeMap::new(),
            class,
        }
    }

    /// Stores `value`, replacing any earlier value of `name`.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Scalar) -> Option<Scalar> {
        self.attributes.insert(name.into(), value)
    }

    /// Appends `target` to the list of `relation`, creating the list if absent.
    pub fn push_reference(&mut self, relation: impl Into<String>, target: InstanceId) {
        self.references.entry(relation.into()).or_default().push(target);
    }

    pub fn attribute(&self, name: &str) -> Option<&Scalar> {
        self.attributes.get(name)
    }

    pub fn references(&self, relation: &str) -> &[InstanceId] {
        self.references.get(relation).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

/// Creates the instance declared by `decl` and runs its body.
///
/// The body sees the new instance under its declared name, so `x { next -> x }` refers to
/// itself. Binding the name in the caller's environment is left to the caller.
pub fn create_from(decl: &InstanceDecl, env: &Environment, ctx: &mut ExecutionContext) -> InstanceId {
    let type_ref = ctx.type_ref(&ElementRef::class(&decl.class));
    let id = ctx.instances.register(decl.class.clone(), type_ref);
    debug!(name = %decl.name, class = %decl.class, %id, "created instance");

    let mut scope = env.clone();
    scope.bind(decl.name.as_str(), Value::Instance(id));
    apply_body(id, &decl.body, &scope, ctx);
    id
}

/// Runs attribute and reference sub-statements against an existing instance, in order.
pub fn apply_body(id: InstanceId, body: &[Assignment], env: &Environment, ctx: &mut ExecutionContext) {
    for assignment in body {
        match assignment {
            Assignment::Attribute { name, value } => add_attribute(id, name, value, env, ctx),
            Assignment::Reference { relation, target } => add_reference(id, relation, target, env, ctx),
        }
    }
}

/// Evaluates `expr` and stores it under `name`, overwriting any prior value.
pub fn add_attribute(
    id: InstanceId,
    name: &str,
    expr: &Expr,
    env: &Environment,
    ctx: &mut ExecutionContext,
) {
    let Some(class) = ctx.instances.resolve(id).map(|i| i.class.clone()) else {
        ctx.diagnostics
            .push(err_msg!(UnresolvedReference, "instance {} is not registered", id));
        return;
    };
    ctx.type_ref(&ElementRef::attribute(&class, name));
    let value = ctx.evaluate(expr, env);
    if let Some(instance) = ctx.instances.resolve_mut(id) {
        instance.set_attribute(name, value);
    }
}

/// Resolves `target` to an instance and appends it to the list of `relation`.
pub fn add_reference(
    id: InstanceId,
    relation: &str,
    target: &Target,
    env: &Environment,
    ctx: &mut ExecutionContext,
) {
    let Some(class) = ctx.instances.resolve(id).map(|i| i.class.clone()) else {
        ctx.diagnostics
            .push(err_msg!(UnresolvedReference, "instance {} is not registered", id));
        return;
    };
    ctx.type_ref(&ElementRef::relation(&class, relation));

    let Some(target_id) = resolve_instance(target, env, ctx) else {
        return;
    };
    if let Some(instance) = ctx.instances.resolve_mut(id) {
        instance.push_reference(relation, target_id);
    }
}

/// Resolves a target handle through the environment and confirms it in the instance registry.
/// Failures are recorded and yield `None`.
pub fn resolve_instance(target: &Target, env: &Environment, ctx: &mut ExecutionContext) -> Option<InstanceId> {
    let found = match env.resolve(target) {
        Some(Value::Instance(id)) => Ok(*id),
        Some(other) => Err(err_msg!(
            UnresolvedReference,
            "'{}' is bound to a {}, not an instance",
            target,
            other.type_name()
        )),
        None => Err(err_msg!(UnresolvedReference, "'{}' is not bound", target)),
    };
    match found {
        Ok(id) if ctx.instances.contains(id) => Some(id),
        Ok(id) => {
            ctx.diagnostics
                .push(err_msg!(UnresolvedReference, "instance {} bound to '{}' is not registered", id, target));
            None
        }
        Err(err) => {
            ctx.diagnostics.push(err);
            None
        }
    }
}
