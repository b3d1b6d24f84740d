use crate::ast::{ElementRef, Expr, Metamodel};
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::runtime::environment::Environment;
use crate::runtime::eval::Evaluator;
use crate::runtime::registry::InstanceRegistry;
use crate::runtime::types::{TypeReferenceId, TypeRegistry};
use crate::runtime::value::Scalar;

/// The per-run state every construction and evaluation step needs: the static model, both
/// registries and the diagnostic sink. Created fresh for each run and passed explicitly.
pub struct ExecutionContext<'m> {
    pub model: &'m Metamodel,
    pub types: TypeRegistry,
    pub instances: InstanceRegistry,
    pub diagnostics: Diagnostics,
    pub max_depth: usize,
}

impl<'m> ExecutionContext<'m> {
    pub fn new(model: &'m Metamodel, config: &EngineConfig) -> Self {
        Self {
            model,
            types: TypeRegistry::new(),
            instances: InstanceRegistry::new(config.seed),
            diagnostics: Diagnostics::new(config.policy),
            max_depth: config.max_depth,
        }
    }

    pub fn evaluate(&mut self, expr: &Expr, env: &Environment) -> Scalar {
        Evaluator::new(self.model, &mut self.diagnostics, self.max_depth).evaluate(expr, env)
    }

    /// Resolves a static element, degrading to the `unknown` key.
    pub fn type_ref(&mut self, element: &ElementRef) -> TypeReferenceId {
        self.types
            .resolve_or_unknown(self.model, element, &mut self.diagnostics)
    }
}
