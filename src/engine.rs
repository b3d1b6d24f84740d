//! Macro execution engine.
//!
//! Runs every instantiation unit of a [`Program`] in declaration order against a fresh root
//! environment and collects the instances each unit creates. Macro calls run their bodies in a
//! fresh child environment; reference loops run once per target with a cloned environment and
//! merge new bindings back outward.
//!
//! Degradations are recorded in the run's [`Diagnostics`](crate::Diagnostics) sink. The sink
//! is checked after every statement, so under [`Policy::Strict`](crate::Policy) the first
//! diagnostic aborts the run.

use tracing::{debug, info, trace};

use crate::ast::{
    Argument, ElementRef, InstantiationUnit, MacroCall, MacroDecl, Program, ReferenceLoop,
    Statement,
};
use crate::config::EngineConfig;
use crate::document::{OutputDocument, SerializedInstance, SerializedInstances};
use crate::err_msg;
use crate::runtime::instance::{apply_body, create_from, resolve_instance};
use crate::runtime::{Environment, ExecutionContext, InstanceId, Value};
use crate::InstantiaError;

// ============================================================================
// TYPE ALIASES
// ============================================================================

type ExecutionResult = Result<(), InstantiaError>;

// ============================================================================
// ENGINE
// ============================================================================

/// Executes a program with one configuration. Each call to [`Engine::run`] is an independent
/// run with its own registries, so equal configurations give equal documents.
pub struct Engine<'p> {
    program: &'p Program,
    config: EngineConfig,
}

impl<'p> Engine<'p> {
    pub fn new(program: &'p Program, config: EngineConfig) -> Self {
        Self { program, config }
    }

    /// Runs all units and builds the output document.
    ///
    /// Fails only under the strict policy; a lenient run always produces a document, with
    /// every degradation listed in its `diagnostics`.
    pub fn run(&self) -> Result<OutputDocument, InstantiaError> {
        let mut executor = Executor::new(self.program, &self.config);
        let mut units = Vec::with_capacity(self.program.units.len());
        for unit in &self.program.units {
            units.push(executor.execute_unit(unit)?);
        }
        Ok(executor.into_document(units))
    }
}

// ============================================================================
// EXECUTOR
// ============================================================================

struct Executor<'p> {
    program: &'p Program,
    ctx: ExecutionContext<'p>,
    /// Current macro nesting.
    depth: usize,
    /// Instances created by the unit being executed, in creation order.
    created: Vec<InstanceId>,
}

impl<'p> Executor<'p> {
    fn new(program: &'p Program, config: &EngineConfig) -> Self {
        Self {
            program,
            ctx: ExecutionContext::new(&program.model, config),
            depth: 0,
            created: Vec::new(),
        }
    }

    fn execute_unit(&mut self, unit: &InstantiationUnit) -> Result<SerializedInstance, InstantiaError> {
        debug!(unit = %unit.name, statements = unit.statements.len(), "executing unit");
        self.created.clear();
        let mut env = Environment::new();

        self.ctx.diagnostics.enter(format!("unit {}", unit.name));
        let result = self.execute_block(&unit.statements, &mut env);
        self.ctx.diagnostics.leave();
        result?;

        let instances = self
            .created
            .iter()
            .filter_map(|id| self.ctx.instances.resolve(*id).cloned())
            .collect::<Vec<_>>();
        info!(unit = %unit.name, instances = instances.len(), "unit finished");
        Ok(SerializedInstance {
            name: unit.name.clone(),
            instances,
        })
    }

    fn execute_block(&mut self, statements: &[Statement], env: &mut Environment) -> ExecutionResult {
        for statement in statements {
            self.execute_statement(statement, env)?;
            self.ctx.diagnostics.check()?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, statement: &Statement, env: &mut Environment) -> ExecutionResult {
        match statement {
            Statement::Create(decl) => {
                self.ctx.diagnostics.enter(format!("create {}", decl.name));
                let id = create_from(decl, env, &mut self.ctx);
                self.ctx.diagnostics.leave();
                env.bind(decl.name.as_str(), Value::Instance(id));
                self.created.push(id);
                Ok(())
            }
            Statement::Reopen(mutation) => {
                self.ctx.diagnostics.enter(format!("reopen {}", mutation.target));
                if let Some(id) = resolve_instance(&mutation.target, env, &mut self.ctx) {
                    apply_body(id, &mutation.body, env, &mut self.ctx);
                }
                self.ctx.diagnostics.leave();
                Ok(())
            }
            Statement::Call(call) => self.call_macro(call, env),
            Statement::ForEach(lp) => {
                self.ctx
                    .diagnostics
                    .enter(format!("for {} in {} -> {}", lp.variable, lp.source, lp.relation));
                let result = self.run_loop(lp, env);
                self.ctx.diagnostics.leave();
                result
            }
        }
    }

    // ------------------------------------------------------------------------
    // Macro calls
    // ------------------------------------------------------------------------

    fn call_macro(&mut self, call: &MacroCall, env: &mut Environment) -> ExecutionResult {
        let program = self.program;
        let Some(decl) = program.find_macro(&call.macro_name) else {
            self.ctx.diagnostics.push(
                err_msg!(UnresolvedReference, "unknown macro '{}'", call.macro_name)
                    .with_help("macros must be declared in the program's `macros` list"),
            );
            return Ok(());
        };
        if self.depth >= self.ctx.max_depth {
            self.ctx.diagnostics.push(err_msg!(
                RecursionLimit,
                "macro '{}' nested deeper than {} calls",
                decl.name,
                self.ctx.max_depth
            ));
            return Ok(());
        }

        let mut child = self.bind_arguments(decl, call, env);
        debug!(macro_name = %decl.name, depth = self.depth, "calling macro");

        self.depth += 1;
        self.ctx.diagnostics.enter(format!("macro {}", decl.name));
        let result = self.execute_block(&decl.body, &mut child);
        self.ctx.diagnostics.leave();
        self.depth -= 1;
        result?;

        if let Some(assign) = &call.assign {
            match &assign.member {
                None => {
                    env.bind(assign.variable.as_str(), Value::Tuple(child));
                }
                Some(member) => match child.lookup(member) {
                    Some(value) => {
                        env.bind(assign.variable.as_str(), value.clone());
                    }
                    None => self.ctx.diagnostics.push(err_msg!(
                        UnresolvedReference,
                        "macro '{}' has no result named '{}'",
                        decl.name,
                        member
                    )),
                },
            }
        }
        Ok(())
    }

    /// Pairs arguments with parameters by position into a fresh environment. Constants are
    /// evaluated in the caller's environment; variables copy the caller's value.
    fn bind_arguments(&mut self, decl: &MacroDecl, call: &MacroCall, env: &Environment) -> Environment {
        let mut child = Environment::new();
        for (param, arg) in decl.params.iter().zip(&call.args) {
            match arg {
                Argument::Constant { value } => {
                    let scalar = self.ctx.evaluate(value, env);
                    child.bind(param.name.as_str(), scalar);
                }
                Argument::Variable { target } => match env.resolve(target) {
                    Some(value) => {
                        child.bind(param.name.as_str(), value.clone());
                    }
                    None => self.ctx.diagnostics.push(err_msg!(
                        UnresolvedReference,
                        "argument '{}' for parameter '{}' of macro '{}' is not bound",
                        target,
                        param.name,
                        decl.name
                    )),
                },
            }
        }
        child
    }

    // ------------------------------------------------------------------------
    // Reference loops
    // ------------------------------------------------------------------------

    fn run_loop(&mut self, lp: &ReferenceLoop, env: &mut Environment) -> ExecutionResult {
        let Some(source) = resolve_instance(&lp.source, env, &mut self.ctx) else {
            return Ok(());
        };
        let Some(targets) = self.loop_targets(source, lp) else {
            return Ok(());
        };

        for (index, target) in targets.into_iter().enumerate() {
            if !self.ctx.instances.contains(target) {
                self.ctx.diagnostics.push(err_msg!(
                    UnresolvedReference,
                    "reference {} of '{}' is not registered",
                    target,
                    lp.relation
                ));
                continue;
            }
            trace!(variable = %lp.variable, %target, index, "loop iteration");

            let mut scope = env.clone();
            scope.bind(lp.variable.as_str(), Value::Instance(target));
            self.execute_block(&lp.body, &mut scope)?;
            scope.unbind(&lp.variable);
            env.merge(&scope);
        }
        Ok(())
    }

    /// Snapshot of the source's reference list taken at loop entry.
    ///
    /// A relation the class declares but that holds no references yet iterates zero times. A
    /// relation the class does not declare at all is reported.
    fn loop_targets(&mut self, source: InstanceId, lp: &ReferenceLoop) -> Option<Vec<InstanceId>> {
        let instance = self.ctx.instances.resolve(source)?;
        if let Some(list) = instance.references.get(&lp.relation) {
            return Some(list.clone());
        }
        let class = instance.class.clone();
        if self.ctx.model.relation_owner(&class, &lp.relation).is_some() {
            self.ctx.type_ref(&ElementRef::relation(&class, &lp.relation));
            return Some(Vec::new());
        }
        self.ctx.diagnostics.push(err_msg!(
            UnresolvedReference,
            "'{}' has no relation '{}'",
            lp.source,
            lp.relation
        ));
        None
    }

    fn into_document(self, units: Vec<SerializedInstance>) -> OutputDocument {
        let diagnostics = self.ctx.diagnostics.records();
        OutputDocument {
            types: self.ctx.types.into_entries(),
            instances: SerializedInstances { units },
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClassRef, InstanceDecl, Target};

    fn item(name: &str) -> Statement {
        Statement::Create(InstanceDecl {
            class: ClassRef::new("shop", "Item"),
            name: name.to_string(),
            body: vec![],
        })
    }

    fn program(statements: Vec<Statement>) -> Program {
        let mut program: Program = serde_json::from_str(
            r#"{"model": {"packages": [{"name": "shop", "path": "shop.mm",
                "classes": [{"name": "Item", "relations": [{"name": "next", "target": {"package": "shop", "class": "Item"}}]}]}]}}"#,
        )
        .unwrap();
        program.units.push(InstantiationUnit {
            name: "main".to_string(),
            statements,
        });
        program
    }

    #[test]
    fn test_unit_collects_created_instances_in_order() {
        let program = program(vec![item("a"), item("b")]);
        let doc = Engine::new(&program, EngineConfig::default()).run().unwrap();
        let unit = doc.instances.unit("main").unwrap();
        assert_eq!(unit.instances.len(), 2);
        assert!(doc.diagnostics.is_empty());
        assert!(doc.types.keys().any(|k| k.as_str() == "shop.mm#/class/Item"));
    }

    #[test]
    fn test_declared_but_empty_relation_iterates_zero_times() {
        let program = program(vec![
            item("a"),
            Statement::ForEach(ReferenceLoop {
                variable: "v".to_string(),
                source: Target::var("a"),
                relation: "next".to_string(),
                body: vec![item("never")],
            }),
        ]);
        let doc = Engine::new(&program, EngineConfig::default()).run().unwrap();
        assert_eq!(doc.instances.unit("main").unwrap().instances.len(), 1);
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn test_undeclared_relation_is_reported() {
        let program = program(vec![
            item("a"),
            Statement::ForEach(ReferenceLoop {
                variable: "v".to_string(),
                source: Target::var("a"),
                relation: "missing".to_string(),
                body: vec![],
            }),
        ]);
        let doc = Engine::new(&program, EngineConfig::default()).run().unwrap();
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(
            doc.diagnostics[0].location.as_deref(),
            Some("unit main > for v in a -> missing")
        );
    }
}
