//! Evaluation environments.
//!
//! An environment is one self-contained frame of variable bindings. There is no parent chain:
//! a macro's child frame only sees what was bound into it through parameter passing. Frames
//! are persistent maps, so cloning one for a loop iteration is cheap and the copy is fully
//! independent of the original.

use im::HashMap;

use crate::ast::Target;
use crate::runtime::value::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a binding, returning the previous value.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.bindings.insert(name.into(), value.into())
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Resolves `variable` or `variable.member`, looking the member up inside the tuple bound
    /// to `variable`.
    pub fn resolve(&self, target: &Target) -> Option<&Value> {
        let value = self.lookup(&target.variable)?;
        match &target.member {
            None => Some(value),
            Some(member) => value.as_tuple()?.lookup(member),
        }
    }

    pub fn unbind(&mut self, name: &str) -> Option<Value> {
        self.bindings.remove(name)
    }

    /// Copies bindings from `other` whose names are not bound here yet. Existing bindings are
    /// never overwritten.
    pub fn merge(&mut self, other: &Environment) {
        let current = std::mem::take(&mut self.bindings);
        self.bindings = current.union(other.bindings.clone());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::value::Scalar;

    fn num(n: f64) -> Value {
        Value::Scalar(Scalar::Number(n))
    }

    #[test]
    fn test_bind_overwrites() {
        let mut env = Environment::new();
        assert!(env.bind("a", num(1.0)).is_none());
        assert_eq!(env.bind("a", num(2.0)), Some(num(1.0)));
        assert_eq!(env.lookup("a"), Some(&num(2.0)));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut env = Environment::new();
        env.bind("a", num(1.0));
        let mut copy = env.clone();
        copy.bind("b", num(2.0));
        copy.bind("a", num(3.0));
        assert!(!env.contains("b"));
        assert_eq!(env.lookup("a"), Some(&num(1.0)));
    }

    #[test]
    fn test_merge_adds_without_overwriting() {
        let mut outer = Environment::new();
        outer.bind("a", num(1.0));
        let mut inner = outer.clone();
        inner.bind("a", num(9.0));
        inner.bind("b", num(2.0));

        outer.merge(&inner);
        assert_eq!(outer.lookup("a"), Some(&num(1.0)));
        assert_eq!(outer.lookup("b"), Some(&num(2.0)));
        assert_eq!(outer.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_unbind_scopes_loop_variable() {
        let mut outer = Environment::new();
        let mut iteration = outer.clone();
        iteration.bind("v", num(1.0));
        iteration.bind("made", num(2.0));
        iteration.unbind("v");
        outer.merge(&iteration);
        assert!(!outer.contains("v"));
        assert!(outer.contains("made"));
    }

    #[test]
    fn test_resolve_member_through_tuple() {
        let mut tuple = Environment::new();
        tuple.bind("x", num(4.0));
        let mut env = Environment::new();
        env.bind("t", Value::Tuple(tuple));
        env.bind("s", num(1.0));

        assert_eq!(env.resolve(&Target::member("t", "x")), Some(&num(4.0)));
        assert!(env.resolve(&Target::member("t", "y")).is_none());
        assert!(env.resolve(&Target::member("s", "x")).is_none());
        assert!(matches!(env.resolve(&Target::var("t")), Some(Value::Tuple(_))));
    }
}
