use std::sync::Arc;

use indexmap::IndexMap;

use crate::{builtins, value::Value};

/// The names visible at a point of evaluation.
///
/// An environment is never changed once evaluation has started: entering a
/// nested scope produces a new environment with [`Environment::bind`] that
/// shares everything already bound with its parent. A binding made in a
/// child is therefore invisible to the parent and to sibling scopes.
///
/// # Examples
///
/// ```
/// use flwor_lang::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.define("x", Value::Integer(1));
///
/// let child = env.bind("y", Value::Integer(2));
/// assert!(child.get("x").is_some());
/// assert!(child.get("y").is_some());
/// assert!(env.get("y").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Bindings supplied by the caller
    globals: Arc<IndexMap<String, Value>>,
    /// Innermost scoped binding, linked to the enclosing ones
    scope: Option<Arc<Binding>>,
}

#[derive(Debug)]
struct Binding {
    name: String,
    value: Value,
    parent: Option<Arc<Binding>>,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment holding the prelude: `None`, `true`, `false`
    /// and the builtin functions.
    pub fn with_builtins() -> Self {
        let mut env = Environment::new();
        builtins::install(&mut env);
        env
    }

    /// Adds or replaces a caller-supplied binding.
    ///
    /// Meant for setting up an environment before a query runs; clones taken
    /// earlier keep their own view.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.globals).insert(name.into(), value.into());
    }

    /// Builder-style [`Environment::define`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.define(name, value);
        self
    }

    /// Returns a child environment that adds (or shadows) `name`.
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Environment {
        Environment {
            globals: Arc::clone(&self.globals),
            scope: Some(Arc::new(Binding {
                name: name.into(),
                value,
                parent: self.scope.clone(),
            })),
        }
    }

    /// Looks a name up, innermost binding first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut scope = self.scope.as_deref();
        while let Some(binding) = scope {
            if binding.name == name {
                return Some(&binding.value);
            }
            scope = binding.parent.as_deref();
        }
        self.globals.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Environment::new();
        for (name, value) in iter {
            env.define(name, value);
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_binding_does_not_leak() {
        let env: Environment = [("a", Value::Integer(1))].into_iter().collect();
        let left = env.bind("x", Value::Integer(10));
        let right = env.bind("x", Value::Integer(20));

        assert_eq!(left.get("x"), Some(&Value::Integer(10)));
        assert_eq!(right.get("x"), Some(&Value::Integer(20)));
        assert_eq!(env.get("x"), None);
        assert_eq!(left.get("a"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_shadowing() {
        let env = Environment::new().with("x", Value::Integer(1));
        let inner = env.bind("x", Value::Integer(2));
        assert_eq!(inner.get("x"), Some(&Value::Integer(2)));
        assert_eq!(env.get("x"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_define_after_clone_is_isolated() {
        let mut env = Environment::new().with("x", Value::Integer(1));
        let snapshot = env.clone();
        env.define("y", Value::Integer(2));
        assert!(snapshot.get("y").is_none());
        assert!(env.get("y").is_some());
    }
}
