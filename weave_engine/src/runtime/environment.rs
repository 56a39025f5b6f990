//! Evaluation environment
//!
//! An environment binds the payload, the user variables, and the header in
//! scope for one evaluation. Closures capture a snapshot of the variables
//! (by value) at lambda-construction time: later mutations to the outer
//! environment are invisible to captured closures.

use crate::runtime::value::{Value, ValueMap};
use crate::syntax::ast::Header;
use std::rc::Rc;

/// Name-to-value bindings for one evaluation
#[derive(Debug, Clone)]
pub struct Environment {
    pub payload: Value,
    pub variables: ValueMap,
    pub header: Option<Rc<Header>>,
}

impl Environment {
    pub fn new(payload: Value, variables: ValueMap, header: Option<Rc<Header>>) -> Self {
        Self {
            payload,
            variables,
            header,
        }
    }

    /// Root environment with no header reference, for standalone expressions
    pub fn root(payload: Value, variables: ValueMap) -> Self {
        Self::new(payload, variables, None)
    }

    /// Bind a variable, shadowing any existing binding of the same name
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name, value);
    }

    /// Snapshot of the current variables, captured by closures
    pub fn snapshot(&self) -> ValueMap {
        self.variables.clone()
    }

    /// Same payload and header, different variable bindings
    pub fn with_variables(&self, variables: ValueMap) -> Self {
        Self {
            payload: self.payload.clone(),
            variables,
            header: self.header.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_shadow() {
        let mut env = Environment::root(Value::Null, ValueMap::new());
        env.bind("x", Value::Integer(1));
        env.bind("x", Value::Integer(2));

        assert_eq!(env.variables.get("x"), Some(&Value::Integer(2)));
        assert_eq!(env.variables.len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut env = Environment::root(Value::Null, ValueMap::new());
        env.bind("x", Value::Integer(1));

        let snapshot = env.snapshot();
        env.bind("x", Value::Integer(2));

        assert_eq!(snapshot.get("x"), Some(&Value::Integer(1)));
        assert_eq!(env.variables.get("x"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_with_variables_keeps_payload() {
        let env = Environment::root(Value::Integer(42), ValueMap::new());
        let mut bound = ValueMap::new();
        bound.insert("n", Value::Integer(1));

        let child = env.with_variables(bound);
        assert_eq!(child.payload, Value::Integer(42));
        assert_eq!(child.variables.get("n"), Some(&Value::Integer(1)));
    }
}
