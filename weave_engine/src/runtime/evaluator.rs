//! Tree-walking evaluator
//!
//! Evaluation is single-threaded, synchronous, and strictly left-to-right.
//! The evaluator never mutates AST nodes; lambdas capture an environment
//! snapshot at construction time. Identifier lookup order is fixed:
//! `payload`, `vars`, intrinsics, then local bindings.

use crate::config::constants::compile_time::runtime::MAX_CALL_DEPTH;
use crate::runtime::environment::Environment;
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::intrinsics;
use crate::runtime::value::{Callable, LambdaValue, Value, ValueMap};
use crate::syntax::ast::{Expression, MatchCase};
use std::rc::Rc;

/// Expression evaluator with a call-depth guard
pub struct Evaluator {
    call_depth: usize,
}

impl Evaluator {
    pub fn new() -> Self {
        Self { call_depth: 0 }
    }

    /// Evaluate an expression in an environment
    pub fn evaluate(&mut self, expr: &Expression, env: &Environment) -> EvalResult<Value> {
        match expr {
            Expression::Null => Ok(Value::Null),
            Expression::Boolean(value) => Ok(Value::Boolean(*value)),
            Expression::Number(value) => Ok(coerce_number(*value)),
            Expression::String(value) => Ok(Value::String(value.clone())),
            Expression::Identifier(name) => self.resolve_identifier(name, env),

            Expression::Object(fields) => {
                let mut map = ValueMap::new();
                for (key, value_expr) in fields {
                    let value = self.evaluate(value_expr, env)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }

            Expression::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate(element, env)?);
                }
                Ok(Value::List(items))
            }

            Expression::Property {
                value,
                attribute,
                null_safe,
            } => {
                let base = self.evaluate(value, env)?;
                match resolve_property(&base, attribute) {
                    Ok(result) => Ok(result),
                    Err(error) if *null_safe && error.is_attribute_error() => Ok(Value::Null),
                    Err(error) => Err(error),
                }
            }

            Expression::Index { value, index } => {
                let base = self.evaluate(value, env)?;
                let index = self.evaluate(index, env)?;
                Ok(resolve_index(&base, &index))
            }

            Expression::Call {
                function,
                arguments,
            } => {
                let function = self.evaluate(function, env)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument, env)?);
                }
                match function {
                    Value::Callable(callable) => self.apply(&callable, args),
                    other => Err(EvalError::NotCallable {
                        kind: other.kind_name(),
                    }),
                }
            }

            Expression::Default { left, right } => {
                let left_value = self.evaluate(left, env)?;
                if left_value.is_null() {
                    self.evaluate(right, env)
                } else {
                    Ok(left_value)
                }
            }

            Expression::Lambda { parameters, body } => {
                Ok(Value::Callable(Callable::Lambda(Rc::new(LambdaValue {
                    parameters: parameters.clone(),
                    body: (**body).clone(),
                    closure: env.snapshot(),
                    payload: env.payload.clone(),
                    header: env.header.clone(),
                }))))
            }

            Expression::If {
                condition,
                when_true,
                when_false,
            } => {
                let condition_value = self.evaluate(condition, env)?;
                if condition_value.is_truthy() {
                    self.evaluate(when_true, env)
                } else {
                    self.evaluate(when_false, env)
                }
            }

            Expression::Match { value, cases } => {
                let subject = self.evaluate(value, env)?;
                self.evaluate_match(subject, cases, env)
            }
        }
    }

    /// Cases run in source order. The matcher is evaluated in the outer
    /// environment; the guard and the case body run in the match
    /// environment, which carries the `var` binding when present. No match
    /// and no else yields null.
    fn evaluate_match(
        &mut self,
        subject: Value,
        cases: &[MatchCase],
        env: &Environment,
    ) -> EvalResult<Value> {
        for case in cases {
            let pattern = match &case.pattern {
                None => return self.evaluate(&case.expression, env),
                Some(pattern) => pattern,
            };

            let match_env = if let Some(binding) = &pattern.binding {
                let mut variables = env.snapshot();
                variables.insert(binding.clone(), subject.clone());
                env.with_variables(variables)
            } else {
                env.clone()
            };

            let mut matches = true;
            if let Some(matcher) = &pattern.matcher {
                let expected = self.evaluate(matcher, env)?;
                matches = subject == expected;
            }
            if matches {
                if let Some(guard) = &pattern.guard {
                    let guard_value = self.evaluate(guard, &match_env)?;
                    matches = guard_value.is_truthy();
                }
            }
            if matches {
                return self.evaluate(&case.expression, &match_env);
            }
        }
        Ok(Value::Null)
    }

    /// Lookup order: payload, vars, intrinsics, locals
    fn resolve_identifier(&self, name: &str, env: &Environment) -> EvalResult<Value> {
        if name == "payload" {
            return Ok(env.payload.clone());
        }
        if name == "vars" {
            return Ok(Value::Object(env.variables.clone()));
        }
        if let Some(intrinsic) = intrinsics::lookup(name) {
            return Ok(Value::Callable(Callable::Intrinsic(intrinsic)));
        }
        if let Some(value) = env.variables.get(name) {
            return Ok(value.clone());
        }
        Err(EvalError::UnknownIdentifier {
            name: name.to_string(),
        })
    }

    // === CALLABLE APPLICATION ===

    /// Strict application, used by direct function calls: every parameter
    /// must be covered by an argument or a default.
    pub fn apply(&mut self, callable: &Callable, args: Vec<Value>) -> EvalResult<Value> {
        match callable {
            Callable::Intrinsic(intrinsic) => (intrinsic.func)(self, args),
            Callable::Lambda(lambda) => self.apply_lambda(lambda, args, true),
        }
    }

    /// Lenient invocation used by the higher-order intrinsics: arguments
    /// are truncated to the callable's parameter count, and parameters left
    /// uncovered with no default are bound to null.
    pub fn invoke_lambda(&mut self, callable: &Callable, mut args: Vec<Value>) -> EvalResult<Value> {
        args.truncate(Self::arity(callable));
        match callable {
            Callable::Intrinsic(intrinsic) => (intrinsic.func)(self, args),
            Callable::Lambda(lambda) => self.apply_lambda(lambda, args, false),
        }
    }

    /// Declared parameter count. This is the only place callables are
    /// introspected.
    pub fn arity(callable: &Callable) -> usize {
        match callable {
            Callable::Lambda(lambda) => lambda.parameters.len(),
            Callable::Intrinsic(intrinsic) => intrinsic.arity,
        }
    }

    fn apply_lambda(
        &mut self,
        lambda: &Rc<LambdaValue>,
        args: Vec<Value>,
        strict: bool,
    ) -> EvalResult<Value> {
        if args.len() > lambda.parameters.len() {
            return Err(EvalError::TooManyArguments {
                expected: lambda.parameters.len(),
                received: args.len(),
            });
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(EvalError::CallDepthExceeded {
                depth: self.call_depth,
            });
        }

        let mut variables = lambda.closure.clone();
        let mut provided = args.into_iter();
        for parameter in &lambda.parameters {
            let value = match provided.next() {
                Some(value) => value,
                None => match &parameter.default {
                    // Defaults observe the captured environment extended
                    // with the arguments already bound.
                    Some(default) => {
                        let default_env = Environment::new(
                            lambda.payload.clone(),
                            variables.clone(),
                            lambda.header.clone(),
                        );
                        self.evaluate(default, &default_env)?
                    }
                    None if strict => {
                        return Err(EvalError::MissingArgument {
                            name: parameter.name.clone(),
                        })
                    }
                    None => Value::Null,
                },
            };
            variables.insert(parameter.name.clone(), value);
        }

        let body_env = Environment::new(
            lambda.payload.clone(),
            variables,
            lambda.header.clone(),
        );

        self.call_depth += 1;
        let result = self.evaluate(&lambda.body, &body_env);
        self.call_depth -= 1;
        result
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Integral doubles become integers, everything else stays a double
fn coerce_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < i64::MAX as f64 {
        Value::Integer(value as i64)
    } else {
        Value::Double(value)
    }
}

/// Property access contract: null yields null, objects yield the value or
/// null when absent, anything else is an attribute error (swallowed by the
/// caller for null-safe access).
fn resolve_property(base: &Value, attribute: &str) -> EvalResult<Value> {
    match base {
        Value::Null => Ok(Value::Null),
        Value::Object(map) => Ok(map.get(attribute).cloned().unwrap_or(Value::Null)),
        other => Err(EvalError::AttributeAccess {
            attribute: attribute.to_string(),
            kind: other.kind_name(),
        }),
    }
}

/// Index access contract: null yields null; lists coerce the index to an
/// integer and yield null when out of range or not coercible; objects
/// coerce the index to a string key; strings index to one-character
/// strings; everything else yields null.
fn resolve_index(base: &Value, index: &Value) -> Value {
    match base {
        Value::Null => Value::Null,
        Value::List(items) => match coerce_index(index) {
            Some(i) if i >= 0 && (i as usize) < items.len() => items[i as usize].clone(),
            _ => Value::Null,
        },
        Value::Object(map) => map
            .get(&index.to_string())
            .cloned()
            .unwrap_or(Value::Null),
        Value::String(s) => match coerce_index(index) {
            Some(i) if i >= 0 => s
                .chars()
                .nth(i as usize)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

fn coerce_index(index: &Value) -> Option<i64> {
    match index {
        Value::Integer(n) => Some(*n),
        Value::Double(n) if n.is_finite() => Some(*n as i64),
        Value::Boolean(b) => Some(if *b { 1 } else { 0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
