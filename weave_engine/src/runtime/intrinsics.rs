//! Intrinsic operators
//!
//! The closed table of host callables the parser lowers infix and binary
//! operators into. The table is built once at first use and never mutated
//! afterwards, so evaluations may run concurrently against it.
//!
//! Arithmetic intrinsics treat null operands as zero. Higher-order
//! intrinsics take `(sequence, function)` and invoke the callable through
//! the evaluator's lenient path, which truncates `(item, index)` arguments
//! to the callable's declared parameter count.

use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::value::{Callable, Value, ValueMap};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Host intrinsic function signature
pub type IntrinsicFn = fn(&mut Evaluator, Vec<Value>) -> EvalResult<Value>;

/// A named host callable with a declared parameter count
#[derive(Debug, Clone, Copy)]
pub struct Intrinsic {
    pub name: &'static str,
    pub arity: usize,
    pub func: IntrinsicFn,
}

impl PartialEq for Intrinsic {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

fn table() -> &'static HashMap<&'static str, Intrinsic> {
    static TABLE: OnceLock<HashMap<&'static str, Intrinsic>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let entries: &[(&'static str, IntrinsicFn)] = &[
            ("_binary_plus", binary_plus),
            ("_binary_times", binary_times),
            ("_binary_concat", binary_concat),
            ("_binary_diff", binary_diff),
            ("_binary_eq", binary_eq),
            ("_binary_neq", binary_neq),
            ("_binary_gt", binary_gt),
            ("_binary_lt", binary_lt),
            ("_binary_gte", binary_gte),
            ("_binary_lte", binary_lte),
            ("_infix_map", infix_map),
            ("_infix_filter", infix_filter),
            ("_infix_flatMap", infix_flat_map),
            ("_infix_distinctBy", infix_distinct_by),
            ("_infix_reduce", infix_reduce),
            ("_infix_to", infix_to),
        ];

        entries
            .iter()
            .map(|&(name, func)| {
                (
                    name,
                    Intrinsic {
                        name,
                        arity: 2,
                        func,
                    },
                )
            })
            .collect()
    })
}

/// Look up an intrinsic by its reserved name
pub fn lookup(name: &str) -> Option<Intrinsic> {
    table().get(name).copied()
}

/// Check whether a name is reserved for an intrinsic
pub fn contains(name: &str) -> bool {
    table().contains_key(name)
}

// ============================================================================
// HELPERS
// ============================================================================

fn take_two(args: Vec<Value>) -> (Value, Value) {
    let mut iter = args.into_iter();
    let left = iter.next().unwrap_or(Value::Null);
    let right = iter.next().unwrap_or(Value::Null);
    (left, right)
}

/// Arithmetic treats null as zero
fn zero_if_null(value: Value) -> Value {
    match value {
        Value::Null => Value::Integer(0),
        other => other,
    }
}

fn expect_callable(value: &Value) -> EvalResult<&Callable> {
    match value {
        Value::Callable(callable) => Ok(callable),
        other => Err(EvalError::NotCallable {
            kind: other.kind_name(),
        }),
    }
}

/// Sequence coercion: null is empty, lists are themselves, objects yield
/// their values in insertion order, scalars become single-element lists.
pub fn to_iterable(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        other => vec![other.clone()],
    }
}

fn compare(operator: &'static str, left: &Value, right: &Value) -> EvalResult<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).ok_or(EvalError::InvalidOperands {
            operator,
            left: left.kind_name(),
            right: right.kind_name(),
        }),
        _ => Err(EvalError::InvalidOperands {
            operator,
            left: left.kind_name(),
            right: right.kind_name(),
        }),
    }
}

/// String coercion used by `++` when one side is already a string
fn concat_coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Double(_) => {
            Some(value.to_string())
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

// ============================================================================
// BINARY OPERATORS
// ============================================================================

fn binary_plus(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    let (left, right) = (zero_if_null(left), zero_if_null(right));
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(a
            .checked_add(b)
            .map(Value::Integer)
            .unwrap_or(Value::Double(a as f64 + b as f64))),
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (left, right) => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Ok(Value::Double(a + b)),
            _ => Err(EvalError::InvalidOperands {
                operator: "+",
                left: left.kind_name(),
                right: right.kind_name(),
            }),
        },
    }
}

fn binary_times(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    let (left, right) = (zero_if_null(left), zero_if_null(right));
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(a
            .checked_mul(b)
            .map(Value::Integer)
            .unwrap_or(Value::Double(a as f64 * b as f64))),
        (left, right) => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Ok(Value::Double(a * b)),
            _ => Err(EvalError::InvalidOperands {
                operator: "*",
                left: left.kind_name(),
                right: right.kind_name(),
            }),
        },
    }
}

/// `++` concatenates strings and lists and merges objects; a string side
/// coerces a scalar other side.
fn binary_concat(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    match (&left, &right) {
        (Value::List(a), Value::List(b)) => {
            let mut result = a.clone();
            result.extend(b.iter().cloned());
            Ok(Value::List(result))
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut result = a.clone();
            for (key, value) in b.iter() {
                result.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(result))
        }
        (Value::String(_), _) | (_, Value::String(_)) => {
            match (concat_coerce(&left), concat_coerce(&right)) {
                (Some(a), Some(b)) => Ok(Value::String(a + &b)),
                _ => Err(EvalError::InvalidOperands {
                    operator: "++",
                    left: left.kind_name(),
                    right: right.kind_name(),
                }),
            }
        }
        _ => Err(EvalError::InvalidOperands {
            operator: "++",
            left: left.kind_name(),
            right: right.kind_name(),
        }),
    }
}

/// `--` removes the right side's elements from a list, or the right side's
/// keys from an object.
fn binary_diff(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    match (left, right) {
        (Value::List(items), Value::List(removals)) => Ok(Value::List(
            items
                .into_iter()
                .filter(|item| !removals.contains(item))
                .collect(),
        )),
        (Value::Object(map), Value::List(keys)) => {
            let mut result = map;
            for key in &keys {
                result.remove(&key.to_string());
            }
            Ok(Value::Object(result))
        }
        (left, right) => Err(EvalError::InvalidOperands {
            operator: "--",
            left: left.kind_name(),
            right: right.kind_name(),
        }),
    }
}

fn binary_eq(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    Ok(Value::Boolean(left == right))
}

fn binary_neq(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    Ok(Value::Boolean(left != right))
}

fn binary_gt(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    compare(">", &left, &right).map(|ordering| Value::Boolean(ordering == Ordering::Greater))
}

fn binary_lt(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    compare("<", &left, &right).map(|ordering| Value::Boolean(ordering == Ordering::Less))
}

fn binary_gte(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    compare(">=", &left, &right).map(|ordering| Value::Boolean(ordering != Ordering::Less))
}

fn binary_lte(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (left, right) = take_two(args);
    compare("<=", &left, &right).map(|ordering| Value::Boolean(ordering != Ordering::Greater))
}

// ============================================================================
// HIGHER-ORDER OPERATORS
// ============================================================================

fn infix_map(evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (sequence, function) = take_two(args);
    let callable = expect_callable(&function)?.clone();

    let mut result = Vec::new();
    for (index, item) in to_iterable(&sequence).into_iter().enumerate() {
        result.push(
            evaluator.invoke_lambda(&callable, vec![item, Value::Integer(index as i64)])?,
        );
    }
    Ok(Value::List(result))
}

fn infix_filter(evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (sequence, function) = take_two(args);
    let callable = expect_callable(&function)?.clone();

    let mut result = Vec::new();
    for (index, item) in to_iterable(&sequence).into_iter().enumerate() {
        let keep = evaluator
            .invoke_lambda(&callable, vec![item.clone(), Value::Integer(index as i64)])?;
        if keep.is_truthy() {
            result.push(item);
        }
    }
    Ok(Value::List(result))
}

fn infix_flat_map(evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (sequence, function) = take_two(args);
    let callable = expect_callable(&function)?.clone();

    let mut result = Vec::new();
    for (index, item) in to_iterable(&sequence).into_iter().enumerate() {
        let mapped =
            evaluator.invoke_lambda(&callable, vec![item, Value::Integer(index as i64)])?;
        result.extend(to_iterable(&mapped));
    }
    Ok(Value::List(result))
}

/// Keeps the first occurrence of each distinct key. Key equality is
/// structural value equality, consistent across all kinds.
fn infix_distinct_by(evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (sequence, function) = take_two(args);
    let items = to_iterable(&sequence);
    if function.is_null() {
        return Ok(Value::List(items));
    }
    let callable = expect_callable(&function)?.clone();

    let mut seen: Vec<Value> = Vec::new();
    let mut result = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let key = evaluator
            .invoke_lambda(&callable, vec![item.clone(), Value::Integer(index as i64)])?;
        if !seen.contains(&key) {
            seen.push(key);
            result.push(item);
        }
    }
    Ok(Value::List(result))
}

/// The first element seeds the accumulator through a one-argument call; for
/// the rest, callables with more than one parameter receive
/// `(item, accumulator)` while one-parameter callables receive the item
/// alone. An empty sequence reduces to null.
fn infix_reduce(evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (sequence, function) = take_two(args);
    let callable = expect_callable(&function)?.clone();
    let parameter_count = Evaluator::arity(&callable);

    let mut accumulator: Option<Value> = None;
    for item in to_iterable(&sequence) {
        accumulator = Some(match accumulator {
            None => evaluator.invoke_lambda(&callable, vec![item])?,
            Some(acc) => {
                if parameter_count > 1 {
                    evaluator.invoke_lambda(&callable, vec![item, acc])?
                } else {
                    evaluator.invoke_lambda(&callable, vec![item])?
                }
            }
        });
    }
    Ok(accumulator.unwrap_or(Value::Null))
}

fn range_bound(operator: &'static str, value: &Value, other: &Value) -> EvalResult<i64> {
    match value {
        Value::Integer(n) => Ok(*n),
        Value::Double(n) if n.fract() == 0.0 && n.is_finite() => Ok(*n as i64),
        _ => Err(EvalError::InvalidOperands {
            operator,
            left: value.kind_name(),
            right: other.kind_name(),
        }),
    }
}

/// Inclusive integer range `[start, end]`; descending when start > end
fn infix_to(_evaluator: &mut Evaluator, args: Vec<Value>) -> EvalResult<Value> {
    let (start, end) = take_two(args);
    let from = range_bound("to", &start, &end)?;
    let until = range_bound("to", &end, &start)?;

    let values = if from <= until {
        (from..=until).map(Value::Integer).collect()
    } else {
        (until..=from).rev().map(Value::Integer).collect()
    };
    Ok(Value::List(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let intrinsic = lookup(name).expect("intrinsic registered");
        let mut evaluator = Evaluator::new();
        (intrinsic.func)(&mut evaluator, args)
    }

    #[test]
    fn test_table_is_complete() {
        for name in [
            "_binary_plus",
            "_binary_times",
            "_binary_concat",
            "_binary_diff",
            "_binary_eq",
            "_binary_neq",
            "_binary_gt",
            "_binary_lt",
            "_binary_gte",
            "_binary_lte",
            "_infix_map",
            "_infix_filter",
            "_infix_flatMap",
            "_infix_distinctBy",
            "_infix_reduce",
            "_infix_to",
        ] {
            assert!(contains(name), "missing intrinsic: {}", name);
        }
        assert!(!contains("map"));
    }

    #[test]
    fn test_plus_treats_null_as_zero() {
        assert_eq!(
            eval("_binary_plus", vec![Value::Null, Value::Integer(5)]).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            eval("_binary_plus", vec![Value::Null, Value::Null]).unwrap(),
            Value::Integer(0)
        );
    }

    #[test]
    fn test_plus_numeric_promotion() {
        assert_eq!(
            eval(
                "_binary_plus",
                vec![Value::Integer(1), Value::Double(0.5)]
            )
            .unwrap(),
            Value::Double(1.5)
        );
    }

    #[test]
    fn test_plus_string_and_list() {
        assert_eq!(
            eval(
                "_binary_plus",
                vec![Value::from("ab"), Value::from("cd")]
            )
            .unwrap(),
            Value::from("abcd")
        );
        assert_eq!(
            eval(
                "_binary_plus",
                vec![
                    Value::List(vec![Value::Integer(1)]),
                    Value::List(vec![Value::Integer(2)]),
                ]
            )
            .unwrap(),
            Value::List(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_times() {
        assert_eq!(
            eval(
                "_binary_times",
                vec![Value::Integer(6), Value::Integer(7)]
            )
            .unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            eval("_binary_times", vec![Value::Null, Value::Integer(7)]).unwrap(),
            Value::Integer(0)
        );
    }

    #[test]
    fn test_invalid_arithmetic_operands() {
        let error = eval(
            "_binary_times",
            vec![Value::from("x"), Value::Integer(2)],
        )
        .unwrap_err();
        assert!(matches!(error, EvalError::InvalidOperands { operator: "*", .. }));
    }

    #[test]
    fn test_concat() {
        assert_eq!(
            eval(
                "_binary_concat",
                vec![Value::from("hi "), Value::from("there")]
            )
            .unwrap(),
            Value::from("hi there")
        );
        // String side coerces a scalar other side
        assert_eq!(
            eval(
                "_binary_concat",
                vec![Value::from("n = "), Value::Integer(5)]
            )
            .unwrap(),
            Value::from("n = 5")
        );

        let mut left = ValueMap::new();
        left.insert("a", Value::Integer(1));
        let mut right = ValueMap::new();
        right.insert("b", Value::Integer(2));
        let merged = eval(
            "_binary_concat",
            vec![Value::Object(left), Value::Object(right)],
        )
        .unwrap();
        match merged {
            Value::Object(map) => {
                assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_diff_removes_elements() {
        let result = eval(
            "_binary_diff",
            vec![
                Value::List(vec![
                    Value::Integer(1),
                    Value::Integer(2),
                    Value::Integer(3),
                    Value::Integer(2),
                ]),
                Value::List(vec![Value::Integer(2)]),
            ],
        )
        .unwrap();
        assert_eq!(
            result,
            Value::List(vec![Value::Integer(1), Value::Integer(3)])
        );
    }

    #[test]
    fn test_diff_removes_object_keys() {
        let mut map = ValueMap::new();
        map.insert("a", Value::Integer(1));
        map.insert("b", Value::Integer(2));

        let result = eval(
            "_binary_diff",
            vec![Value::Object(map), Value::List(vec![Value::from("a")])],
        )
        .unwrap();
        match result {
            Value::Object(map) => {
                assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_equality_across_numeric_kinds() {
        assert_eq!(
            eval("_binary_eq", vec![Value::Integer(1), Value::Double(1.0)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            eval("_binary_neq", vec![Value::Integer(1), Value::Null]).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            eval("_binary_gt", vec![Value::Integer(2), Value::Integer(1)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            eval("_binary_lte", vec![Value::Integer(2), Value::Integer(2)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            eval("_binary_lt", vec![Value::from("a"), Value::from("b")]).unwrap(),
            Value::Boolean(true)
        );

        let error =
            eval("_binary_gt", vec![Value::from("a"), Value::Integer(1)]).unwrap_err();
        assert!(matches!(error, EvalError::InvalidOperands { .. }));
    }

    #[test]
    fn test_to_iterable_coercion() {
        assert!(to_iterable(&Value::Null).is_empty());
        assert_eq!(
            to_iterable(&Value::List(vec![Value::Integer(1)])),
            vec![Value::Integer(1)]
        );

        let mut map = ValueMap::new();
        map.insert("a", Value::Integer(1));
        map.insert("b", Value::Integer(2));
        assert_eq!(
            to_iterable(&Value::Object(map)),
            vec![Value::Integer(1), Value::Integer(2)]
        );

        assert_eq!(to_iterable(&Value::Integer(7)), vec![Value::Integer(7)]);
    }

    #[test]
    fn test_to_range() {
        assert_eq!(
            eval("_infix_to", vec![Value::Integer(1), Value::Integer(4)]).unwrap(),
            Value::List(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4),
            ])
        );
        // Descending bounds yield a descending range
        assert_eq!(
            eval("_infix_to", vec![Value::Integer(3), Value::Integer(1)]).unwrap(),
            Value::List(vec![
                Value::Integer(3),
                Value::Integer(2),
                Value::Integer(1),
            ])
        );

        let error =
            eval("_infix_to", vec![Value::from("a"), Value::Integer(3)]).unwrap_err();
        assert!(matches!(error, EvalError::InvalidOperands { operator: "to", .. }));
    }

    #[test]
    fn test_map_requires_callable() {
        let error = eval(
            "_infix_map",
            vec![Value::List(vec![]), Value::Integer(1)],
        )
        .unwrap_err();
        assert_eq!(error, EvalError::NotCallable { kind: "integer" });
    }
}
