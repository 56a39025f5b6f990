//! Script execution runtime
//!
//! `execute` is the single public entry point of the core: parse the script,
//! evaluate header variables sequentially, then evaluate the body. The
//! format registry is consulted only at the outermost boundary
//! (`execute_rendered`); expressions never touch I/O.

pub mod environment;
pub mod error;
pub mod evaluator;
pub mod intrinsics;
pub mod value;

pub use environment::Environment;
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use value::{Callable, LambdaValue, Value, ValueMap};

use crate::config::runtime::EvaluatorPreferences;
use crate::formats::{self, FormatError, FormatOptions};
use crate::logging::codes;
use crate::syntax::{self, ParseError, Script};
use crate::utils::SourceMap;
use crate::{log_error, log_success};
use std::rc::Rc;

/// Any failure of a complete execution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Script runtime with evaluator preferences
pub struct Runtime {
    preferences: EvaluatorPreferences,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            preferences: EvaluatorPreferences::default(),
        }
    }

    pub fn with_preferences(preferences: EvaluatorPreferences) -> Self {
        Self { preferences }
    }

    /// Execute a script source against a payload and optional caller
    /// variables, returning the resulting value.
    pub fn execute(
        &self,
        script_source: &str,
        payload: Value,
        vars: Option<ValueMap>,
    ) -> Result<Value, ExecuteError> {
        let script = self.parse(script_source)?;
        let result = self.execute_script(&script, payload, vars)?;
        Ok(result)
    }

    /// Execute a parsed script
    pub fn execute_script(
        &self,
        script: &Script,
        payload: Value,
        vars: Option<ValueMap>,
    ) -> Result<Value, EvalError> {
        let header = Rc::new(script.header.clone());
        let mut env = Environment::new(payload, vars.unwrap_or_default(), Some(header));
        let mut evaluator = Evaluator::new();

        // Header declarations evaluate sequentially; each one observes the
        // bindings of the preceding declarations.
        for declaration in &script.header.variables {
            let value = evaluator.evaluate(&declaration.expression, &env).map_err(
                |error| {
                    log_error!(error.error_code(), &error.to_string(),
                        "variable" => declaration.name
                    );
                    error
                },
            )?;
            env.bind(declaration.name.clone(), value);
        }

        let result = evaluator.evaluate(&script.body, &env).map_err(|error| {
            log_error!(error.error_code(), &error.to_string());
            error
        })?;

        if self.preferences.log_execution_events {
            log_success!(codes::success::EXECUTION_COMPLETE, "Script executed",
                "version" => script.header.version,
                "result_kind" => result.kind_name()
            );
        }
        Ok(result)
    }

    /// Full boundary flow: parse the payload text with an input format, run
    /// the script, and render the result with the header's output directive
    /// (falling back to the configured default format).
    pub fn execute_rendered(
        &self,
        script_source: &str,
        input: &str,
        input_format: &str,
        vars: Option<ValueMap>,
        options: &FormatOptions,
    ) -> Result<String, ExecuteError> {
        let script = self.parse(script_source)?;
        let payload = formats::read(input, input_format, options)?;
        let result = self.execute_script(&script, payload, vars)?;

        let output_format = script
            .header
            .output
            .as_deref()
            .unwrap_or(&self.preferences.default_output_format);
        let rendered = formats::write(&result, output_format, options)?;
        Ok(rendered)
    }

    fn parse(&self, script_source: &str) -> Result<Script, ParseError> {
        syntax::parse_script(script_source).map_err(|error| {
            match error.span() {
                Some(span) => {
                    let source_map = SourceMap::new(script_source.to_string());
                    log_error!(error.error_code(),
                        &source_map.format_error(&span, &error.to_string()),
                        span = span
                    );
                }
                None => {
                    log_error!(error.error_code(), &error.to_string());
                }
            }
            error
        })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute a script with the default runtime
pub fn execute(
    script_source: &str,
    payload: Value,
    vars: Option<ValueMap>,
) -> Result<Value, ExecuteError> {
    Runtime::new().execute(script_source, payload, vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn run(script: &str, payload: Value) -> Value {
        execute(script, payload, None).unwrap()
    }

    fn object(entries: &[(&str, Value)]) -> Value {
        let mut map = ValueMap::new();
        for (key, value) in entries {
            map.insert(*key, value.clone());
        }
        Value::Object(map)
    }

    #[test]
    fn test_map_over_payload_items() {
        let payload = object(&[(
            "items",
            Value::List(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
            ]),
        )]);

        assert_eq!(
            run("%dw 2.0\n---\npayload.items map (i) -> i * 2", payload),
            Value::List(vec![
                Value::Integer(2),
                Value::Integer(4),
                Value::Integer(6),
            ])
        );
    }

    #[test]
    fn test_filter_nulls_from_payload() {
        let payload = Value::List(vec![Value::Integer(1), Value::Null, Value::Integer(2)]);
        assert_eq!(
            run("%dw 2.0\n---\npayload filter (kv) -> kv != null", payload),
            Value::List(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_if_over_negative_payload() {
        assert_eq!(
            run(
                "%dw 2.0\n---\nif (payload > 0) \"pos\" else \"neg\"",
                Value::Integer(-3)
            ),
            Value::from("neg")
        );
    }

    #[test]
    fn test_header_variable_in_body() {
        let script = "%dw 2.0\nvar greet = \"hi\"\n---\ngreet ++ \" \" ++ payload.name";
        let payload = object(&[("name", Value::from("ada"))]);
        assert_eq!(run(script, payload), Value::from("hi ada"));
    }

    #[test]
    fn test_header_variables_evaluate_sequentially() {
        let script = "%dw 2.0\nvar base = 10\nvar doubled = base * 2\n---\ndoubled";
        assert_eq!(run(script, Value::Null), Value::Integer(20));
    }

    #[test]
    fn test_caller_vars_are_visible() {
        let mut vars = ValueMap::new();
        vars.insert("factor", Value::Integer(3));
        assert_eq!(
            execute("%dw 2.0\n---\npayload * factor", Value::Integer(7), Some(vars)).unwrap(),
            Value::Integer(21)
        );
    }

    #[test]
    fn test_header_var_shadows_caller_var() {
        let mut vars = ValueMap::new();
        vars.insert("x", Value::Integer(1));
        assert_eq!(
            execute("%dw 2.0\nvar x = 2\n---\nx", Value::Null, Some(vars)).unwrap(),
            Value::Integer(2)
        );
    }

    #[test]
    fn test_vars_object_reflects_bindings() {
        let script = "%dw 2.0\nvar a = 1\nvar b = 2\n---\nvars.b";
        assert_eq!(run(script, Value::Null), Value::Integer(2));
    }

    #[test]
    fn test_closure_snapshot_across_header_declarations() {
        // f captures x at construction time; the later shadowing of x is
        // invisible to the closure.
        let script = "%dw 2.0\nvar x = 1\nvar f = () -> x\nvar x = 99\n---\nf()";
        assert_eq!(run(script, Value::Null), Value::Integer(1));
    }

    #[test]
    fn test_match_scenarios() {
        let script = "%dw 2.0\n---\npayload match { case var n when n > 0 -> \"pos\", case 0 -> \"zero\", else -> \"neg\" }";
        assert_eq!(run(script, Value::Integer(-1)), Value::from("neg"));
        assert_eq!(run(script, Value::Integer(0)), Value::from("zero"));
        assert_eq!(run(script, Value::Integer(5)), Value::from("pos"));
    }

    #[test]
    fn test_range_map_scenario() {
        assert_eq!(
            run("%dw 2.0\n---\n1 to 3 map (n) -> n * n", Value::Null),
            Value::List(vec![
                Value::Integer(1),
                Value::Integer(4),
                Value::Integer(9),
            ])
        );
    }

    #[test]
    fn test_parse_error_propagates() {
        assert_matches!(
            execute("payload", Value::Null, None),
            Err(ExecuteError::Parse(ParseError::MissingSeparator))
        );
    }

    #[test]
    fn test_eval_error_propagates() {
        assert_matches!(
            execute("%dw 2.0\n---\nnope", Value::Null, None),
            Err(ExecuteError::Eval(EvalError::UnknownIdentifier { .. }))
        );
    }

    #[test]
    fn test_execute_rendered_json_to_json() {
        let runtime = Runtime::new();
        let script = "%dw 2.0\noutput application/json\n---\n{doubled: payload.n * 2}";
        let rendered = runtime
            .execute_rendered(script, r#"{"n": 21}"#, "json", None, &FormatOptions::new())
            .unwrap();
        assert_eq!(rendered, r#"{"doubled":42}"#);
    }

    #[test]
    fn test_execute_rendered_csv_input() {
        let runtime = Runtime::new();
        let script = "%dw 2.0\noutput json\n---\npayload map (row) -> row.name";
        let rendered = runtime
            .execute_rendered(
                script,
                "name,age\nada,36\ngrace,45\n",
                "csv",
                None,
                &FormatOptions::new(),
            )
            .unwrap();
        assert_eq!(rendered, r#"["ada","grace"]"#);
    }

    #[test]
    fn test_execute_rendered_defaults_to_json_output() {
        let runtime = Runtime::new();
        let script = "%dw 2.0\n---\n[1, 2]";
        let rendered = runtime
            .execute_rendered(script, "null", "json", None, &FormatOptions::new())
            .unwrap();
        assert_eq!(rendered, "[1,2]");
    }

    #[test]
    fn test_execute_rendered_unknown_format() {
        let runtime = Runtime::new();
        let error = runtime
            .execute_rendered(
                "%dw 2.0\n---\npayload",
                "1",
                "yaml",
                None,
                &FormatOptions::new(),
            )
            .unwrap_err();
        assert_matches!(
            error,
            ExecuteError::Format(FormatError::UnsupportedFormat { .. })
        );
    }

    #[test]
    fn test_object_field_order_preserved_end_to_end() {
        let result = run("%dw 2.0\n---\n{a: 1, b: 2}", Value::Null);
        match result {
            Value::Object(map) => {
                assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_default_output_preference_is_respected() {
        let preferences = EvaluatorPreferences {
            log_execution_events: false,
            default_output_format: "raw".to_string(),
        };
        let runtime = Runtime::with_preferences(preferences);
        let rendered = runtime
            .execute_rendered(
                "%dw 2.0\n---\npayload ++ \"!\"",
                "\"hello\"",
                "json",
                None,
                &FormatOptions::new(),
            )
            .unwrap();
        assert_eq!(rendered, "hello!");
    }
}
