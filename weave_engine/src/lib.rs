//! Weave engine: a small data-transformation expression language
//!
//! A script has a header (version directive, optional output format,
//! imports, variable declarations), a `---` separator, and a body
//! expression. Execution maps a payload value to a result value:
//!
//! ```
//! use weave_engine::{execute, Value};
//!
//! let result = execute("%dw 2.0\n---\npayload * 2", Value::Integer(21), None).unwrap();
//! assert_eq!(result, Value::Integer(42));
//! ```

// Internal modules
pub mod config;
pub mod formats;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod runtime;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use runtime::{execute, Environment, EvalError, ExecuteError, Runtime, Value, ValueMap};
pub use syntax::{parse_script, Expression, Header, ParseError, Script};
