//! AST node definitions for the Weave expression language
//!
//! These nodes represent the parsed structure of a script and are immutable
//! for the duration of an execution: the evaluator only reads them. Infix
//! and comparison operators do not get dedicated nodes; the parser lowers
//! them into [`Expression::Call`] targeting reserved intrinsic names.

use serde::{Deserialize, Serialize};

/// A lambda parameter with an optional default expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expression>,
}

/// Subject-matching element of a match case: an optional binding, an
/// optional equality matcher, and an optional guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPattern {
    pub binding: Option<String>,
    pub matcher: Option<Expression>,
    pub guard: Option<Expression>,
}

/// One case of a match expression. A `None` pattern is the else branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCase {
    pub pattern: Option<MatchPattern>,
    pub expression: Expression,
}

/// Closed sum of expression variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Null,
    Boolean(bool),
    /// Numeric literal; integral values are coerced to integers at
    /// evaluation time
    Number(f64),
    String(String),
    Identifier(String),
    /// Object constructor; field order is declaration order and significant
    Object(Vec<(String, Expression)>),
    List(Vec<Expression>),
    Property {
        value: Box<Expression>,
        attribute: String,
        null_safe: bool,
    },
    Index {
        value: Box<Expression>,
        index: Box<Expression>,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// Right side is evaluated only when the left side is null
    Default {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        when_true: Box<Expression>,
        when_false: Box<Expression>,
    },
    Lambda {
        parameters: Vec<Parameter>,
        body: Box<Expression>,
    },
    Match {
        value: Box<Expression>,
        cases: Vec<MatchCase>,
    },
}

impl Expression {
    /// Build a call to a reserved intrinsic, used when lowering operators
    pub fn intrinsic_call(name: &str, arguments: Vec<Expression>) -> Self {
        Self::Call {
            function: Box::new(Self::Identifier(name.to_string())),
            arguments,
        }
    }
}

/// Header `var` declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclaration {
    pub name: String,
    pub expression: Expression,
}

/// Header `import` directive, recorded verbatim and ignored by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDirective {
    pub raw: String,
}

/// Script header: version directive, optional output format, imports, and
/// variable declarations in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub version: String,
    pub output: Option<String>,
    pub imports: Vec<ImportDirective>,
    pub variables: Vec<VarDeclaration>,
}

/// A complete script: header plus body expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub header: Header,
    pub body: Expression,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_call_lowering() {
        let call = Expression::intrinsic_call(
            "_binary_plus",
            vec![Expression::Number(1.0), Expression::Number(2.0)],
        );

        match call {
            Expression::Call {
                function,
                arguments,
            } => {
                assert_eq!(*function, Expression::Identifier("_binary_plus".into()));
                assert_eq!(arguments.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_ast_serialization() {
        let expr = Expression::Object(vec![
            ("a".to_string(), Expression::Number(1.0)),
            ("b".to_string(), Expression::Null),
        ]);

        let json = serde_json::to_string(&expr).unwrap();
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
