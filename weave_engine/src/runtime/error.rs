//! Evaluation error types
//!
//! Variants partition into the two evaluation-time classes: name errors
//! (unknown identifiers) and type errors (everything else). Null-safe
//! property access swallows attribute errors by design; nothing else is
//! caught inside an execution.

use crate::logging::{codes, Code};

pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while evaluating an expression
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Unknown identifier '{name}'")]
    UnknownIdentifier { name: String },

    #[error("Value of kind {kind} is not callable")]
    NotCallable { kind: &'static str },

    #[error("Cannot access attribute '{attribute}' on {kind}")]
    AttributeAccess {
        attribute: String,
        kind: &'static str,
    },

    #[error("Too many arguments supplied to lambda expression: {received} for {expected} parameters")]
    TooManyArguments { expected: usize, received: usize },

    #[error("Missing argument '{name}' for lambda")]
    MissingArgument { name: String },

    #[error("Operator '{operator}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("Maximum call depth exceeded ({depth})")]
    CallDepthExceeded { depth: usize },
}

impl EvalError {
    /// Get error code for the logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::UnknownIdentifier { .. } => codes::runtime::UNKNOWN_IDENTIFIER,
            Self::NotCallable { .. } => codes::runtime::NOT_CALLABLE,
            Self::AttributeAccess { .. } => codes::runtime::ATTRIBUTE_ACCESS,
            Self::TooManyArguments { .. } => codes::runtime::TOO_MANY_ARGUMENTS,
            Self::MissingArgument { .. } => codes::runtime::MISSING_ARGUMENT,
            Self::InvalidOperands { .. } => codes::runtime::INVALID_OPERANDS,
            Self::CallDepthExceeded { .. } => codes::runtime::CALL_DEPTH_EXCEEDED,
        }
    }

    /// True for unknown-identifier failures
    pub fn is_name_error(&self) -> bool {
        matches!(self, Self::UnknownIdentifier { .. })
    }

    /// True for type-level failures (everything except name errors)
    pub fn is_type_error(&self) -> bool {
        !self.is_name_error()
    }

    /// True for attribute-access failures, the only class swallowed by
    /// null-safe access.
    pub fn is_attribute_error(&self) -> bool {
        matches!(self, Self::AttributeAccess { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let name_error = EvalError::UnknownIdentifier {
            name: "x".to_string(),
        };
        assert!(name_error.is_name_error());
        assert!(!name_error.is_type_error());

        let type_error = EvalError::NotCallable { kind: "integer" };
        assert!(type_error.is_type_error());
        assert!(!type_error.is_name_error());

        let attribute_error = EvalError::AttributeAccess {
            attribute: "x".to_string(),
            kind: "integer",
        };
        assert!(attribute_error.is_attribute_error());
        assert!(attribute_error.is_type_error());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EvalError::UnknownIdentifier { name: "x".into() }
                .error_code()
                .as_str(),
            "E060"
        );
        assert_eq!(
            EvalError::TooManyArguments {
                expected: 2,
                received: 3
            }
            .error_code()
            .as_str(),
            "E063"
        );
    }

    #[test]
    fn test_display_messages() {
        let error = EvalError::UnknownIdentifier {
            name: "paylod".into(),
        };
        assert_eq!(error.to_string(), "Unknown identifier 'paylod'");

        let error = EvalError::AttributeAccess {
            attribute: "name".into(),
            kind: "integer",
        };
        assert_eq!(
            error.to_string(),
            "Cannot access attribute 'name' on integer"
        );
    }
}
