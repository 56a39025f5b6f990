//! Error types for header and expression parsing
//!
//! Every expected-token mismatch carries the span of the offending token;
//! end-of-input failures carry the last known position.

use crate::lexical::LexError;
use crate::logging::{codes, Code};
use crate::utils::{Position, Span};

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse errors with source positions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Expected {expected} but found '{found}' at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unexpected end of input: expected {expected} at {position}")]
    UnexpectedEndOfInput {
        expected: String,
        position: Position,
    },

    #[error("Unexpected tokens after expression at {span}: '{found}'")]
    TrailingTokens { found: String, span: Span },

    #[error("Expected else branch in if expression at {span}")]
    MissingElseBranch { span: Span },

    #[error("Match expression must contain at least one case at {span}")]
    EmptyMatch { span: Span },

    #[error("Script must contain body separator '---'")]
    MissingSeparator,

    #[error("Missing %dw directive")]
    MissingVersionDirective,

    #[error("Unsupported header directive '{content}' at header line {line}")]
    InvalidDirective { line: usize, content: String },

    #[error("Invalid var declaration ({reason}) at header line {line}")]
    InvalidVarDeclaration { line: usize, reason: String },

    #[error("Maximum parser recursion depth exceeded at {span}")]
    MaxRecursionDepth { span: Span },

    #[error(transparent)]
    Lexical(#[from] LexError),
}

impl ParseError {
    /// Create unexpected token error
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        }
    }

    /// Create unexpected end of input error
    pub fn unexpected_end_of_input(expected: &str, position: Position) -> Self {
        Self::UnexpectedEndOfInput {
            expected: expected.to_string(),
            position,
        }
    }

    /// Create invalid directive error
    pub fn invalid_directive(line: usize, content: &str) -> Self {
        Self::InvalidDirective {
            line,
            content: content.to_string(),
        }
    }

    /// Create invalid var declaration error
    pub fn invalid_var_declaration(line: usize, reason: &str) -> Self {
        Self::InvalidVarDeclaration {
            line,
            reason: reason.to_string(),
        }
    }

    /// Get error code for the logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::UnexpectedEndOfInput { .. } => codes::syntax::UNEXPECTED_END_OF_INPUT,
            Self::TrailingTokens { .. } => codes::syntax::TRAILING_TOKENS,
            Self::MissingElseBranch { .. } => codes::syntax::MISSING_ELSE_BRANCH,
            Self::EmptyMatch { .. } => codes::syntax::EMPTY_MATCH,
            Self::MissingSeparator => codes::syntax::MISSING_SEPARATOR,
            Self::MissingVersionDirective => codes::syntax::MISSING_VERSION_DIRECTIVE,
            Self::InvalidDirective { .. } => codes::syntax::INVALID_DIRECTIVE,
            Self::InvalidVarDeclaration { .. } => codes::syntax::INVALID_VAR_DECLARATION,
            Self::MaxRecursionDepth { .. } => codes::syntax::MAX_RECURSION_DEPTH,
            Self::Lexical(error) => error.error_code(),
        }
    }

    /// Get span if available
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::TrailingTokens { span, .. }
            | Self::MissingElseBranch { span }
            | Self::EmptyMatch { span }
            | Self::MaxRecursionDepth { span } => Some(*span),
            _ => None,
        }
    }
}
