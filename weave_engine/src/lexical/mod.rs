//! Lexical analysis for the Weave expression language

pub mod analyzer;

pub use analyzer::{LexError, LexicalAnalyzer, LexicalMetrics};

use crate::tokens::TokenStream;

/// Tokenize source text with default preferences
pub fn tokenize(source: &str) -> Result<TokenStream, LexError> {
    LexicalAnalyzer::new().tokenize(source)
}
