//! Span-accurate token stream for the Weave parser
//!
//! The lexer already discards whitespace and comments, so the stream is a
//! plain cursor over significant tokens. Checkpoints expose the position
//! counter for the parser's single rollback point (lambda detection).

use crate::tokens::token::Token;
use crate::utils::{Position, Span, Spanned};

/// A token with span information
pub type SpannedToken = Spanned<Token>;

/// Cursor over a finite token sequence terminated by an EOF token
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<SpannedToken>,
    position: usize,
}

impl TokenStream {
    /// Create a new token stream
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    // === CORE NAVIGATION ===

    /// Get the current token with its span
    pub fn current(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.position)
    }

    /// Get the current token value (without span)
    pub fn current_token(&self) -> Option<&Token> {
        self.current().map(|spanned| &spanned.value)
    }

    /// Get the span of the current token
    pub fn current_span(&self) -> Option<Span> {
        self.current().map(|spanned| spanned.span)
    }

    /// Peek ahead by n positions without advancing
    pub fn peek_ahead(&self, n: usize) -> Option<&SpannedToken> {
        self.tokens.get(self.position + n)
    }

    /// Advance to the next token. The cursor never moves past EOF.
    pub fn advance(&mut self) -> Option<&SpannedToken> {
        if let Some(current) = self.tokens.get(self.position) {
            if !matches!(current.value, Token::Eof) {
                self.position += 1;
            }
        }
        self.current()
    }

    /// Check if the current token is EOF (or the stream is exhausted)
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_token(), None | Some(Token::Eof))
    }

    /// Get the number of tokens (including EOF)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the stream has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Get current position for diagnostics
    pub fn position(&self) -> usize {
        self.position
    }

    /// Position of the last known token, for end-of-input diagnostics
    pub fn last_position(&self) -> Position {
        self.tokens
            .last()
            .map(|spanned| spanned.span.start)
            .unwrap_or_else(Position::start)
    }

    // === PARSER INTEGRATION ===

    /// Check if the current token equals the expected one (by discriminant)
    pub fn check_token(&self, expected: &Token) -> bool {
        self.current_token()
            .map(|token| std::mem::discriminant(token) == std::mem::discriminant(expected))
            .unwrap_or(false)
    }

    /// Advance if the current token matches expected
    pub fn advance_if_matches(&mut self, expected: &Token) -> bool {
        if self.check_token(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches the predicate
    pub fn consume_if<F>(&mut self, predicate: F) -> Option<SpannedToken>
    where
        F: FnOnce(&Token) -> bool,
    {
        if let Some(token) = self.current_token() {
            if predicate(token) {
                let result = self.current().cloned();
                self.advance();
                return result;
            }
        }
        None
    }

    // === BACKTRACKING SUPPORT ===

    /// Save current position as a checkpoint
    pub fn save_position(&self) -> usize {
        self.position
    }

    /// Restore position from a checkpoint
    pub fn restore_position(&mut self, saved_position: usize) {
        self.position = saved_position.min(self.tokens.len());
    }

    // === DIAGNOSTICS ===

    /// One-line diagnostic of the cursor state
    pub fn diagnostic(&self) -> String {
        let current_info = if let Some(current) = self.current() {
            format!("'{}' at {}", current.value.as_source_string(), current.span)
        } else {
            "<exhausted>".to_string()
        };

        format!(
            "TokenStream(pos: {}/{}, current: {})",
            self.position,
            self.tokens.len(),
            current_info
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(tokens: Vec<Token>) -> TokenStream {
        let mut position = Position::start();
        let mut spanned = Vec::new();
        for token in tokens {
            let text = token.as_source_string();
            let end = position.advance_str(&text);
            spanned.push(SpannedToken::new(token, Span::new(position, end)));
            position = end.advance(' ');
        }
        spanned.push(SpannedToken::new(
            Token::Eof,
            Span::new(position, position),
        ));
        TokenStream::new(spanned)
    }

    #[test]
    fn test_navigation() {
        let mut stream = stream_of(vec![Token::Number(1.0), Token::Plus, Token::Number(2.0)]);

        assert_eq!(stream.current_token(), Some(&Token::Number(1.0)));
        stream.advance();
        assert_eq!(stream.current_token(), Some(&Token::Plus));
        assert_eq!(
            stream.peek_ahead(1).map(|s| &s.value),
            Some(&Token::Number(2.0))
        );
    }

    #[test]
    fn test_advance_stops_at_eof() {
        let mut stream = stream_of(vec![Token::Null]);
        stream.advance();
        assert!(stream.is_at_end());

        stream.advance();
        stream.advance();
        assert_eq!(stream.current_token(), Some(&Token::Eof));
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut stream = stream_of(vec![Token::LParen, Token::Identifier("a".into())]);

        let checkpoint = stream.save_position();
        stream.advance();
        stream.advance();
        assert!(stream.is_at_end());

        stream.restore_position(checkpoint);
        assert_eq!(stream.current_token(), Some(&Token::LParen));
    }

    #[test]
    fn test_check_by_discriminant() {
        let stream = stream_of(vec![Token::Identifier("payload".into())]);
        assert!(stream.check_token(&Token::Identifier(String::new())));
        assert!(!stream.check_token(&Token::Number(0.0)));
    }

    #[test]
    fn test_diagnostic_names_current_token() {
        let stream = stream_of(vec![Token::Default]);
        let diagnostic = stream.diagnostic();
        assert!(diagnostic.contains("pos: 0/2"));
        assert!(diagnostic.contains("'default'"));
    }

    #[test]
    fn test_consume_if() {
        let mut stream = stream_of(vec![Token::Comma, Token::Colon]);

        let consumed = stream.consume_if(|t| matches!(t, Token::Comma));
        assert!(consumed.is_some());
        assert_eq!(stream.current_token(), Some(&Token::Colon));

        let not_consumed = stream.consume_if(|t| matches!(t, Token::Comma));
        assert!(not_consumed.is_none());
    }
}
