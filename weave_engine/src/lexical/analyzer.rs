//! Core lexical analyzer implementation
//!
//! Systematic longest-match tokenization over the closed Weave lexeme set
//! with line/column tracking and integration with the global logging system.

use crate::config::constants::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::logging::codes;
use crate::tokens::{SpannedToken, Token, TokenStream};
use crate::utils::{Position, Span};
use crate::{log_debug, log_error, log_success};

/// Lexical analysis errors with source positions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character '{character}' at line {line}, column {column}")]
    InvalidCharacter {
        character: char,
        line: u32,
        column: u32,
    },

    #[error("Unterminated string literal at line {line}, column {column}")]
    UnterminatedString { line: u32, column: u32 },

    #[error("Unterminated block comment at line {line}, column {column}")]
    UnterminatedBlockComment { line: u32, column: u32 },

    #[error("Identifier too long: {length} characters (max {MAX_IDENTIFIER_LENGTH})")]
    IdentifierTooLong { length: usize },

    #[error("String too large: {size} bytes (max {MAX_STRING_SIZE})")]
    StringTooLarge { size: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize },
}

impl LexError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexError::InvalidCharacter { .. } => codes::lexical::INVALID_CHARACTER,
            LexError::UnterminatedString { .. } => codes::lexical::UNTERMINATED_STRING,
            LexError::UnterminatedBlockComment { .. } => {
                codes::lexical::UNTERMINATED_BLOCK_COMMENT
            }
            LexError::IdentifierTooLong { .. } => codes::lexical::IDENTIFIER_TOO_LONG,
            LexError::StringTooLarge { .. } => codes::lexical::STRING_TOO_LARGE,
            LexError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }

    /// Line and column where the failure was detected, if tracked
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            LexError::InvalidCharacter { line, column, .. }
            | LexError::UnterminatedString { line, column }
            | LexError::UnterminatedBlockComment { line, column } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// Essential lexical analysis metrics
#[derive(Debug, Default, Clone)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub identifier_tokens: usize,
    pub operator_tokens: usize,
    pub string_tokens: usize,
    pub comment_count: usize,
    pub max_string_length: usize,
}

impl LexicalMetrics {
    fn record_token(&mut self, token: &Token) {
        self.total_tokens += 1;
        match token {
            Token::Identifier(_) => self.identifier_tokens += 1,
            Token::String(s) => {
                self.string_tokens += 1;
                self.max_string_length = self.max_string_length.max(s.len());
            }
            Token::Number(_) | Token::Boolean(_) | Token::Null | Token::Eof => {}
            _ => self.operator_tokens += 1,
        }
    }
}

/// Multi-character operators, longest-match before their single-character
/// relatives. Order matters: `--` before `-`-prefixed lookalikes, `?.`
/// before `.`, and so on.
const MULTI_CHAR_OPERATORS: &[(&str, Token)] = &[
    ("--", Token::Diff),
    ("?.", Token::SafeDot),
    ("++", Token::Concat),
    (">=", Token::Gte),
    ("<=", Token::Lte),
    ("==", Token::Eq),
    ("!=", Token::Neq),
    ("->", Token::Arrow),
];

fn single_char_operator(ch: char) -> Option<Token> {
    match ch {
        '>' => Some(Token::Gt),
        '<' => Some(Token::Lt),
        '{' => Some(Token::LBrace),
        '}' => Some(Token::RBrace),
        '[' => Some(Token::LBracket),
        ']' => Some(Token::RBracket),
        '(' => Some(Token::LParen),
        ')' => Some(Token::RParen),
        ':' => Some(Token::Colon),
        ',' => Some(Token::Comma),
        '.' => Some(Token::Dot),
        '+' => Some(Token::Plus),
        '*' => Some(Token::Star),
        '=' => Some(Token::Equal),
        _ => None,
    }
}

/// Core lexical analyzer with metrics and runtime preferences
pub struct LexicalAnalyzer {
    metrics: LexicalMetrics,
    preferences: LexicalPreferences,
}

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self {
            metrics: LexicalMetrics::default(),
            preferences: LexicalPreferences::default(),
        }
    }

    pub fn with_preferences(preferences: LexicalPreferences) -> Self {
        Self {
            metrics: LexicalMetrics::default(),
            preferences,
        }
    }

    /// Get metrics from the most recent tokenization
    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    /// Tokenize source text into a stream terminated by an EOF token
    pub fn tokenize(&mut self, source: &str) -> Result<TokenStream, LexError> {
        self.metrics = LexicalMetrics::default();

        log_debug!("Starting lexical analysis", "source_bytes" => source.len());

        let mut tokens: Vec<SpannedToken> = Vec::new();
        let mut pos = Position::start();

        'scan: while pos.offset < source.len() {
            let rest = &source[pos.offset..];
            let ch = rest.chars().next().expect("offset within source");

            // Whitespace between tokens is discarded
            if ch.is_whitespace() {
                pos = pos.advance(ch);
                continue;
            }

            // Line comments run to the next newline (exclusive)
            if rest.starts_with("//") {
                self.metrics.comment_count += 1;
                for comment_ch in rest.chars() {
                    if comment_ch == '\n' {
                        continue 'scan;
                    }
                    pos = pos.advance(comment_ch);
                }
                continue;
            }

            // Block comments end at the first */
            if rest.starts_with("/*") {
                self.metrics.comment_count += 1;
                match rest.find("*/") {
                    Some(end) => {
                        pos = pos.advance_str(&rest[..end + 2]);
                        continue;
                    }
                    None => {
                        let error = LexError::UnterminatedBlockComment {
                            line: pos.line,
                            column: pos.column,
                        };
                        self.log_failure(&error, pos);
                        return Err(error);
                    }
                }
            }

            if tokens.len() >= MAX_TOKEN_COUNT {
                let error = LexError::TooManyTokens {
                    count: tokens.len(),
                };
                self.log_failure(&error, pos);
                return Err(error);
            }

            let start = pos;
            let token = if ch.is_ascii_digit() {
                let (token, end) = self.scan_number(rest, pos);
                pos = end;
                token
            } else if ch == '"' || ch == '\'' {
                match self.scan_string(rest, pos) {
                    Ok((token, end)) => {
                        pos = end;
                        token
                    }
                    Err(error) => {
                        self.log_failure(&error, pos);
                        return Err(error);
                    }
                }
            } else if let Some((lexeme, token)) = MULTI_CHAR_OPERATORS
                .iter()
                .find(|(lexeme, _)| rest.starts_with(lexeme))
            {
                pos = pos.advance_str(lexeme);
                token.clone()
            } else if let Some(token) = single_char_operator(ch) {
                pos = pos.advance(ch);
                token
            } else if ch.is_ascii_alphabetic() || ch == '_' {
                match self.scan_identifier(rest, pos) {
                    Ok((token, end)) => {
                        pos = end;
                        token
                    }
                    Err(error) => {
                        self.log_failure(&error, pos);
                        return Err(error);
                    }
                }
            } else {
                let error = LexError::InvalidCharacter {
                    character: ch,
                    line: pos.line,
                    column: pos.column,
                };
                self.log_failure(&error, pos);
                return Err(error);
            };

            self.metrics.record_token(&token);
            tokens.push(SpannedToken::new(token, Span::new(start, pos)));
        }

        tokens.push(SpannedToken::new(Token::Eof, Span::new(pos, pos)));

        log_success!(codes::success::TOKENIZATION_COMPLETE,
            "Lexical analysis completed",
            "token_count" => tokens.len(),
            "identifiers" => self.metrics.identifier_tokens,
            "operators" => self.metrics.operator_tokens,
            "comments" => self.metrics.comment_count
        );

        Ok(TokenStream::new(tokens))
    }

    // ========================================================================
    // Private scanning methods
    // ========================================================================

    /// Digits, optionally followed by a dot and more digits. A trailing dot
    /// with no digit after it is left for the postfix chain.
    fn scan_number(&self, rest: &str, start: Position) -> (Token, Position) {
        let bytes = rest.as_bytes();
        let mut len = 0;
        while len < bytes.len() && bytes[len].is_ascii_digit() {
            len += 1;
        }
        if len < bytes.len()
            && bytes[len] == b'.'
            && len + 1 < bytes.len()
            && bytes[len + 1].is_ascii_digit()
        {
            len += 1;
            while len < bytes.len() && bytes[len].is_ascii_digit() {
                len += 1;
            }
        }

        let text = &rest[..len];
        let value: f64 = text.parse().expect("scanned digits parse as f64");
        (Token::Number(value), start.advance_str(text))
    }

    /// Quoted string with escape processing. The quote character delimits
    /// and is not part of the value; either quote kind may wrap the other.
    fn scan_string(&mut self, rest: &str, start: Position) -> Result<(Token, Position), LexError> {
        let mut chars = rest.chars();
        let quote = chars.next().expect("caller checked the opening quote");
        let mut pos = start.advance(quote);
        let mut content = String::new();

        while let Some(ch) = chars.next() {
            pos = pos.advance(ch);
            if ch == quote {
                if content.len() > MAX_STRING_SIZE {
                    return Err(LexError::StringTooLarge {
                        size: content.len(),
                    });
                }
                if self.preferences.log_string_statistics {
                    log_debug!("String literal processed", "length" => content.len());
                }
                return Ok((Token::String(content), pos));
            }
            if ch == '\\' {
                match chars.next() {
                    Some(escaped) => {
                        pos = pos.advance(escaped);
                        push_escape(&mut content, escaped, &mut chars, &mut pos);
                    }
                    None => break,
                }
            } else {
                content.push(ch);
            }

            if content.len() > MAX_STRING_SIZE {
                return Err(LexError::StringTooLarge {
                    size: content.len(),
                });
            }
        }

        Err(LexError::UnterminatedString {
            line: start.line,
            column: start.column,
        })
    }

    fn scan_identifier(
        &self,
        rest: &str,
        start: Position,
    ) -> Result<(Token, Position), LexError> {
        let end = rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(rest.len());
        let word = &rest[..end];

        if word.len() > MAX_IDENTIFIER_LENGTH {
            return Err(LexError::IdentifierTooLong { length: word.len() });
        }

        Ok((Token::from_word(word), start.advance_str(word)))
    }

    fn log_failure(&self, error: &LexError, pos: Position) {
        let message = if self.preferences.include_position_in_errors {
            format!(
                "Lexical analysis failed at line {}, column {}",
                pos.line, pos.column
            )
        } else {
            "Lexical analysis failed".to_string()
        };
        log_error!(error.error_code(), &message,
            span = Span::new(pos, pos),
            "detail" => error
        );
    }
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one escape sequence into the string buffer. Unknown escapes keep
/// the backslash and the character.
fn push_escape(
    content: &mut String,
    escaped: char,
    chars: &mut std::str::Chars<'_>,
    pos: &mut Position,
) {
    match escaped {
        'n' => content.push('\n'),
        't' => content.push('\t'),
        'r' => content.push('\r'),
        'b' => content.push('\u{0008}'),
        'f' => content.push('\u{000C}'),
        '0' => content.push('\0'),
        '\\' => content.push('\\'),
        '\'' => content.push('\''),
        '"' => content.push('"'),
        'u' => {
            let mut digits = String::new();
            for _ in 0..4 {
                match chars.clone().next() {
                    Some(d) if d.is_ascii_hexdigit() => {
                        digits.push(d);
                        chars.next();
                        *pos = pos.advance(d);
                    }
                    _ => break,
                }
            }
            match u32::from_str_radix(&digits, 16)
                .ok()
                .filter(|_| digits.len() == 4)
                .and_then(char::from_u32)
            {
                Some(decoded) => content.push(decoded),
                None => {
                    content.push('\\');
                    content.push('u');
                    content.push_str(&digits);
                }
            }
        }
        other => {
            content.push('\\');
            content.push(other);
        }
    }
}
