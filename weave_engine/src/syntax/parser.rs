//! Precedence-climbing expression parser
//!
//! From lowest to highest precedence: if-expression, default-coalesce,
//! comparison, additive, multiplicative, postfix chain, primary. Binary and
//! comparison operators are lowered into calls to reserved intrinsic names;
//! identifiers in postfix position act as infix operators unless they belong
//! to the reserved stop set.
//!
//! The only backtracking point is the lambda-vs-parenthesised-expression
//! decision, which rolls back a single token-stream checkpoint.

use crate::config::constants::compile_time::syntax::MAX_PARSE_DEPTH;
use crate::syntax::ast::{Expression, MatchCase, MatchPattern, Parameter};
use crate::syntax::error::{ParseError, ParseResult};
use crate::tokens::{Token, TokenStream};
use crate::utils::Span;

/// Identifiers that stop the postfix chain instead of acting as infix
/// operators.
const RESERVED_INFIX_STOP: &[&str] = &["else", "when", "default", "match", "case", "var"];

/// Higher-order infix operators lowered to reserved intrinsic names. Any
/// other infix identifier resolves to a callable of the same name.
const INFIX_SPECIAL: &[(&str, &str)] = &[
    ("map", "_infix_map"),
    ("reduce", "_infix_reduce"),
    ("filter", "_infix_filter"),
    ("flatMap", "_infix_flatMap"),
    ("distinctBy", "_infix_distinctBy"),
    ("to", "_infix_to"),
];

fn infix_target(operator: &str) -> &str {
    INFIX_SPECIAL
        .iter()
        .find(|(name, _)| *name == operator)
        .map(|(_, target)| *target)
        .unwrap_or(operator)
}

static EOF_TOKEN: Token = Token::Eof;

/// Expression parser over a token stream
pub struct ExpressionParser {
    tokens: TokenStream,
    depth: usize,
}

impl ExpressionParser {
    pub fn new(tokens: TokenStream) -> Self {
        crate::log_debug!("Creating expression parser", "tokens" => tokens.len());
        Self { tokens, depth: 0 }
    }

    // === TOKEN ACCESS ===

    fn peek(&self) -> &Token {
        self.tokens.current_token().unwrap_or(&EOF_TOKEN)
    }

    fn current_span(&self) -> Span {
        self.tokens.current_span().unwrap_or_else(Span::dummy)
    }

    fn advance(&mut self) {
        self.tokens.advance();
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        self.tokens.advance_if_matches(expected)
    }

    fn expect_token(&mut self, expected: &Token, description: &str) -> ParseResult<Span> {
        if self.tokens.check_token(expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.unexpected(description))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.tokens.current_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.current() {
            Some(spanned) if !matches!(spanned.value, Token::Eof) => ParseError::unexpected_token(
                expected,
                &spanned.value.as_source_string(),
                spanned.span,
            ),
            _ => ParseError::unexpected_end_of_input(expected, self.tokens.last_position()),
        }
    }

    // === ENTRY POINTS ===

    /// Parse a complete expression; any tokens left before EOF are an error
    pub fn parse_expression_eof(&mut self) -> ParseResult<Expression> {
        let expr = self.parse_expression()?;
        match self.tokens.current() {
            Some(spanned) if !matches!(spanned.value, Token::Eof) => {
                Err(ParseError::TrailingTokens {
                    found: spanned.value.as_source_string(),
                    span: spanned.span,
                })
            }
            _ => Ok(expr),
        }
    }

    /// Parse an expression at the lowest precedence level
    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(ParseError::MaxRecursionDepth {
                span: self.current_span(),
            });
        }
        self.depth += 1;
        let result = self.parse_if_expression();
        self.depth -= 1;
        result
    }

    // === PRECEDENCE LEVELS ===

    /// `if ( cond ) then else otherwise` — recognized contextually; a
    /// missing else branch is an error.
    fn parse_if_expression(&mut self) -> ParseResult<Expression> {
        if self.peek().is_identifier_with_name("if") {
            self.advance();
            self.expect_token(&Token::LParen, "'('")?;
            let condition = self.parse_expression()?;
            self.expect_token(&Token::RParen, "')'")?;
            let when_true = self.parse_expression()?;

            if !self.peek().is_identifier_with_name("else") {
                return Err(ParseError::MissingElseBranch {
                    span: self.current_span(),
                });
            }
            self.advance();
            let when_false = self.parse_expression()?;

            return Ok(Expression::If {
                condition: Box::new(condition),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
            });
        }
        self.parse_default()
    }

    /// Left-associative default-coalesce chain
    fn parse_default(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_comparison()?;
        while self.match_token(&Token::Default) {
            let right = self.parse_comparison()?;
            expr = Expression::Default {
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    /// Left-associative comparison chain, lowered to intrinsic calls
    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_additive()?;
        loop {
            let operator = match self.peek() {
                Token::Eq => "_binary_eq",
                Token::Neq => "_binary_neq",
                Token::Gt => "_binary_gt",
                Token::Lt => "_binary_lt",
                Token::Gte => "_binary_gte",
                Token::Lte => "_binary_lte",
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = Expression::intrinsic_call(operator, vec![expr, right]);
        }
        Ok(expr)
    }

    /// `+`, `++` (concat), `--` (diff), left-associative
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let operator = match self.peek() {
                Token::Plus => "_binary_plus",
                Token::Concat => "_binary_concat",
                Token::Diff => "_binary_diff",
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = Expression::intrinsic_call(operator, vec![expr, right]);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_postfix()?;
        while matches!(self.peek(), Token::Star) {
            self.advance();
            let right = self.parse_postfix()?;
            expr = Expression::intrinsic_call("_binary_times", vec![expr, right]);
        }
        Ok(expr)
    }

    /// Postfix chain: property and index access, calls, infix identifier
    /// operators, and match expressions.
    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let attribute = self.expect_identifier()?;
                    expr = Expression::Property {
                        value: Box::new(expr),
                        attribute,
                        null_safe: false,
                    };
                }
                Token::SafeDot => {
                    self.advance();
                    let attribute = self.expect_identifier()?;
                    expr = Expression::Property {
                        value: Box::new(expr),
                        attribute,
                        null_safe: true,
                    };
                }
                Token::LParen => {
                    expr = self.parse_call(expr)?;
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_token(&Token::RBracket, "']'")?;
                    expr = Expression::Index {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Token::Identifier(name) if name == "match" => {
                    self.advance();
                    expr = self.parse_match_expression(expr)?;
                }
                Token::Identifier(name) if !RESERVED_INFIX_STOP.contains(&name.as_str()) => {
                    let operator = name.clone();
                    self.advance();
                    // `to` binds tighter than a following infix operator, so
                    // its right operand skips the infix rule.
                    let argument = if operator == "to" {
                        self.parse_postfix_no_infix()?
                    } else {
                        self.parse_postfix()?
                    };
                    expr =
                        Expression::intrinsic_call(infix_target(&operator), vec![expr, argument]);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Postfix chain without the infix-identifier and match rules
    fn parse_postfix_no_infix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let attribute = self.expect_identifier()?;
                    expr = Expression::Property {
                        value: Box::new(expr),
                        attribute,
                        null_safe: false,
                    };
                }
                Token::SafeDot => {
                    self.advance();
                    let attribute = self.expect_identifier()?;
                    expr = Expression::Property {
                        value: Box::new(expr),
                        attribute,
                        null_safe: true,
                    };
                }
                Token::LParen => {
                    expr = self.parse_call(expr)?;
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_token(&Token::RBracket, "']'")?;
                    expr = Expression::Index {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Argument list of a function call; arguments are full expressions
    fn parse_call(&mut self, function: Expression) -> ParseResult<Expression> {
        self.expect_token(&Token::LParen, "'('")?;
        let mut arguments = Vec::new();
        if !self.match_token(&Token::RParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if self.match_token(&Token::RParen) {
                    break;
                }
                self.expect_token(&Token::Comma, "','")?;
            }
        }
        Ok(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    // === MATCH EXPRESSIONS ===

    /// `subject match { case ... , else -> ... }` — commas between cases are
    /// optional, at least one case is required.
    fn parse_match_expression(&mut self, value: Expression) -> ParseResult<Expression> {
        let brace_span = self.expect_token(&Token::LBrace, "'{'")?;
        let mut cases = Vec::new();
        loop {
            if self.match_token(&Token::RBrace) {
                break;
            }
            if self.peek().is_identifier_with_name("case") {
                self.advance();
                let pattern = self.parse_match_pattern()?;
                self.expect_token(&Token::Arrow, "'->'")?;
                let expression = self.parse_expression()?;
                cases.push(MatchCase {
                    pattern: Some(pattern),
                    expression,
                });
            } else if self.peek().is_identifier_with_name("else") {
                self.advance();
                self.expect_token(&Token::Arrow, "'->'")?;
                let expression = self.parse_expression()?;
                cases.push(MatchCase {
                    pattern: None,
                    expression,
                });
            } else {
                return Err(self.unexpected("'case' or 'else' in match expression"));
            }
            self.match_token(&Token::Comma);
        }

        if cases.is_empty() {
            return Err(ParseError::EmptyMatch { span: brace_span });
        }
        Ok(Expression::Match {
            value: Box::new(value),
            cases,
        })
    }

    /// `var name` binds the subject; any other form is an equality matcher.
    /// Either may be followed by `when guard`.
    fn parse_match_pattern(&mut self) -> ParseResult<MatchPattern> {
        let mut binding = None;
        let mut matcher = None;

        if self.peek().is_identifier_with_name("var") {
            self.advance();
            binding = Some(self.expect_identifier()?);
        } else {
            matcher = Some(self.parse_expression()?);
        }

        let guard = if self.peek().is_identifier_with_name("when") {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(MatchPattern {
            binding,
            matcher,
            guard,
        })
    }

    // === LAMBDA DETECTION ===

    /// Try the simple lambda form, then the legacy form, rolling the token
    /// cursor back on failure. Returns None when neither applies.
    fn maybe_parse_lambda(&mut self) -> Option<Expression> {
        let checkpoint = self.tokens.save_position();
        match self.parse_lambda_simple() {
            Ok(lambda) => Some(lambda),
            Err(_) => {
                self.tokens.restore_position(checkpoint);
                match self.parse_lambda_legacy() {
                    Ok(lambda) => Some(lambda),
                    Err(_) => {
                        self.tokens.restore_position(checkpoint);
                        None
                    }
                }
            }
        }
    }

    /// Simple form: `( p1, p2 = default ) -> body`
    fn parse_lambda_simple(&mut self) -> ParseResult<Expression> {
        self.expect_token(&Token::LParen, "'('")?;
        let mut parameters = Vec::new();
        if !self.match_token(&Token::RParen) {
            loop {
                let name = self.expect_identifier()?;
                let default = if self.match_token(&Token::Equal) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                parameters.push(Parameter { name, default });
                if self.match_token(&Token::Comma) {
                    continue;
                }
                self.expect_token(&Token::RParen, "')'")?;
                break;
            }
        }
        self.expect_token(&Token::Arrow, "'->'")?;
        let body = self.parse_expression()?;
        Ok(Expression::Lambda {
            parameters,
            body: Box::new(body),
        })
    }

    /// Legacy form: `( ( p1, p2 ) -> body )` — the whole lambda lives inside
    /// outer parens.
    fn parse_lambda_legacy(&mut self) -> ParseResult<Expression> {
        self.expect_token(&Token::LParen, "'('")?;
        let parameters = self.parse_parameter_list()?;
        self.expect_token(&Token::Arrow, "'->'")?;
        let body = self.parse_expression()?;
        self.expect_token(&Token::RParen, "')'")?;
        Ok(Expression::Lambda {
            parameters,
            body: Box::new(body),
        })
    }

    fn parse_parameter_list(&mut self) -> ParseResult<Vec<Parameter>> {
        self.expect_token(&Token::LParen, "'('")?;
        let mut parameters = Vec::new();
        if self.match_token(&Token::RParen) {
            return Ok(parameters);
        }
        loop {
            let name = self.expect_identifier()?;
            let default = if self.match_token(&Token::Equal) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            parameters.push(Parameter { name, default });
            if self.match_token(&Token::Comma) {
                continue;
            }
            self.expect_token(&Token::RParen, "')'")?;
            break;
        }
        Ok(parameters)
    }

    // === PRIMARY EXPRESSIONS ===

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.peek() {
            Token::LBrace => self.parse_object(),
            Token::LBracket => self.parse_list(),
            Token::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(Expression::String(value))
            }
            Token::Number(value) => {
                let value = *value;
                self.advance();
                Ok(Expression::Number(value))
            }
            Token::Boolean(value) => {
                let value = *value;
                self.advance();
                Ok(Expression::Boolean(value))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Null)
            }
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expression::Identifier(name))
            }
            Token::LParen => {
                if let Some(lambda) = self.maybe_parse_lambda() {
                    return Ok(lambda);
                }
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(&Token::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Object literal. Keys are bare identifiers or quoted strings; order is
    /// preserved; trailing commas are not allowed; empty is allowed.
    fn parse_object(&mut self) -> ParseResult<Expression> {
        self.expect_token(&Token::LBrace, "'{'")?;
        let mut fields = Vec::new();
        if !self.match_token(&Token::RBrace) {
            loop {
                let key = match self.peek() {
                    Token::String(value) => {
                        let key = value.clone();
                        self.advance();
                        key
                    }
                    _ => self.expect_identifier()?,
                };
                self.expect_token(&Token::Colon, "':'")?;
                let value = self.parse_expression()?;
                fields.push((key, value));
                if self.match_token(&Token::RBrace) {
                    break;
                }
                self.expect_token(&Token::Comma, "','")?;
            }
        }
        Ok(Expression::Object(fields))
    }

    fn parse_list(&mut self) -> ParseResult<Expression> {
        self.expect_token(&Token::LBracket, "'['")?;
        let mut elements = Vec::new();
        if !self.match_token(&Token::RBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if self.match_token(&Token::RBracket) {
                    break;
                }
                self.expect_token(&Token::Comma, "','")?;
            }
        }
        Ok(Expression::List(elements))
    }
}

/// Tokenize and parse a standalone expression
pub fn parse_expression_from_source(source: &str) -> ParseResult<Expression> {
    let tokens = crate::lexical::tokenize(source)?;
    let mut parser = ExpressionParser::new(tokens);
    parser.parse_expression_eof()
}
