use std::fmt;

use crate::{
    ast::{Expr, Token, TokenKind},
    lexer::{LexError, Lexer},
};

/// Error produced when the parser encounters malformed structure.
///
/// Unmatched parentheses are reported through this type with messages
/// containing "unmatched opening parenthesis" / "unmatched closing
/// parenthesis".
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            message: e.message,
            line: e.line,
            column: e.column,
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.current_token.line,
            column: self.current_token.column,
        }
    }

    /// Parse a single expression: a literal, a variable reference, or a
    /// parenthesized operator call.
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let Token { line, column, .. } = self.current_token;

        match self.current_token.kind.clone() {
            TokenKind::Integer(n) => {
                self.advance()?;
                Ok(Expr::Integer(n))
            }
            TokenKind::Float(n) => {
                self.advance()?;
                Ok(Expr::Float(n))
            }
            TokenKind::String(s) => {
                self.advance()?;
                Ok(Expr::String(s))
            }
            TokenKind::Boolean(b) => {
                self.advance()?;
                Ok(Expr::Boolean(b))
            }
            TokenKind::VariableRef(name) => {
                self.advance()?;
                Ok(Expr::VariableRef { name, line, column })
            }
            TokenKind::OpenParen => self.parse_operator_call(),
            TokenKind::CloseParen => {
                // A ')' reaching expression position can only happen at depth 0;
                // inside a call the argument loop consumes it first.
                Err(self.error("Unmatched closing parenthesis"))
            }
            TokenKind::Atom(name) => Err(self.error(format!(
                "Bare atom '{}' - operator names must appear as the first element of a parenthesized call",
                name
            ))),
            TokenKind::Eof => Err(self.error("Unexpected end of input, expected an expression")),
        }
    }

    /// Parse `( head expr* )`. The head must be an atom; the boolean atoms
    /// `true`/`false` in head position name the zero-argument operators of
    /// the same name.
    fn parse_operator_call(&mut self) -> Result<Expr, ParseError> {
        let Token { line, column, .. } = self.current_token;
        self.advance()?; // Consume '('
        self.depth += 1;

        let name = match self.current_token.kind.clone() {
            TokenKind::Atom(name) => name,
            TokenKind::Boolean(b) => if b { "true" } else { "false" }.to_string(),
            TokenKind::CloseParen => {
                return Err(self.error("Empty expression: expected an operator name after '('"));
            }
            TokenKind::Eof => {
                return Err(self.error(format!(
                    "Unmatched opening parenthesis: {} still open at end of input",
                    self.depth
                )));
            }
            other => {
                return Err(self.error(format!(
                    "Expected an operator name after '(', got {:?}",
                    other
                )));
            }
        };
        self.advance()?;

        let mut args = Vec::new();
        loop {
            match self.current_token.kind {
                TokenKind::CloseParen => {
                    self.advance()?;
                    self.depth -= 1;
                    return Ok(Expr::OperatorCall {
                        name,
                        args,
                        line,
                        column,
                    });
                }
                TokenKind::Eof => {
                    return Err(self.error(format!(
                        "Unmatched opening parenthesis: {} still open at end of input",
                        self.depth
                    )));
                }
                _ => args.push(self.parse_expression()?),
            }
        }
    }

    /// Parse exactly one top-level expression followed by end of input.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if !self.current_token.is_eof() {
            return Err(self.error(format!(
                "Unexpected trailing input after expression: {:?}",
                self.current_token.kind
            )));
        }
        Ok(expr)
    }

    /// Parse a sequence of independent top-level expressions from one text
    /// blob. Returns one root expression per form.
    pub fn parse_program(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut forms = Vec::new();
        while !self.current_token.is_eof() {
            forms.push(self.parse_expression()?);
        }
        Ok(forms)
    }
}

/// Convenience: parse a single expression straight from source text.
pub fn parse_str(text: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(text))?.parse()
}
