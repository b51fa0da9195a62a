use std::fmt;

use crate::ast::{Token, TokenKind};

/// Error produced when the lexer encounters a malformed token.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lex error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

impl LexError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        LexError {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Characters that may appear in a bare atom. Atoms cover operator names
/// like `+`, `<=` and `is-ship-visible` as well as keywords.
fn is_atom_char(ch: char) -> bool {
    ch.is_alphanumeric()
        || matches!(
            ch,
            '_' | '-' | '+' | '*' | '/' | '=' | '<' | '>' | '!' | '?' | '.' | '%'
        )
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
    }

    /// Skip whitespace, `;` line comments, and `/* */` block comments.
    ///
    /// Block comments track a depth counter: every `/*` increments, every
    /// `*/` decrements, and comment mode ends once depth reaches zero. An
    /// unclosed block comment simply runs to end of input.
    fn skip_trivia(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some(';') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    let mut depth: i32 = 1;
                    while depth > 0 {
                        match self.current_char() {
                            Some('/') if self.peek_char(1) == Some('*') => {
                                depth += 1;
                                self.advance();
                                self.advance();
                            }
                            Some('*') if self.peek_char(1) == Some('/') => {
                                depth -= 1;
                                self.advance();
                                self.advance();
                            }
                            Some(_) => self.advance(),
                            None => break,
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_atom_text(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_atom_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        let (start_line, start_column) = (self.line, self.column);
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(LexError::new(
                                format!("Invalid escape sequence: \\{}", ch),
                                self.line,
                                self.column,
                            ));
                        }
                        None => {
                            return Err(LexError::new(
                                "Unterminated string: unexpected end of input after backslash",
                                start_line,
                                start_column,
                            ));
                        }
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::new(
            "Unterminated string: missing closing quote",
            start_line,
            start_column,
        ))
    }

    /// Read a numeric literal. The leading `-` (if any) has already been
    /// validated as introducing a number, not an atom.
    fn read_number(&mut self) -> Result<TokenKind, LexError> {
        let (start_line, start_column) = (self.line, self.column);
        let mut number = String::new();
        let mut is_float = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // "12abc" is a malformed number, not a number followed by an atom
        if self.current_char().is_some_and(is_atom_char) {
            return Err(LexError::new(
                format!("Invalid character in number literal '{}'", number),
                start_line,
                start_column,
            ));
        }

        if is_float {
            number
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| LexError::new(format!("Invalid float '{}'", number), start_line, start_column))
        } else {
            number
                .parse::<i64>()
                .map(TokenKind::Integer)
                .map_err(|_| {
                    LexError::new(
                        format!("Integer literal '{}' out of range", number),
                        start_line,
                        start_column,
                    )
                })
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);

        let kind = match self.current_char() {
            None => TokenKind::Eof,
            Some('(') => {
                self.advance();
                TokenKind::OpenParen
            }
            Some(')') => {
                self.advance();
                TokenKind::CloseParen
            }
            Some('"') => TokenKind::String(self.read_string()?),
            Some('@') => {
                self.advance();
                let name = self.read_atom_text();
                if name.is_empty() {
                    return Err(LexError::new(
                        "Expected variable name after '@'",
                        line,
                        column,
                    ));
                }
                TokenKind::VariableRef(name)
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()?
            }
            Some(ch) if is_atom_char(ch) => {
                let atom = self.read_atom_text();
                match atom.as_str() {
                    "true" => TokenKind::Boolean(true),
                    "false" => TokenKind::Boolean(false),
                    _ => TokenKind::Atom(atom),
                }
            }
            Some(ch) => {
                return Err(LexError::new(
                    format!("Unexpected character '{}'", ch),
                    line,
                    column,
                ));
            }
        };

        Ok(Token::new(kind, line, column))
    }

    /// Tokenize the remaining input into a finite sequence ending with Eof.
    ///
    /// The lexer holds no state between calls to [`Lexer::new`]; callers may
    /// re-tokenize the same text any number of times.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_atoms_and_booleans() {
    let mut lexer = Lexer::new("and or true false is-ship-visible");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Atom("and".into()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Atom("or".into()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Boolean(true));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Boolean(false));
    assert_eq!(
        lexer.next_token().unwrap().kind,
        TokenKind::Atom("is-ship-visible".into())
    );
}

#[test]
fn test_nested_block_comment() {
    let mut lexer = Lexer::new("/* outer /* inner */ still skipped */ 7");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Integer(7));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}
