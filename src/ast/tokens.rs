/// What kind of lexeme a [`Token`] carries.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Delimiters
    /// Opening parenthesis, starts an operator call
    OpenParen,

    /// Closing parenthesis
    CloseParen,

    // Literals
    /// Integer literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -10
    /// ```
    Integer(i64),

    /// Floating-point literal
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -0.5
    /// ```
    Float(f64),

    /// String literal enclosed in double quotes
    ///
    /// Supports `\"`, `\\`, `\n`, `\t` and `\r` escapes.
    ///
    /// # Examples
    /// ```text
    /// "Alpha 1"
    /// "escort \"Bastion\""
    /// ```
    String(String),

    /// Boolean literal, lexed from the bare atoms `true` and `false`
    Boolean(bool),

    /// Bare atom: operator or keyword name
    ///
    /// Atoms may contain letters, digits, `_`, `-` and the symbolic
    /// operator characters (`+ - * / = < > ! ?`).
    ///
    /// # Examples
    /// ```text
    /// and
    /// +
    /// is-ship-visible
    /// ```
    Atom(String),

    /// Variable reference (`@name`)
    ///
    /// Resolved against the scoped variable store at evaluation time.
    ///
    /// # Examples
    /// ```text
    /// @mission_score
    /// @alpha-wing-losses
    /// ```
    VariableRef(String),

    /// End of input
    Eof,
}

/// A single lexeme together with where it begins in the source text.
///
/// Line and column are 1-based and refer to the first character of the
/// lexeme. Tokens are immutable: created by the lexer, consumed by the
/// parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Token { kind, line, column }
    }

    /// True for the end-of-input marker.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
