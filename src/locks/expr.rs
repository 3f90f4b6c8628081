/// Lock expression parser and evaluator
///
/// Lock keys are small boolean expressions:
///
/// ```text
/// Or    := And ('|' And)*
/// And   := Unary ('&' Unary)*
/// Unary := '!' Unary | '(' Or ')' | Literal
/// ```
///
/// A literal is any run of characters other than whitespace, `&`, `|` and
/// `)`. Literals are matched case-insensitively: `TRUE_BOOLEXP`/`TRUE`,
/// `FALSE_BOOLEXP`/`FALSE`, `#<dbref>` and `PLAYER`. Every other literal is
/// false.
///
/// Evaluation fails closed: an expression that does not parse denies.

use std::fmt;

use log::debug;
use thiserror::Error;

use crate::logutil::escape_log;
use crate::world::{parse_dbref, Dbref};

/// Deepest `(`/`!` nesting accepted before parsing gives up.
pub const MAX_LOCK_NESTING: usize = 128;

/// The party a lock is being tested against.
pub trait IdentityCheck: Send + Sync {
    /// True when the subject is object `dbref`.
    fn is(&self, dbref: Dbref) -> bool;

    /// Answer for the `PLAYER` token.
    fn is_player(&self) -> bool {
        true
    }
}

impl IdentityCheck for Dbref {
    fn is(&self, dbref: Dbref) -> bool {
        *self == dbref
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockParseError {
    #[error("empty lock expression")]
    Empty,
    #[error("unexpected {found} at token {position}")]
    Unexpected { found: String, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("missing ')' for '(' at token {position}")]
    UnclosedParen { position: usize },
    #[error("trailing input starting with {found}")]
    Trailing { found: String },
    #[error("nesting deeper than {limit}")]
    TooDeep { limit: usize },
}

/// Lexical tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(s) => write!(f, "literal '{}'", s),
            Token::And => write!(f, "'&'"),
            Token::Or => write!(f, "'|'"),
            Token::Not => write!(f, "'!'"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Meaning of a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockToken {
    True,
    False,
    Dbref(Dbref),
    Player,
    Unknown(String),
}

impl LockToken {
    pub fn classify(text: &str) -> Self {
        let upper = text.to_ascii_uppercase();
        match upper.as_str() {
            "TRUE_BOOLEXP" | "TRUE" => LockToken::True,
            "FALSE_BOOLEXP" | "FALSE" => LockToken::False,
            "PLAYER" => LockToken::Player,
            _ => match parse_dbref(text) {
                Some(dbref) => LockToken::Dbref(dbref),
                None => LockToken::Unknown(text.to_string()),
            },
        }
    }

    fn evaluate(&self, subject: &dyn IdentityCheck) -> bool {
        match self {
            LockToken::True => true,
            LockToken::False => false,
            LockToken::Dbref(dbref) => subject.is(*dbref),
            LockToken::Player => subject.is_player(),
            LockToken::Unknown(_) => false,
        }
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockToken::True => write!(f, "TRUE_BOOLEXP"),
            LockToken::False => write!(f, "FALSE_BOOLEXP"),
            LockToken::Dbref(d) => write!(f, "#{}", d),
            LockToken::Player => write!(f, "PLAYER"),
            LockToken::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Parsed lock expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockExpr {
    Literal(LockToken),
    Not(Box<LockExpr>),
    And(Box<LockExpr>, Box<LockExpr>),
    Or(Box<LockExpr>, Box<LockExpr>),
}

impl LockExpr {
    pub fn parse(text: &str) -> Result<LockExpr, LockParseError> {
        let tokens = Tokenizer::new(text).tokenize();
        if tokens.len() == 1 {
            return Err(LockParseError::Empty);
        }
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_or(0)?;
        match parser.current() {
            Token::Eof => Ok(expr),
            other => Err(LockParseError::Trailing {
                found: other.to_string(),
            }),
        }
    }

    pub fn evaluate(&self, subject: &dyn IdentityCheck) -> bool {
        match self {
            LockExpr::Literal(token) => token.evaluate(subject),
            LockExpr::Not(inner) => !inner.evaluate(subject),
            LockExpr::And(left, right) => left.evaluate(subject) && right.evaluate(subject),
            LockExpr::Or(left, right) => left.evaluate(subject) || right.evaluate(subject),
        }
    }
}

impl fmt::Display for LockExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockExpr::Literal(token) => write!(f, "{}", token),
            LockExpr::Not(inner) => write!(f, "!{}", inner),
            LockExpr::And(l, r) => write!(f, "({} & {})", l, r),
            LockExpr::Or(l, r) => write!(f, "({} | {})", l, r),
        }
    }
}

/// Stateless entry point used wherever a permission decision is made.
#[derive(Debug, Default, Clone, Copy)]
pub struct LockExpressionEngine;

impl LockExpressionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, expression: &str) -> Result<LockExpr, LockParseError> {
        LockExpr::parse(expression)
    }

    /// Evaluate `expression` for `subject`. Parse failures deny.
    pub fn evaluate(&self, expression: &str, subject: &dyn IdentityCheck) -> bool {
        match LockExpr::parse(expression) {
            Ok(expr) => expr.evaluate(subject),
            Err(e) => {
                debug!("Lock {} denied: {}", escape_log(expression), e);
                false
            }
        }
    }
}

/// Tokenizer for lock keys
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    fn read_literal(&mut self) -> String {
        let mut literal = String::new();
        while let Some(ch) = self.current() {
            if ch.is_whitespace() || matches!(ch, '&' | '|' | ')') {
                break;
            }
            literal.push(ch);
            self.position += 1;
        }
        literal
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let token = match self.current() {
            None => return Token::Eof,
            Some('&') => Token::And,
            Some('|') => Token::Or,
            Some('!') => Token::Not,
            Some('(') => Token::LeftParen,
            Some(')') => Token::RightParen,
            Some(_) => return Token::Literal(self.read_literal()),
        };
        self.position += 1;
        token
    }

    /// All tokens, always ending in [`Token::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn parse_or(&mut self, depth: usize) -> Result<LockExpr, LockParseError> {
        let mut left = self.parse_and(depth)?;
        while matches!(self.current(), Token::Or) {
            self.advance();
            let right = self.parse_and(depth)?;
            left = LockExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self, depth: usize) -> Result<LockExpr, LockParseError> {
        let mut left = self.parse_unary(depth)?;
        while matches!(self.current(), Token::And) {
            self.advance();
            let right = self.parse_unary(depth)?;
            left = LockExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self, depth: usize) -> Result<LockExpr, LockParseError> {
        if depth > MAX_LOCK_NESTING {
            return Err(LockParseError::TooDeep {
                limit: MAX_LOCK_NESTING,
            });
        }
        match self.current().clone() {
            Token::Not => {
                self.advance();
                Ok(LockExpr::Not(Box::new(self.parse_unary(depth + 1)?)))
            }
            Token::LeftParen => {
                let open = self.position;
                self.advance();
                let inner = self.parse_or(depth + 1)?;
                if !matches!(self.current(), Token::RightParen) {
                    return Err(LockParseError::UnclosedParen { position: open });
                }
                self.advance();
                Ok(inner)
            }
            Token::Literal(text) => {
                self.advance();
                Ok(LockExpr::Literal(LockToken::classify(&text)))
            }
            Token::Eof => Err(LockParseError::UnexpectedEnd),
            other => Err(LockParseError::Unexpected {
                found: other.to_string(),
                position: self.position,
            }),
        }
    }
}
