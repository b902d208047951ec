use std::fmt::{self, Display};

use thiserror::Error;

use crate::lexer::TokenKind;
use crate::parser::MAX_NESTING_DEPTH;

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure produced while turning grammar text into FIRST sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("failed to tokenize: {0}")]
    Lex(#[from] LexError),
    #[error("failed to parse: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("failed to compute FIRST: {0}")]
    First(#[from] FirstError),
}

/// A character that no token pattern accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal character {character:?} at line {line}, column {column}")]
pub struct LexError {
    pub character: char,
    pub line: usize,
    pub column: usize,
}

/// What the parser was looking for when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    /// Any token that can start a factor.
    Factor,
}

impl Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Expected::Token(kind) => write!(f, "{}", kind),
            Expected::Factor => write!(f, "a factor"),
        }
    }
}

/// What the parser saw instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Token(TokenKind),
    EndOfInput,
    /// An opening bracket past [`MAX_NESTING_DEPTH`].
    TooDeep(TokenKind),
}

impl Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Found::Token(kind) => write!(f, "{}", kind),
            Found::EndOfInput => write!(f, "end of input"),
            Found::TooDeep(kind) => write!(
                f,
                "{} nested deeper than {} levels",
                kind, MAX_NESTING_DEPTH
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} but got {found} at line {line}, column {column}")]
pub struct SyntaxError {
    pub expected: Expected,
    pub found: Found,
    pub line: usize,
    pub column: usize,
}

/// Reasons a grammar has no single-token-lookahead FIRST table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FirstError {
    #[error("'{0}' is reached again while resolving it, left recursion")]
    LeftRecursion(String),
    #[error("alternatives of '{0}' share a leading terminal, FIRST/FIRST conflict")]
    FirstFirstConflict(String),
    #[error("resolving '{0}' exceeded the maximum resolution depth")]
    DepthLimit(String),
}

impl FirstError {
    /// The rule the error was raised for.
    pub fn rule_name(&self) -> &str {
        match self {
            FirstError::LeftRecursion(rule)
            | FirstError::FirstFirstConflict(rule)
            | FirstError::DepthLimit(rule) => rule,
        }
    }
}
