//! Tokenizer for the EBNF dialect.
//!
//! Matchers are tried in a fixed order and the first one that accepts the
//! input at the current position wins, regardless of match length.

use std::fmt::{self, Display};

use log::{debug, trace};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::satisfy,
    combinator::{consumed, map, recognize, value},
    sequence::{delimited, pair, tuple},
    IResult,
};

use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Literal,
    Equals,
    Semicolon,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Pipe,
    Comma,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Literal => "literal",
            TokenKind::Equals => "'='",
            TokenKind::Semicolon => "';'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Pipe => "'|'",
            TokenKind::Comma => "','",
        };
        f.write_str(s)
    }
}

/// A lexed token. Literal text keeps its surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Split grammar text into tokens, dropping comments and whitespace.
///
/// Fails on the first character no matcher accepts. Comments are `(* ... *)`
/// and may not contain `*`: `(* a * b *)` is not a comment, it lexes as `(`
/// and then fails on the `*`.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut position = Position::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let (remaining, (matched, lexeme)) =
            next_lexeme(rest).map_err(|_| position.illegal(c))?;
        match lexeme {
            Lexeme::Token(kind) => tokens.push(Token {
                kind,
                text: matched.to_owned(),
                line: position.line,
                column: position.column,
            }),
            Lexeme::Comment => trace!(
                "skipping comment at line {}, column {}",
                position.line,
                position.column
            ),
            Lexeme::Whitespace | Lexeme::Newline => {}
        }
        position.advance(matched);
        rest = remaining;
    }

    debug!("tokenized {} tokens", tokens.len());
    Ok(tokens)
}

/// Line and column of the next character to scan, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: usize,
    column: usize,
}

impl Position {
    fn new() -> Self {
        Position { line: 1, column: 1 }
    }

    /// Move past consumed text.
    fn advance(&mut self, consumed: &str) {
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn illegal(&self, character: char) -> LexError {
        LexError {
            character,
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Comment,
    Token(TokenKind),
    Whitespace,
    Newline,
}

fn next_lexeme(input: &str) -> IResult<&str, (&str, Lexeme)> {
    alt((
        map(comment, |s| (s, Lexeme::Comment)),
        map(identifier, |s| (s, Lexeme::Token(TokenKind::Identifier))),
        map(literal, |s| (s, Lexeme::Token(TokenKind::Literal))),
        map(consumed(punctuation), |(s, kind)| (s, Lexeme::Token(kind))),
        map(whitespace, |s| (s, Lexeme::Whitespace)),
        map(tag("\n"), |s| (s, Lexeme::Newline)),
        // Carriage returns and other stray whitespace, one at a time.
        map(recognize(satisfy(|c: char| c.is_whitespace())), |s| {
            (s, Lexeme::Whitespace)
        }),
    ))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("(*"), take_while(|c: char| c != '*'), tag("*)"))))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn literal(input: &str) -> IResult<&str, &str> {
    recognize(alt((
        delimited(tag("'"), take_while(|c: char| c != '\''), tag("'")),
        delimited(tag("\""), take_while(|c: char| c != '"'), tag("\"")),
    )))(input)
}

fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Equals, tag("=")),
        value(TokenKind::Semicolon, tag(";")),
        value(TokenKind::LBracket, tag("[")),
        value(TokenKind::RBracket, tag("]")),
        value(TokenKind::LParen, tag("(")),
        value(TokenKind::RParen, tag(")")),
        value(TokenKind::LBrace, tag("{")),
        value(TokenKind::RBrace, tag("}")),
        value(TokenKind::Pipe, tag("|")),
        value(TokenKind::Comma, tag(",")),
    ))(input)
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c == ' ' || c == '\t')(input)
}
