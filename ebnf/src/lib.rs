//! Analysis of grammars written in a small EBNF dialect.
//!
//! Text is lexed with [`tokenize`], parsed into a [`Syntax`] tree with
//! [`parse`], and checked with [`compute_first_sets`], which reports the
//! terminals that can start every rule or fails on left recursion and
//! FIRST/FIRST conflicts.
//!
//! ```
//! use ebnf::Grammar;
//!
//! let grammar: Grammar = "a = 'a' , b ; b = 'b' ;".parse().unwrap();
//! let first = grammar.first_sets(&Default::default()).unwrap();
//! assert!(first.get("a").unwrap().contains("'a'"));
//! ```

use std::collections::BTreeSet;
use std::str::FromStr;

mod ast;
mod error;
mod first;
mod graphviz;
mod lexer;
mod parser;

pub use ast::{Expression, Factor, Production, Syntax, Term};
pub use error::{Error, Expected, FirstError, Found, LexError, Result, SyntaxError};
pub use first::{
    compute_first_sets, FirstEntry, FirstSet, FirstSets, MAX_RESOLUTION_DEPTH, SKIPPED,
};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, MAX_NESTING_DEPTH};

/// A parsed grammar with its referenced names split into terminals.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Grammar {
    pub rules: Syntax,
    /// Names referenced in some body that are not rule names, sorted.
    pub terminals: BTreeSet<String>,
}

impl Grammar {
    /// FIRST sets of every rule, leaving rules in `skip` unexpanded.
    pub fn first_sets(
        &self,
        skip: &BTreeSet<String>,
    ) -> std::result::Result<FirstSets, FirstError> {
        compute_first_sets(&self.rules, &self.terminals, skip)
    }
}

impl FromStr for Grammar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s)?;
        let grammar = parse(&tokens)?;
        Ok(grammar)
    }
}
