//! Recursive-descent parser over lexed tokens.
//!
//! ```text
//! syntax      = { production } ;
//! production  = identifier "=" expression ";" ;
//! expression  = term { "|" term } ;
//! term        = factor { "," factor } ;
//! factor      = identifier | literal | optional | repeated | grouped ;
//! optional    = "[" expression "]" ;
//! repeated    = "{" expression "}" ;
//! grouped     = "(" expression ")" ;
//! ```

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::ast::{Expression, Factor, Production, Syntax, Term};
use crate::error::{Expected, Found, SyntaxError};
use crate::lexer::{Token, TokenKind};
use crate::Grammar;

/// Deepest allowed nesting of `[ ]`, `{ }` and `( )` inside one production.
/// Every later walk over the tree recurses once per level.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Build the AST from a token sequence and split referenced names into
/// terminals and rule names.
///
/// The first unexpected token fails the whole parse.
pub fn parse(tokens: &[Token]) -> Result<Grammar, SyntaxError> {
    let mut parser = Parser {
        tokens,
        idx: 0,
        depth: 0,
    };

    let mut productions = Vec::new();
    while parser.peek().is_some() {
        productions.push(parser.production()?);
    }
    let rules = Syntax { productions };

    let terminals = terminals(&rules);
    debug!(
        "parsed {} rules referencing {} terminals",
        rules.len(),
        terminals.len()
    );

    Ok(Grammar { rules, terminals })
}

/// Referenced names that are not also rule names. Only meaningful once every
/// production has been seen.
fn terminals(rules: &Syntax) -> BTreeSet<String> {
    let mut names = rules.referenced_names();
    let mut seen = BTreeSet::new();
    for production in rules {
        if !seen.insert(production.name()) {
            warn!(
                "rule '{}' is defined more than once, line {} shadows the earlier definition",
                production.name(),
                production.name.line
            );
        }
        names.remove(production.name());
    }
    names.into_iter().map(str::to_owned).collect()
}

struct Parser<'a> {
    tokens: &'a [Token],
    idx: usize,
    /// Brackets currently open.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.idx)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        matches!(self.peek(), Some(tok) if tok.kind == kind)
    }

    /// Consume the current token if it has the expected kind.
    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token, SyntaxError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.idx += 1;
                Ok(tok)
            }
            _ => Err(self.unexpected(Expected::Token(kind))),
        }
    }

    /// Error describing the current token, or the end of input.
    fn unexpected(&self, expected: Expected) -> SyntaxError {
        match self.peek() {
            Some(tok) => SyntaxError {
                expected,
                found: Found::Token(tok.kind),
                line: tok.line,
                column: tok.column,
            },
            None => {
                let (line, column) = self
                    .tokens
                    .last()
                    .map(|tok| (tok.line, tok.column + tok.text.chars().count()))
                    .unwrap_or((1, 1));
                SyntaxError {
                    expected,
                    found: Found::EndOfInput,
                    line,
                    column,
                }
            }
        }
    }

    fn production(&mut self) -> Result<Production, SyntaxError> {
        let name = self.expect(TokenKind::Identifier)?.clone();
        self.expect(TokenKind::Equals)?;
        let body = self.expression()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Production { name, body })
    }

    fn expression(&mut self) -> Result<Expression, SyntaxError> {
        let mut terms = vec![self.term()?];
        while self.peek_is(TokenKind::Pipe) {
            self.expect(TokenKind::Pipe)?;
            terms.push(self.term()?);
        }
        Ok(Expression { terms })
    }

    fn term(&mut self) -> Result<Term, SyntaxError> {
        let mut factors = vec![self.factor()?];
        while self.peek_is(TokenKind::Comma) {
            self.expect(TokenKind::Comma)?;
            factors.push(self.factor()?);
        }
        Ok(Term { factors })
    }

    fn factor(&mut self) -> Result<Factor, SyntaxError> {
        let kind = match self.peek() {
            Some(tok) => tok.kind,
            None => return Err(self.unexpected(Expected::Factor)),
        };
        match kind {
            TokenKind::Identifier => {
                let tok = self.expect(TokenKind::Identifier)?;
                Ok(Factor::Identifier(tok.text.clone()))
            }
            TokenKind::Literal => {
                let tok = self.expect(TokenKind::Literal)?;
                Ok(Factor::Literal(tok.text.clone()))
            }
            TokenKind::LBracket => {
                let expr = self.enclosed(TokenKind::LBracket, TokenKind::RBracket)?;
                Ok(Factor::Optional(expr))
            }
            TokenKind::LBrace => {
                let expr = self.enclosed(TokenKind::LBrace, TokenKind::RBrace)?;
                Ok(Factor::Repeated(expr))
            }
            TokenKind::LParen => {
                let expr = self.enclosed(TokenKind::LParen, TokenKind::RParen)?;
                Ok(Factor::Grouped(expr))
            }
            _ => Err(self.unexpected(Expected::Factor)),
        }
    }

    fn enclosed(&mut self, open: TokenKind, close: TokenKind) -> Result<Expression, SyntaxError> {
        if self.depth == MAX_NESTING_DEPTH {
            let mut err = self.unexpected(Expected::Factor);
            err.found = Found::TooDeep(open);
            return Err(err);
        }
        self.expect(open)?;
        self.depth += 1;
        let expr = self.expression()?;
        self.depth -= 1;
        self.expect(close)?;
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use pretty_assertions::assert_eq;

    struct TestCase {
        input: &'static str,
        // Some holds the displayed rules, None indicates error.
        out: Option<Vec<&'static str>>,
    }

    fn parse_str(input: &str) -> Result<Grammar, SyntaxError> {
        let tokens = tokenize(input).unwrap_or_else(|e| panic!("input {:?}: {}", input, e));
        parse(&tokens)
    }

    fn assert_test_cases(tests: Vec<TestCase>) {
        for t in tests {
            let res = parse_str(t.input);
            match t.out {
                Some(out) => {
                    let grammar = res.unwrap_or_else(|e| panic!("input {:?}: {}", t.input, e));
                    let got: Vec<_> = grammar.rules.iter().map(|p| p.to_string()).collect();
                    assert_eq!(got, out, "input: {:?}", t.input);
                }
                None => assert!(res.is_err(), "expected error: {:?}", res),
            }
        }
    }

    #[test]
    fn parse_productions() {
        assert_test_cases(vec![
            TestCase {
                input: "",
                out: Some(vec![]),
            },
            TestCase {
                input: "a = b;",
                out: Some(vec!["a ::= b;"]),
            },
            TestCase {
                input: "a = b; c = d;",
                out: Some(vec!["a ::= b;", "c ::= d;"]),
            },
            TestCase {
                input: "rule = lhs , \"=\" , rhs ;",
                out: Some(vec!["rule ::= lhs \"=\" rhs;"]),
            },
            TestCase {
                input: "a = 'x' | b , [ c | 'y' ] | { d } , ( e , f ) ;",
                out: Some(vec!["a ::= 'x' | b [c | 'y'] | {d} (e f);"]),
            },
            TestCase {
                input: "a = [ [ { ( b ) } ] ] ;",
                out: Some(vec!["a ::= [[{(b)}]];"]),
            },
            TestCase {
                input: "a = ;",
                out: None,
            },
            TestCase {
                input: "a = b c ;",
                out: None,
            },
            TestCase {
                input: "= b ;",
                out: None,
            },
            TestCase {
                input: "a = ( b ] ;",
                out: None,
            },
        ]);
    }

    #[test]
    fn parse_nested_structure() {
        let grammar = parse_str("a = [ b ] , 'c' | d ;").unwrap();
        let production = &grammar.rules.productions[0];
        assert_eq!(production.name.line, 1);
        assert_eq!(production.name.column, 1);
        assert_eq!(
            production.body,
            Expression {
                terms: vec![
                    Term {
                        factors: vec![
                            Factor::Optional(Expression {
                                terms: vec![Term {
                                    factors: vec![Factor::Identifier("b".to_owned())],
                                }],
                            }),
                            Factor::Literal("'c'".to_owned()),
                        ],
                    },
                    Term {
                        factors: vec![Factor::Identifier("d".to_owned())],
                    },
                ],
            }
        );
    }

    #[test]
    fn syntax_error_details() {
        let tests = vec![
            (
                "a = b c ;",
                Expected::Token(TokenKind::Semicolon),
                Found::Token(TokenKind::Identifier),
                1,
                7,
            ),
            (
                "a = b ;\nc = ;",
                Expected::Factor,
                Found::Token(TokenKind::Semicolon),
                2,
                5,
            ),
            (
                "a = 'x'",
                Expected::Token(TokenKind::Semicolon),
                Found::EndOfInput,
                1,
                8,
            ),
            ("a = b , ", Expected::Factor, Found::EndOfInput, 1, 8),
            (
                "a = { b ) ;",
                Expected::Token(TokenKind::RBrace),
                Found::Token(TokenKind::RParen),
                1,
                9,
            ),
            (
                "'a' = b ;",
                Expected::Token(TokenKind::Identifier),
                Found::Token(TokenKind::Literal),
                1,
                1,
            ),
        ];
        for (input, expected, found, line, column) in tests {
            let err = parse_str(input).unwrap_err();
            assert_eq!(
                err,
                SyntaxError {
                    expected,
                    found,
                    line,
                    column
                },
                "input: {:?}",
                input
            );
        }
    }

    fn nested(depth: usize) -> String {
        format!("a = {}'x'{} ;", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn nesting_up_to_limit() {
        let grammar = parse_str(&nested(MAX_NESTING_DEPTH)).unwrap();
        let terminals: Vec<_> = grammar.terminals.iter().map(String::as_str).collect();
        assert_eq!(terminals, vec!["'x'"]);
        assert_eq!(grammar.rules.productions[0].unexploded_first().len(), 1);
        assert!(grammar.rules.to_source().contains("'x'"));

        // Depth counts every bracket kind alike.
        let open: String = "[{(".chars().cycle().take(MAX_NESTING_DEPTH).collect();
        let close: String = "]})".chars().cycle().take(MAX_NESTING_DEPTH).collect();
        let close: String = close.chars().rev().collect();
        assert!(parse_str(&format!("a = {}b{} ;", open, close)).is_ok());
    }

    #[test]
    fn nesting_past_limit() {
        let err = parse_str(&nested(MAX_NESTING_DEPTH + 1)).unwrap_err();
        assert_eq!(
            err,
            SyntaxError {
                expected: Expected::Factor,
                found: Found::TooDeep(TokenKind::LParen),
                line: 1,
                column: 5 + MAX_NESTING_DEPTH,
            }
        );

        // Far past the limit fails the same way instead of overflowing.
        let err = parse_str(&nested(20_000)).unwrap_err();
        assert_eq!(err.found, Found::TooDeep(TokenKind::LParen));
    }

    #[test]
    fn terminals_exclude_rule_names() {
        let grammar = parse_str("a = 'a' , b ; b = 'b' | c , a ;").unwrap();
        let terminals: Vec<_> = grammar.terminals.iter().map(String::as_str).collect();
        assert_eq!(terminals, vec!["'a'", "'b'", "c"]);
    }

    #[test]
    fn terminals_keep_quote_style() {
        let grammar = parse_str("a = 'x' | \"x\" | x ;").unwrap();
        let terminals: Vec<_> = grammar.terminals.iter().map(String::as_str).collect();
        assert_eq!(terminals, vec!["\"x\"", "'x'", "x"]);
    }

    #[test]
    fn rule_used_before_definition_is_not_terminal() {
        let grammar = parse_str("a = later ; later = 'z' ;").unwrap();
        assert!(!grammar.terminals.contains("later"));
        assert!(grammar.terminals.contains("'z'"));
    }
}
