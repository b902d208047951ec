use std::collections::BTreeSet;
use std::fmt::{self, Display};

use crate::lexer::Token;

/// A whole grammar: productions in source order.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Syntax {
    pub productions: Vec<Production>,
}

impl Syntax {
    pub fn iter(&self) -> std::slice::Iter<'_, Production> {
        self.productions.iter()
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Look up a production by name. With duplicate names the last one wins,
    /// matching how FIRST sets are computed.
    pub fn get(&self, name: &str) -> Option<&Production> {
        self.productions.iter().rev().find(|p| p.name() == name)
    }

    /// Every identifier or literal referenced in any production body.
    pub fn referenced_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        for production in &self.productions {
            production.body.collect_names(&mut names);
        }
        names
    }

    /// Parseable EBNF, one production per line.
    pub fn to_source(&self) -> String {
        let mut s = String::new();
        for production in &self.productions {
            s.push_str(&production.to_source());
            s.push('\n');
        }
        s
    }
}

impl Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Syntax {
    type Item = &'a Production;
    type IntoIter = std::slice::Iter<'a, Production>;

    fn into_iter(self) -> Self::IntoIter {
        self.productions.iter()
    }
}

/// A production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Production {
    /// The identifier token on the lhs.
    pub name: Token,
    pub body: Expression,
}

impl Production {
    pub fn name(&self) -> &str {
        &self.name.text
    }

    /// Symbol names that can appear first in this production, without looking
    /// through other rules.
    ///
    /// Only the first factor of each term is consulted, and optional or
    /// repeated factors contribute their contents as if they were required.
    /// Empty derivations are never modeled.
    pub fn unexploded_first(&self) -> BTreeSet<&str> {
        let mut first = BTreeSet::new();
        self.body.collect_first(&mut first);
        first
    }

    /// Renders as `name = ... ;` in the accepted dialect.
    pub fn to_source(&self) -> String {
        format!("{} = {} ;", self.name(), self.body.to_source())
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ::= {};", self.name(), self.body)
    }
}

/// Alternatives, any of which may match.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Expression {
    pub terms: Vec<Term>,
}

impl Expression {
    fn collect_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        for term in &self.terms {
            for factor in &term.factors {
                factor.collect_names(names);
            }
        }
    }

    fn collect_first<'a>(&'a self, first: &mut BTreeSet<&'a str>) {
        for term in &self.terms {
            term.collect_first(first);
        }
    }

    fn to_source(&self) -> String {
        self.terms
            .iter()
            .map(Term::to_source)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

/// Factors that must all match, in order.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Term {
    pub factors: Vec<Factor>,
}

impl Term {
    fn collect_first<'a>(&'a self, first: &mut BTreeSet<&'a str>) {
        // Later factors are never consulted since no factor is treated as
        // able to match nothing.
        if let Some(factor) = self.factors.first() {
            factor.collect_first(first);
        }
    }

    fn to_source(&self) -> String {
        self.factors
            .iter()
            .map(Factor::to_source)
            .collect::<Vec<_>>()
            .join(" , ")
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, factor) in self.factors.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", factor)?;
        }
        Ok(())
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Factor {
    /// A reference to a rule or a bare terminal name.
    Identifier(String),
    /// A quoted string, quotes included.
    Literal(String),
    Optional(Expression),
    Repeated(Expression),
    Grouped(Expression),
}

impl Factor {
    fn collect_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Factor::Identifier(name) | Factor::Literal(name) => {
                names.insert(name);
            }
            Factor::Optional(expr) | Factor::Repeated(expr) | Factor::Grouped(expr) => {
                expr.collect_names(names)
            }
        }
    }

    fn collect_first<'a>(&'a self, first: &mut BTreeSet<&'a str>) {
        match self {
            Factor::Identifier(name) | Factor::Literal(name) => {
                first.insert(name);
            }
            // An optional or repeated factor may match nothing, in which case
            // the next factor would also start the term. That case is not
            // modeled: only the inner expression counts.
            Factor::Optional(expr) | Factor::Repeated(expr) => expr.collect_first(first),
            Factor::Grouped(expr) => expr.collect_first(first),
        }
    }

    fn to_source(&self) -> String {
        match self {
            Factor::Identifier(name) | Factor::Literal(name) => name.clone(),
            Factor::Optional(expr) => format!("[ {} ]", expr.to_source()),
            Factor::Repeated(expr) => format!("{{ {} }}", expr.to_source()),
            Factor::Grouped(expr) => format!("( {} )", expr.to_source()),
        }
    }
}

impl Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Factor::Identifier(name) | Factor::Literal(name) => write!(f, "{}", name),
            Factor::Optional(expr) => write!(f, "[{}]", expr),
            Factor::Repeated(expr) => write!(f, "{{{}}}", expr),
            Factor::Grouped(expr) => write!(f, "({})", expr),
        }
    }
}
