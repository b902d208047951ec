//! FIRST-set resolution with left recursion and FIRST/FIRST conflict checks.
//!
//! Each production first yields its unexploded FIRST set: the symbol names
//! that can start it, without looking into other rules. Resolution then
//! expands every nonterminal in that set until only terminals remain,
//! tracking the rules visited on the current path to catch cycles.
//!
//! Optional and repeated factors are never treated as matching nothing, so
//! `a = [ 'x' ] , 'y' ;` resolves to `{'x'}` only.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::ast::Syntax;
use crate::error::FirstError;

/// Marker standing in for a rule that was deliberately left unexpanded.
pub const SKIPPED: &str = "([SKIPPED])";

/// Nesting limit for rule resolution. The visited path already prevents
/// infinite recursion; this bounds the stack on very deep acyclic grammars.
pub const MAX_RESOLUTION_DEPTH: usize = 256;

/// One member of a FIRST set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FirstEntry<'a> {
    /// A skipped rule was reached, the real terminals are unknown.
    Skipped,
    Terminal {
        name: &'a str,
        /// The symbol the top-level rule expanded into on the way here.
        root: &'a str,
    },
}

impl<'a> Display for FirstEntry<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FirstEntry::Skipped => f.write_str(SKIPPED),
            FirstEntry::Terminal { name, root } => write!(f, "{} -> {}", name, root),
        }
    }
}

/// The terminals that can begin one rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    /// Terminal name to root symbol.
    terminals: BTreeMap<String, String>,
    skipped: bool,
}

impl FirstSet {
    fn skipped() -> Self {
        FirstSet {
            terminals: BTreeMap::new(),
            skipped: true,
        }
    }

    fn terminal(name: &str, root: &str) -> Self {
        let mut terminals = BTreeMap::new();
        terminals.insert(name.to_owned(), root.to_owned());
        FirstSet {
            terminals,
            skipped: false,
        }
    }

    pub fn contains(&self, terminal: &str) -> bool {
        self.terminals.contains_key(terminal)
    }

    pub fn root_of(&self, terminal: &str) -> Option<&str> {
        self.terminals.get(terminal).map(String::as_str)
    }

    /// Terminal names in sorted order, without the skipped marker.
    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.terminals.keys().map(String::as_str)
    }

    /// Whether resolution stopped at a skipped rule somewhere.
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// All entries, the skipped marker first if present.
    pub fn entries(&self) -> impl Iterator<Item = FirstEntry<'_>> {
        let skipped = if self.skipped {
            Some(FirstEntry::Skipped)
        } else {
            None
        };
        skipped.into_iter().chain(
            self.terminals
                .iter()
                .map(|(name, root)| FirstEntry::Terminal {
                    name: name.as_str(),
                    root: root.as_str(),
                }),
        )
    }

    pub fn len(&self) -> usize {
        self.terminals.len() + usize::from(self.skipped)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a sibling alternative's set. Shared terminals mean `rule` cannot
    /// pick an alternative from one token. The skipped marker never counts
    /// as shared.
    fn merge(&mut self, other: FirstSet, rule: &str) -> Result<(), FirstError> {
        if let Some(shared) = other.terminals().find(|t| self.contains(t)) {
            debug!("'{}' reaches {} through more than one alternative", rule, shared);
            return Err(FirstError::FirstFirstConflict(rule.to_owned()));
        }
        self.terminals.extend(other.terminals);
        self.skipped |= other.skipped;
        Ok(())
    }
}

impl Display for FirstSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("{")?;
        for (i, entry) in self.entries().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match entry {
                FirstEntry::Skipped => f.write_str(SKIPPED)?,
                FirstEntry::Terminal { name, .. } => f.write_str(name)?,
            }
        }
        f.write_str("}")
    }
}

/// FIRST sets of every rule, in grammar order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSets {
    first: IndexMap<String, FirstSet>,
    skipped_rules: BTreeSet<String>,
}

impl FirstSets {
    pub fn get(&self, rule: &str) -> Option<&FirstSet> {
        self.first.get(rule)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FirstSet> {
        self.first.iter()
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// Rules whose FIRST set reached a skipped rule. These need a hand
    /// written parsing routine instead of a table lookup.
    pub fn skipped_rules(&self) -> &BTreeSet<String> {
        &self.skipped_rules
    }

    pub fn is_skipped(&self, rule: &str) -> bool {
        self.skipped_rules.contains(rule)
    }
}

impl<'a> IntoIterator for &'a FirstSets {
    type Item = (&'a String, &'a FirstSet);
    type IntoIter = indexmap::map::Iter<'a, String, FirstSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.first.iter()
    }
}

impl Display for FirstSets {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (rule, set) in &self.first {
            writeln!(f, "{}:", rule)?;
            for entry in set.entries() {
                writeln!(f, "\t{}", entry)?;
            }
        }
        Ok(())
    }
}

/// Compute the FIRST set of every rule.
///
/// Rules named in `skip` are not expanded wherever they are reached; they
/// contribute the skipped marker instead and the rules that reach them are
/// reported in [`FirstSets::skipped_rules`]. The first error aborts the
/// whole computation.
///
/// When a rule name is defined twice the later definition is used.
pub fn compute_first_sets(
    rules: &Syntax,
    terminals: &BTreeSet<String>,
    skip: &BTreeSet<String>,
) -> Result<FirstSets, FirstError> {
    let mut unexploded = IndexMap::new();
    for production in rules {
        unexploded.insert(production.name(), production.unexploded_first());
    }

    let resolver = Resolver {
        unexploded: &unexploded,
        terminals,
        skip,
    };

    let mut sets = FirstSets::default();
    for &rule in unexploded.keys() {
        debug!("resolving FIRST of rule '{}'", rule);
        let set = if skip.contains(rule) {
            FirstSet::skipped()
        } else {
            resolver.resolve(rule, BTreeSet::new(), None, 0)?
        };
        if set.is_skipped() {
            sets.skipped_rules.insert(rule.to_owned());
        }
        sets.first.insert(rule.to_owned(), set);
    }

    Ok(sets)
}

struct Resolver<'a> {
    unexploded: &'a IndexMap<&'a str, BTreeSet<&'a str>>,
    terminals: &'a BTreeSet<String>,
    skip: &'a BTreeSet<String>,
}

impl<'a> Resolver<'a> {
    /// Resolve `symbol` to terminals.
    ///
    /// `path` holds the rules visited on the way down and is owned so that
    /// every sibling alternative explores with its own copy.
    fn resolve(
        &self,
        symbol: &'a str,
        mut path: BTreeSet<&'a str>,
        root: Option<&'a str>,
        depth: usize,
    ) -> Result<FirstSet, FirstError> {
        if path.contains(symbol) {
            return Err(FirstError::LeftRecursion(symbol.to_owned()));
        }
        if depth > MAX_RESOLUTION_DEPTH {
            return Err(FirstError::DepthLimit(symbol.to_owned()));
        }
        path.insert(symbol);

        let firsts = match self.unexploded.get(symbol) {
            Some(firsts) if !self.terminals.contains(symbol) => firsts,
            _ => {
                if !self.terminals.contains(symbol) {
                    warn!("'{}' is neither a rule nor a known terminal", symbol);
                }
                let root = root.unwrap_or(symbol);
                trace!("{} -> {}", root, symbol);
                return Ok(FirstSet::terminal(symbol, root));
            }
        };

        let mut result = FirstSet::default();
        for &first in firsts {
            if self.skip.contains(first) {
                trace!("'{}' reaches skipped rule '{}'", symbol, first);
                result.skipped = true;
                continue;
            }
            let branch_root = Some(root.unwrap_or(first));
            let resolved = self.resolve(first, path.clone(), branch_root, depth + 1)?;
            result.merge(resolved, symbol)?;
        }
        Ok(result)
    }
}
