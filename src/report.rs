//! Human readable printing and the JSON report.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::Serialize;

use ebnf::{FirstEntry, FirstError, FirstSets, Grammar, SKIPPED};

/// Everything written with `--output`. Keys are present only for the
/// operations that ran; a failed FIRST computation is `null`.
#[derive(Debug, Default, Serialize)]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<Option<FirstReport>>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct FirstReport {
    /// Rule to `[terminal, root]` pairs. The skipped marker has no root.
    first_set: IndexMap<String, Vec<(String, Option<String>)>>,
    first_set_skipped: Vec<String>,
}

impl From<&FirstSets> for FirstReport {
    fn from(sets: &FirstSets) -> Self {
        let first_set: IndexMap<_, _> = sets
            .iter()
            .map(|(rule, set)| {
                let entries: Vec<_> = set
                    .entries()
                    .map(|entry| match entry {
                        FirstEntry::Skipped => (SKIPPED.to_owned(), None),
                        FirstEntry::Terminal { name, root } => {
                            (name.to_owned(), Some(root.to_owned()))
                        }
                    })
                    .collect();
                (rule.clone(), entries)
            })
            .collect();
        FirstReport {
            first_set,
            first_set_skipped: sets.skipped_rules().iter().cloned().collect(),
        }
    }
}

pub fn print_info(grammar: &Grammar) {
    println!("EBNF has {} rules:", grammar.rules.len());
    for production in &grammar.rules {
        println!("\t{}", production);
    }
    println!();

    let terminals: Vec<&str> = grammar.terminals.iter().map(String::as_str).collect();
    println!("EBNF has {} terminals:", terminals.len());
    println!("\t{}", terminals.join(", "));
    println!();
}

/// Print FIRST sets and return their report. On failure the diagnostic goes
/// to stderr and the error is handed back.
pub fn print_first_sets(
    grammar: &Grammar,
    skip: &BTreeSet<String>,
) -> Result<FirstReport, FirstError> {
    println!("FIRST set:");
    let sets = grammar.first_sets(skip).map_err(|err| {
        eprintln!("\t{}", failure_message(&err));
        err
    })?;

    for (rule, set) in &sets {
        println!("\t{}:", rule);
        for entry in set.entries() {
            println!("\t\t{}", entry);
        }
    }
    println!();

    if !skip.is_empty() {
        println!("Manual parsing is required due to skippiness:");
        for rule in sets.skipped_rules() {
            println!("\t{}", rule);
        }
    }

    Ok(FirstReport::from(&sets))
}

fn failure_message(err: &FirstError) -> String {
    match err {
        FirstError::LeftRecursion(rule) => {
            format!("Failed to compute FIRST due to left recursion of '{}'", rule)
        }
        FirstError::FirstFirstConflict(rule) => {
            format!("Failed to compute FIRST due to FIRST/FIRST of '{}'", rule)
        }
        FirstError::DepthLimit(rule) => {
            format!("Failed to compute FIRST due to nesting depth of '{}'", rule)
        }
    }
}

/// Pretty printed with four space indentation.
pub fn to_json(output: &Output) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    output
        .serialize(&mut ser)
        .context("failed to serialize report")?;
    Ok(String::from_utf8(buf)?)
}

pub fn write_json(output: &Output, path: &Path) -> anyhow::Result<()> {
    let json = to_json(output)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
