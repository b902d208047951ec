//! Command line front end for the EBNF FIRST-set analyzer.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::debug;

use ebnf::{FirstError, Grammar};

mod report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Operation {
    /// Print the rules and terminals.
    Info,
    /// Compute and print FIRST sets.
    First,
    /// Print the AST as a Graphviz digraph.
    Graphviz,
}

#[derive(Debug, Parser)]
#[command(version, about = "Process an EBNF source file.")]
struct Args {
    /// The path to the EBNF source file.
    file_path: PathBuf,

    /// Operations to run, in order.
    #[arg(short = 'p', long = "operation", value_enum, num_args = 1.., required = true)]
    operations: Vec<Operation>,

    /// Rules to leave unexpanded when computing FIRST sets.
    #[arg(long, num_args = 0..)]
    skip: Vec<String>,

    /// Write the JSON report to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.file_path)
        .with_context(|| format!("failed to read {}", args.file_path.display()))?;
    let grammar: Grammar = text
        .parse()
        .with_context(|| format!("invalid grammar in {}", args.file_path.display()))?;

    let skip: BTreeSet<String> = args.skip.into_iter().collect();
    let run = run_operations(&grammar, &args.operations, &skip);

    if let Some(path) = &args.output {
        report::write_json(&run.output, path)?;
    }
    if run.failure.is_some() {
        process::exit(1);
    }
    Ok(())
}

/// Outcome of running the requested operations on one grammar.
#[derive(Debug)]
struct Run {
    output: report::Output,
    /// Operations that ran, including a failing one.
    completed: Vec<Operation>,
    failure: Option<FirstError>,
}

/// Run operations in order. A failed FIRST computation stops the run, later
/// operations are not started.
fn run_operations(grammar: &Grammar, operations: &[Operation], skip: &BTreeSet<String>) -> Run {
    let mut run = Run {
        output: report::Output::default(),
        completed: Vec::new(),
        failure: None,
    };
    for &op in operations {
        debug!("running {:?}", op);
        run.completed.push(op);
        match op {
            Operation::Info => report::print_info(grammar),
            Operation::First => match report::print_first_sets(grammar, skip) {
                Ok(first) => run.output.first = Some(Some(first)),
                Err(err) => {
                    run.output.first = Some(None);
                    run.failure = Some(err);
                    break;
                }
            },
            Operation::Graphviz => print!("{}", grammar.rules.to_graphviz()),
        }
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(input: &str, operations: &[Operation]) -> Run {
        let grammar: Grammar = input.parse().unwrap();
        run_operations(&grammar, operations, &BTreeSet::new())
    }

    #[test]
    fn runs_every_operation_in_order() {
        let ops = [Operation::Graphviz, Operation::First, Operation::Info];
        let run = run("a = 'x' ;", &ops);
        assert_eq!(run.completed, ops.to_vec());
        assert!(run.failure.is_none());
        assert!(matches!(run.output.first, Some(Some(_))));
    }

    #[test]
    fn failed_first_stops_later_operations() {
        let run = run(
            "A = B ; B = A ;",
            &[Operation::Info, Operation::First, Operation::Info, Operation::Graphviz],
        );
        assert_eq!(run.completed, vec![Operation::Info, Operation::First]);
        assert_eq!(run.failure, Some(FirstError::LeftRecursion("A".to_owned())));
        assert!(matches!(run.output.first, Some(None)));
        assert_eq!(report::to_json(&run.output).unwrap(), "{\n    \"first\": null\n}");
    }

    #[test]
    fn parses_operation_list() {
        let args = Args::try_parse_from([
            "ebnf-first",
            "g.ebnf",
            "-p",
            "first",
            "info",
            "--skip",
            "a",
            "b",
            "-o",
            "out.json",
        ])
        .unwrap();
        assert_eq!(args.operations, vec![Operation::First, Operation::Info]);
        assert_eq!(args.skip, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));

        assert!(Args::try_parse_from(["ebnf-first", "g.ebnf"]).is_err());
    }
}
