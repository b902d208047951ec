//! DOT rendering of the grammar AST.

use crate::ast::{Expression, Factor, Syntax};

impl Syntax {
    /// Render the AST as a Graphviz `digraph`, nodes numbered in pre-order.
    pub fn to_graphviz(&self) -> String {
        let mut dot = DotWriter::default();
        let root = dot.node("Syntax", None);
        for production in &self.productions {
            let id = dot.node(&format!("Production: {}", production.name()), Some(root));
            dot.expression(&production.body, id);
        }
        dot.finish()
    }
}

#[derive(Default)]
struct DotWriter {
    lines: Vec<String>,
    next_id: usize,
}

impl DotWriter {
    fn node(&mut self, label: &str, parent: Option<usize>) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.lines
            .push(format!("  node{} [label=\"{}\"];", id, escape(label)));
        if let Some(parent) = parent {
            self.lines.push(format!("  node{} -> node{};", parent, id));
        }
        id
    }

    fn expression(&mut self, expr: &Expression, parent: usize) {
        let id = self.node("Expression", Some(parent));
        for term in &expr.terms {
            let term_id = self.node("Term", Some(id));
            for factor in &term.factors {
                self.factor(factor, term_id);
            }
        }
    }

    fn factor(&mut self, factor: &Factor, parent: usize) {
        match factor {
            Factor::Identifier(name) => {
                self.node(&format!("Identifier: {}", name), Some(parent));
            }
            Factor::Literal(text) => {
                self.node(&format!("Literal: {}", text), Some(parent));
            }
            Factor::Optional(expr) => {
                let id = self.node("Optional", Some(parent));
                self.expression(expr, id);
            }
            Factor::Repeated(expr) => {
                let id = self.node("Repeated", Some(parent));
                self.expression(expr, id);
            }
            Factor::Grouped(expr) => {
                let id = self.node("Grouped", Some(parent));
                self.expression(expr, id);
            }
        }
    }

    fn finish(self) -> String {
        let mut out = String::from("digraph AST {\n  node [shape=box];\n");
        for line in self.lines {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

fn escape(label: &str) -> String {
    let mut s = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '"' | '\\' => {
                s.push('\\');
                s.push(c);
            }
            _ => s.push(c),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use crate::Grammar;
    use pretty_assertions::assert_eq;

    #[test]
    fn graphviz_of_small_grammar() {
        let grammar: Grammar = "a = [ b ] , \"q\" ;".parse().unwrap();
        let expected = r#"digraph AST {
  node [shape=box];
  node0 [label="Syntax"];
  node1 [label="Production: a"];
  node0 -> node1;
  node2 [label="Expression"];
  node1 -> node2;
  node3 [label="Term"];
  node2 -> node3;
  node4 [label="Optional"];
  node3 -> node4;
  node5 [label="Expression"];
  node4 -> node5;
  node6 [label="Term"];
  node5 -> node6;
  node7 [label="Identifier: b"];
  node6 -> node7;
  node8 [label="Literal: \"q\""];
  node3 -> node8;
}
"#;
        assert_eq!(grammar.rules.to_graphviz(), expected);
    }

    #[test]
    fn graphviz_of_empty_grammar() {
        let grammar: Grammar = "(* nothing *)".parse().unwrap();
        assert_eq!(
            grammar.rules.to_graphviz(),
            "digraph AST {\n  node [shape=box];\n  node0 [label=\"Syntax\"];\n}\n"
        );
    }
}
