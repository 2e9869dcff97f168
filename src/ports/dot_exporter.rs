//! Flow graph DOT exporter.
//!
//! Renders the flow graph as a Graphviz digraph, one statement per flow
//! edge; nodes are implicit in the edge statements. The edge order follows
//! insertion order, so output is stable within a run.

use crate::domain::ast::BoundProgram;
use crate::domain::flowgraph::FlowGraph;

pub struct DotExporter;

impl DotExporter {
    /// Export a flow graph to a DOT file.
    pub fn export(fg: &FlowGraph, prog: &BoundProgram, path: &str) -> std::io::Result<()> {
        std::fs::write(path, Self::to_dot(fg, prog))
    }

    /// Convert a flow graph to a DOT string.
    pub fn to_dot(fg: &FlowGraph, prog: &BoundProgram) -> String {
        let mut lines = Vec::with_capacity(fg.edge_count() + 2);
        lines.push("digraph FlowGraph {".to_string());
        for (src, dst) in fg.edges() {
            lines.push(format!(
                "    \"{}\" -> \"{}\";",
                Self::escape_label(&fg.vertex(src).label(prog)),
                Self::escape_label(&fg.vertex(dst).label(prog)),
            ));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bindings;
    use crate::infrastructure::parser::TreeSitterParser;
    use crate::domain::flow_builder::build_flow_graph;
    use crate::ports::SourceParser;

    #[test]
    fn test_to_dot() {
        let module = TreeSitterParser
            .parse("test.js", "function f() {}\nf();")
            .unwrap();
        let prog = bindings::bind(vec![module]);
        let fg = build_flow_graph(&prog).unwrap();

        let dot = DotExporter::to_dot(&fg, &prog);
        assert!(dot.starts_with("digraph FlowGraph {"));
        assert!(dot.ends_with("}"));
        assert!(dot.contains("\"Fn(test.js@1:1)\" -> \"Glob(f)\";"));
        assert!(dot.contains("\"Glob(f)\" -> \"Callee(test.js@2:1)\";"));
    }

    #[test]
    fn test_labels_are_escaped() {
        assert_eq!(DotExporter::escape_label("a\"b"), "a\\\"b");
    }
}
