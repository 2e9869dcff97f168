//! Call graph JSON exporter.
//!
//! Serializes the call graph as one JSON object mapping each call site's
//! position to the list of target labels it may invoke. Keys are sorted,
//! so repeated runs produce byte-identical output.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::ast::BoundProgram;
use crate::domain::callgraph::CallGraph;

/// JSON shape of the call graph: `{ "file@line:col": [target, ...] }`.
#[derive(Debug, Serialize)]
pub struct CallGraphDto(pub BTreeMap<String, Vec<String>>);

impl CallGraphDto {
    pub fn from_call_graph(cg: &CallGraph, prog: &BoundProgram) -> Self {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        cg.for_each_edge(|call, target| {
            let targets = map.entry(call.target_label(prog)).or_default();
            let label = target.target_label(prog);
            if !targets.contains(&label) {
                targets.push(label);
            }
        });
        CallGraphDto(map)
    }
}

pub struct JsonExporter;

impl JsonExporter {
    pub fn to_pretty_string(cg: &CallGraph, prog: &BoundProgram) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&CallGraphDto::from_call_graph(cg, prog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{bindings, flow_builder, strategy};
    use crate::infrastructure::parser::TreeSitterParser;
    use crate::ports::SourceParser;

    #[test]
    fn test_json_shape_with_deduplicated_targets() {
        let module = TreeSitterParser
            .parse("test.js", "function f() {}\nf();\nf();")
            .unwrap();
        let prog = bindings::bind(vec![module]);
        let fg = flow_builder::build_flow_graph(&prog).unwrap();
        let cg = strategy::resolve(&fg, strategy::Strategy::Oneshot);

        let dto = CallGraphDto::from_call_graph(&cg, &prog);
        assert_eq!(dto.0.len(), 2, "two call sites, one key each");
        for targets in dto.0.values() {
            assert_eq!(targets, &vec!["test.js@1:1".to_string()]);
        }

        let json = JsonExporter::to_pretty_string(&cg, &prog).unwrap();
        assert!(json.contains("\"test.js@2:1\""));
        assert!(json.contains("\"test.js@1:1\""));
    }
}
