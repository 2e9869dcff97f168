// Call graph structures for Mr. Magpie.
// The derived relation from call sites to the functions/natives they may
// invoke, deduplicated and immutable once assembled.

use petgraph::graph::NodeIndex;

use crate::domain::ast::BoundProgram;
use crate::domain::flowgraph::FlowGraph;
use crate::domain::vertex::Vertex;

/// One call site and its resolved targets.
#[derive(Debug)]
pub struct CallSite {
    pub callee: Vertex,
    /// Distinct targets, in vertex creation order.
    pub targets: Vec<Vertex>,
}

#[derive(Debug)]
pub struct CallGraph {
    sites: Vec<CallSite>,
}

impl CallGraph {
    /// Materialize the per-callee origin sets produced by a resolution
    /// strategy. Call sites appear in creation order and targets are sorted
    /// by vertex creation order and deduplicated, so repeated runs on
    /// identical input yield identical edge sequences.
    pub fn assemble<F>(fg: &FlowGraph, mut origins: F) -> CallGraph
    where
        F: FnMut(NodeIndex) -> Vec<NodeIndex>,
    {
        let mut sites = Vec::with_capacity(fg.callees().len());
        for &callee_ix in fg.callees() {
            let mut targets = origins(callee_ix);
            targets.sort_unstable();
            targets.dedup();
            sites.push(CallSite {
                callee: fg.vertex(callee_ix).clone(),
                targets: targets.into_iter().map(|ix| fg.vertex(ix).clone()).collect(),
            });
        }
        CallGraph { sites }
    }

    pub fn sites(&self) -> &[CallSite] {
        &self.sites
    }

    /// Visit every distinct (call site, target) pair exactly once, in the
    /// stable assembly order.
    pub fn for_each_edge<F>(&self, mut visit: F)
    where
        F: FnMut(&Vertex, &Vertex),
    {
        for site in &self.sites {
            for target in &site.targets {
                visit(&site.callee, target);
            }
        }
    }

    pub fn edge_count(&self) -> usize {
        self.sites.iter().map(|s| s.targets.len()).sum()
    }

    /// Flattened `(call label, target label)` pairs, in visit order.
    pub fn labeled_edges(&self, prog: &BoundProgram) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.edge_count());
        self.for_each_edge(|call, target| {
            out.push((call.target_label(prog), target.target_label(prog)));
        });
        out
    }
}
