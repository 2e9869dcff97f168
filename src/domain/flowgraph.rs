//! FlowGraph data structure.
//!
//! A directed graph of approximate data-flow edges between value-producing
//! and value-consuming positions. Vertices are interned so structurally
//! equal identities share one node; node indices are dense, which lets the
//! resolution strategies keep per-vertex state in flat vectors. Cycles are
//! expected and legal (recursion, mutual closures).

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashMap;

use crate::domain::ast::CallId;
use crate::domain::vertex::Vertex;

#[derive(Debug, Default)]
pub struct FlowGraph {
    graph: DiGraph<Vertex, ()>,
    intern: FxHashMap<Vertex, NodeIndex>,
    /// Node index of every `Callee` vertex, indexed by call id.
    callees: Vec<NodeIndex>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a vertex, creating its node on first sight.
    pub fn node(&mut self, vertex: Vertex) -> NodeIndex {
        if let Some(&ix) = self.intern.get(&vertex) {
            return ix;
        }
        let ix = self.graph.add_node(vertex.clone());
        if let Vertex::Callee(cid) = vertex {
            self.register_callee(cid, ix);
        }
        self.intern.insert(vertex, ix);
        ix
    }

    fn register_callee(&mut self, cid: CallId, ix: NodeIndex) {
        if self.callees.len() <= cid {
            self.callees.resize(cid + 1, NodeIndex::end());
        }
        self.callees[cid] = ix;
    }

    /// Insert a flow edge; parallel duplicates collapse to one edge.
    pub fn add_edge(&mut self, from: Vertex, to: Vertex) {
        let a = self.node(from);
        let b = self.node(to);
        self.graph.update_edge(a, b, ());
    }

    pub fn vertex(&self, ix: NodeIndex) -> &Vertex {
        &self.graph[ix]
    }

    /// `Callee` vertices in call-site creation order.
    pub fn callees(&self) -> &[NodeIndex] {
        &self.callees
    }

    pub fn preds(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(ix, Direction::Incoming)
    }

    pub fn succs(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(ix, Direction::Outgoing)
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Edges in insertion order; the order is stable within a run, which
    /// keeps the rendered output deterministic.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.graph.edge_references().map(|e| (e.source(), e.target()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_collapses_equal_vertices() {
        let mut fg = FlowGraph::new();
        let a = fg.node(Vertex::Native("foo".to_string()));
        let b = fg.node(Vertex::Native("foo".to_string()));
        assert_eq!(a, b);
        assert_eq!(fg.node_count(), 1);

        let c = fg.node(Vertex::Prop("foo".to_string()));
        assert_ne!(a, c, "same display name, different variant");
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut fg = FlowGraph::new();
        fg.add_edge(Vertex::Func(0), Vertex::Var(0));
        fg.add_edge(Vertex::Func(0), Vertex::Var(0));
        assert_eq!(fg.edge_count(), 1);
    }

    #[test]
    fn test_callee_registration_in_call_order() {
        let mut fg = FlowGraph::new();
        let c1 = fg.node(Vertex::Callee(1));
        let c0 = fg.node(Vertex::Callee(0));
        assert_eq!(fg.callees(), &[c0, c1]);
    }

    #[test]
    fn test_cycles_are_representable() {
        let mut fg = FlowGraph::new();
        fg.add_edge(Vertex::Var(0), Vertex::Var(1));
        fg.add_edge(Vertex::Var(1), Vertex::Var(0));
        assert_eq!(fg.edge_count(), 2);
    }
}
