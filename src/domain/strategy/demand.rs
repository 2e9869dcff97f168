//! Demand-driven resolution.
//!
//! Answers "which origins reach this callee" per query by walking flow
//! edges backwards, without materializing the global closure. Behaviorally
//! equivalent to the eager strategy's full mode, but work and memory are
//! proportional to the union of answered queries, and resolution can stop
//! early when only a subset of call sites matters.
//!
//! The traversal is an iterative Tarjan walk over reversed edges. The
//! per-query index/lowlink/stack state breaks cycles; the cross-query memo
//! table is only ever populated with finalized results, at the moment a
//! strongly-connected component completes. Members of a cycle share one
//! result, so no vertex can publish a partial set, and a vertex revisited
//! mid-traversal only tightens lowlinks instead of re-expanding.

use std::rc::Rc;

use petgraph::graph::NodeIndex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::domain::callgraph::CallGraph;
use crate::domain::flowgraph::FlowGraph;

/// Resolve every call site demand-first.
pub fn resolve(fg: &FlowGraph) -> CallGraph {
    let mut resolver = DemandResolver::new(fg);
    CallGraph::assemble(fg, |callee| {
        resolver.origins(callee).iter().copied().collect()
    })
}

pub struct DemandResolver<'a> {
    fg: &'a FlowGraph,
    /// Finalized origin sets, keyed by vertex. Owned by a single
    /// resolution run; never shared across runs.
    cache: FxHashMap<NodeIndex, Rc<FxHashSet<NodeIndex>>>,
}

struct Frame {
    v: NodeIndex,
    preds: Vec<NodeIndex>,
    next: usize,
}

impl<'a> DemandResolver<'a> {
    pub fn new(fg: &'a FlowGraph) -> Self {
        DemandResolver {
            fg,
            cache: FxHashMap::default(),
        }
    }

    /// The set of origin vertices backward-reachable from `root`. Computed
    /// at most once per vertex across the resolver's lifetime.
    pub fn origins(&mut self, root: NodeIndex) -> Rc<FxHashSet<NodeIndex>> {
        if let Some(cached) = self.cache.get(&root) {
            return Rc::clone(cached);
        }
        self.traverse(root);
        Rc::clone(&self.cache[&root])
    }

    fn traverse(&mut self, root: NodeIndex) {
        // Per-query bookkeeping; deliberately separate from `self.cache`.
        let mut index: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut lowlink: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut on_stack: FxHashSet<NodeIndex> = FxHashSet::default();
        let mut scc_stack: Vec<NodeIndex> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut next_index = 0usize;

        index.insert(root, next_index);
        lowlink.insert(root, next_index);
        next_index += 1;
        scc_stack.push(root);
        on_stack.insert(root);
        frames.push(Frame {
            v: root,
            preds: self.fg.preds(root).collect(),
            next: 0,
        });

        while let Some(frame) = frames.last_mut() {
            let v = frame.v;
            if let Some(&p) = frame.preds.get(frame.next) {
                frame.next += 1;
                if self.cache.contains_key(&p) {
                    // Finalized earlier (this query or a previous one):
                    // terminal, reused at component completion.
                    continue;
                }
                if let Some(&pi) = index.get(&p) {
                    if on_stack.contains(&p) {
                        let low = lowlink[&v].min(pi);
                        lowlink.insert(v, low);
                    }
                } else {
                    index.insert(p, next_index);
                    lowlink.insert(p, next_index);
                    next_index += 1;
                    scc_stack.push(p);
                    on_stack.insert(p);
                    frames.push(Frame {
                        v: p,
                        preds: self.fg.preds(p).collect(),
                        next: 0,
                    });
                }
            } else {
                frames.pop();
                if let Some(parent) = frames.last() {
                    let low = lowlink[&parent.v].min(lowlink[&v]);
                    lowlink.insert(parent.v, low);
                }
                if lowlink[&v] == index[&v] {
                    self.finalize_component(v, &mut scc_stack, &mut on_stack);
                }
            }
        }
    }

    /// Pop one completed strongly-connected component and publish its
    /// origin set. Every edge leaving the component points at an already
    /// finalized vertex, so the union below is complete.
    fn finalize_component(
        &mut self,
        root: NodeIndex,
        scc_stack: &mut Vec<NodeIndex>,
        on_stack: &mut FxHashSet<NodeIndex>,
    ) {
        let mut members = Vec::new();
        while let Some(w) = scc_stack.pop() {
            on_stack.remove(&w);
            members.push(w);
            if w == root {
                break;
            }
        }
        let member_set: FxHashSet<NodeIndex> = members.iter().copied().collect();

        let mut set = FxHashSet::default();
        for &m in &members {
            if self.fg.vertex(m).is_origin() {
                set.insert(m);
            }
            for p in self.fg.preds(m) {
                if member_set.contains(&p) {
                    continue;
                }
                if let Some(finalized) = self.cache.get(&p) {
                    set.extend(finalized.iter().copied());
                }
            }
        }

        let shared = Rc::new(set);
        for m in members {
            self.cache.insert(m, Rc::clone(&shared));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vertex::Vertex;

    #[test]
    fn test_backward_search_follows_copy_chains() {
        let mut fg = FlowGraph::new();
        fg.add_edge(Vertex::Func(0), Vertex::Var(0));
        fg.add_edge(Vertex::Var(0), Vertex::Var(1));
        fg.add_edge(Vertex::Var(1), Vertex::Callee(0));

        let cg = resolve(&fg);
        assert_eq!(cg.sites()[0].targets, vec![Vertex::Func(0)]);
    }

    #[test]
    fn test_cycle_members_share_one_finalized_result() {
        let mut fg = FlowGraph::new();
        fg.add_edge(Vertex::Func(0), Vertex::Var(0));
        fg.add_edge(Vertex::Var(0), Vertex::Var(1));
        fg.add_edge(Vertex::Var(1), Vertex::Var(0));
        fg.add_edge(Vertex::Var(1), Vertex::Callee(0));
        let v0 = fg.node(Vertex::Var(0));
        let v1 = fg.node(Vertex::Var(1));

        let mut resolver = DemandResolver::new(&fg);
        let a = resolver.origins(v0);
        let b = resolver.origins(v1);
        assert!(Rc::ptr_eq(&a, &b), "cycle members share one set");
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_repeated_queries_hit_the_memo() {
        let mut fg = FlowGraph::new();
        fg.add_edge(Vertex::Func(0), Vertex::Var(0));
        fg.add_edge(Vertex::Var(0), Vertex::Callee(0));
        let callee = fg.node(Vertex::Callee(0));

        let mut resolver = DemandResolver::new(&fg);
        let first = resolver.origins(callee);
        let second = resolver.origins(callee);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_self_loop_terminates() {
        let mut fg = FlowGraph::new();
        fg.add_edge(Vertex::Var(0), Vertex::Var(0));
        fg.add_edge(Vertex::Func(0), Vertex::Var(0));
        fg.add_edge(Vertex::Var(0), Vertex::Callee(0));

        let cg = resolve(&fg);
        assert_eq!(cg.sites()[0].targets, vec![Vertex::Func(0)]);
    }

    #[test]
    fn test_diamond_paths_deduplicate() {
        let mut fg = FlowGraph::new();
        fg.add_edge(Vertex::Func(0), Vertex::Var(0));
        fg.add_edge(Vertex::Func(0), Vertex::Var(1));
        fg.add_edge(Vertex::Var(0), Vertex::Callee(0));
        fg.add_edge(Vertex::Var(1), Vertex::Callee(0));

        let cg = resolve(&fg);
        assert_eq!(cg.sites()[0].targets, vec![Vertex::Func(0)]);
    }
}
