//! Eager (global-closure) resolution.
//!
//! Computes, for every callee vertex, the set of function/native vertices
//! that reach it along any directed path of flow edges, as the least
//! fixpoint of worklist-based origin-set propagation. Flow-insensitive and
//! context-insensitive: an edge, once present, is always considered
//! possible, and a function body is shared by all of its call sites. The
//! candidate space is finite and every step grows a monotone set, so the
//! fixpoint is reached in finite time even on cyclic graphs.

use std::collections::VecDeque;

use petgraph::graph::NodeIndex;
use rustc_hash::FxHashSet;

use crate::domain::callgraph::CallGraph;
use crate::domain::flowgraph::FlowGraph;

/// Resolve every call site. With `interprocedural` unset, the closure step
/// is skipped entirely and only function values syntactically observable at
/// the callee position are reported (a fast, deliberately incomplete
/// baseline).
pub fn resolve(fg: &FlowGraph, interprocedural: bool) -> CallGraph {
    if interprocedural {
        closure(fg)
    } else {
        direct_only(fg)
    }
}

fn closure(fg: &FlowGraph) -> CallGraph {
    let n = fg.node_count();
    let mut reach: Vec<FxHashSet<NodeIndex>> = vec![FxHashSet::default(); n];
    let mut queued = vec![false; n];
    let mut work = VecDeque::new();

    // Seed: every origin reaches itself.
    for ix in fg.node_indices() {
        if fg.vertex(ix).is_origin() {
            reach[ix.index()].insert(ix);
            queued[ix.index()] = true;
            work.push_back(ix);
        }
    }

    // Propagate origin sets forward along flow edges until nothing grows.
    while let Some(v) = work.pop_front() {
        queued[v.index()] = false;
        let outgoing = reach[v.index()].clone();
        for succ in fg.succs(v) {
            let set = &mut reach[succ.index()];
            let before = set.len();
            set.extend(outgoing.iter().copied());
            if set.len() > before && !queued[succ.index()] {
                queued[succ.index()] = true;
                work.push_back(succ);
            }
        }
    }

    CallGraph::assemble(fg, |callee| reach[callee.index()].iter().copied().collect())
}

/// Zero-propagation baseline: origins feeding the callee slot directly, or
/// feeding the callee expression's own value vertex (the one administrative
/// hop that exists for every call). Copies through further slots are
/// propagation and are not followed.
fn direct_only(fg: &FlowGraph) -> CallGraph {
    CallGraph::assemble(fg, |callee| {
        let mut out = Vec::new();
        for pred in fg.preds(callee) {
            if fg.vertex(pred).is_origin() {
                out.push(pred);
            } else {
                for pred2 in fg.preds(pred) {
                    if fg.vertex(pred2).is_origin() {
                        out.push(pred2);
                    }
                }
            }
        }
        out
    })
}
