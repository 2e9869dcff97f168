//! Flow graph construction.
//!
//! One structural pass over the bound program; no fixpoint iteration, so
//! termination follows from the input's finite size. The produced edges are
//! the full flow-edge vocabulary of the analysis: assignment/copy,
//! argument→parameter and return→result for one-shot closures, property
//! store/load (field-based, keyed by property name), and function-value
//! origination. A function expression's value vertex is its `Func` vertex
//! directly, so the generic assignment/argument/return plumbing yields the
//! origination edges for every syntactic slot the function is observable in.

use crate::common::AnalysisError;
use crate::domain::ast::{BindingRef, BoundProgram, Expr, FuncExpr, FuncId, Stmt};
use crate::domain::flowgraph::FlowGraph;
use crate::domain::vertex::Vertex;

/// Build the flow graph for a bound program. Emits no diagnostics; an
/// unresolved reference is an invariant violation of the upstream binder
/// and aborts the run.
pub fn build_flow_graph(prog: &BoundProgram) -> Result<FlowGraph, AnalysisError> {
    let mut builder = Builder {
        fg: FlowGraph::new(),
        prog,
    };

    // Every function definition and every call site owns exactly one
    // vertex, even if no flow edge ever touches it.
    for fid in 0..prog.funcs.len() {
        builder.fg.node(Vertex::Func(fid));
    }
    for cid in 0..prog.calls.len() {
        builder.fg.node(Vertex::Callee(cid));
    }

    for module in &prog.modules {
        let fid = module
            .fid
            .ok_or_else(|| AnalysisError::Invariant(format!("unnumbered module {}", module.file)))?;
        builder.walk_stmts(&module.body, fid)?;
    }
    Ok(builder.fg)
}

struct Builder<'a> {
    fg: FlowGraph,
    prog: &'a BoundProgram,
}

impl Builder<'_> {
    fn walk_stmts(&mut self, stmts: &[Stmt], func: FuncId) -> Result<(), AnalysisError> {
        for stmt in stmts {
            match stmt {
                Stmt::Expr(e) => {
                    self.eval(e)?;
                }
                Stmt::VarDecl { name, pos, init, var } => {
                    let Some(init) = init else { continue };
                    let src = self.eval(init)?;
                    if let Some(src) = src {
                        let vid = var.ok_or_else(|| {
                            AnalysisError::Invariant(format!("unbound declaration '{name}' at {pos}"))
                        })?;
                        self.fg.add_edge(src, Vertex::Var(vid));
                    }
                }
                Stmt::FuncDecl { func: f, var } => {
                    let fid = self.func_id(f)?;
                    if let Some(vid) = var {
                        self.fg.add_edge(Vertex::Func(fid), Vertex::Var(*vid));
                    }
                    self.walk_function(f)?;
                }
                Stmt::Return { arg, .. } => {
                    if let Some(arg) = arg {
                        if let Some(src) = self.eval(arg)? {
                            self.fg.add_edge(src, Vertex::Ret(func));
                        }
                    }
                }
                Stmt::Block(inner) => self.walk_stmts(inner, func)?,
            }
        }
        Ok(())
    }

    fn walk_function(&mut self, f: &FuncExpr) -> Result<(), AnalysisError> {
        let fid = self.func_id(f)?;
        if let Some(self_var) = f.self_var {
            self.fg.add_edge(Vertex::Func(fid), Vertex::Var(self_var));
        }
        self.walk_stmts(&f.body, fid)
    }

    fn func_id(&self, f: &FuncExpr) -> Result<FuncId, AnalysisError> {
        f.fid
            .ok_or_else(|| AnalysisError::Invariant(format!("unnumbered function at {}", f.pos)))
    }

    /// Evaluate an expression for its flow effects, returning the vertex
    /// that holds the expression's value, if it can hold a function value.
    fn eval(&mut self, expr: &Expr) -> Result<Option<Vertex>, AnalysisError> {
        match expr {
            Expr::Ident { name, pos, binding } => match binding {
                Some(BindingRef::Var(vid)) => Ok(Some(Vertex::Var(*vid))),
                Some(BindingRef::Native(name)) => Ok(Some(Vertex::Native(name.clone()))),
                None => Err(AnalysisError::UnboundReference {
                    name: name.clone(),
                    pos: pos.to_string(),
                }),
            },
            Expr::Function(f) => {
                self.walk_function(f)?;
                Ok(Some(Vertex::Func(self.func_id(f)?)))
            }
            Expr::Call(call) => {
                let cid = call.cid.ok_or_else(|| {
                    AnalysisError::Invariant(format!("unnumbered call at {}", call.pos))
                })?;
                if let Some(callee) = self.eval(&call.callee)? {
                    self.fg.add_edge(callee, Vertex::Callee(cid));
                }
                let mut arg_values = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    arg_values.push(self.eval(arg)?);
                }
                // One-shot closure: the callee is syntactically a function
                // expression, so its parameter and return slots can be wired
                // up without knowing any resolution results.
                if let Expr::Function(f) = &call.callee {
                    let fid = self.func_id(f)?;
                    let params = &self.prog.funcs[fid].params;
                    for (arg, &param) in arg_values.iter().zip(params.iter()) {
                        if let Some(arg) = arg {
                            self.fg.add_edge(arg.clone(), Vertex::Var(param));
                        }
                    }
                    self.fg.add_edge(Vertex::Ret(fid), Vertex::Res(cid));
                }
                Ok(Some(Vertex::Res(cid)))
            }
            Expr::Assign { target, value } => {
                let src = self.eval(value)?;
                let dst = self.lvalue(target)?;
                if let (Some(src), Some(dst)) = (&src, dst) {
                    self.fg.add_edge(src.clone(), dst);
                }
                Ok(src)
            }
            Expr::Member { object, prop, .. } => {
                self.eval(object)?;
                Ok(Some(Vertex::Prop(prop.clone())))
            }
            Expr::Object { props, .. } => {
                for (key, value) in props {
                    let v = self.eval(value)?;
                    if let (Some(key), Some(v)) = (key, v) {
                        self.fg.add_edge(v, Vertex::Prop(key.clone()));
                    }
                }
                Ok(None)
            }
            Expr::Array { elems, .. } => {
                for (index, elem) in elems.iter().enumerate() {
                    if let Some(v) = self.eval(elem)? {
                        self.fg.add_edge(v, Vertex::Prop(index.to_string()));
                    }
                }
                Ok(None)
            }
            Expr::Cond { test, cons, alt, pos } => {
                self.eval(test)?;
                let merge = Vertex::Expr(pos.clone());
                for branch in [cons, alt] {
                    if let Some(v) = self.eval(branch)? {
                        self.fg.add_edge(v, merge.clone());
                    }
                }
                Ok(Some(merge))
            }
            Expr::Logical { left, right, pos } => {
                let merge = Vertex::Expr(pos.clone());
                for operand in [left, right] {
                    if let Some(v) = self.eval(operand)? {
                        self.fg.add_edge(v, merge.clone());
                    }
                }
                Ok(Some(merge))
            }
            Expr::Seq(exprs) => {
                let mut last = None;
                for e in exprs {
                    last = self.eval(e)?;
                }
                Ok(last)
            }
            Expr::Opaque { children, .. } => {
                for child in children {
                    self.eval(child)?;
                }
                Ok(None)
            }
        }
    }

    /// Evaluate an assignment target for its storage slot. Targets without
    /// a modeled slot (destructuring patterns, computed members) still have
    /// their subexpressions traversed.
    fn lvalue(&mut self, target: &Expr) -> Result<Option<Vertex>, AnalysisError> {
        match target {
            Expr::Ident { .. } => self.eval(target),
            Expr::Member { object, prop, .. } => {
                self.eval(object)?;
                Ok(Some(Vertex::Prop(prop.clone())))
            }
            other => {
                self.eval(other)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bindings;
    use crate::infrastructure::parser::TreeSitterParser;
    use crate::ports::SourceParser;

    fn flow_graph(src: &str) -> (BoundProgram, FlowGraph) {
        let module = TreeSitterParser.parse("test.js", src).unwrap();
        let prog = bindings::bind(vec![module]);
        let fg = build_flow_graph(&prog).unwrap();
        (prog, fg)
    }

    fn has_edge(prog: &BoundProgram, fg: &FlowGraph, from: &str, to: &str) -> bool {
        fg.edges().any(|(a, b)| {
            fg.vertex(a).label(prog) == from && fg.vertex(b).label(prog) == to
        })
    }

    #[test]
    fn test_declaration_originates_into_its_name() {
        let (prog, fg) = flow_graph("function f() {}\nf();");
        assert!(has_edge(&prog, &fg, "Fn(test.js@1:1)", "Glob(f)"));
        assert!(has_edge(&prog, &fg, "Glob(f)", "Callee(test.js@2:1)"));
    }

    #[test]
    fn test_assignment_copies_flow() {
        let (prog, fg) = flow_graph("function f() {}\nvar g = f;\ng();");
        assert!(has_edge(&prog, &fg, "Glob(f)", "Glob(g)"));
        assert!(has_edge(&prog, &fg, "Glob(g)", "Callee(test.js@3:1)"));
        assert!(
            !has_edge(&prog, &fg, "Fn(test.js@1:1)", "Glob(g)"),
            "a copied identifier is not an origination edge"
        );
    }

    #[test]
    fn test_native_references_intern_to_one_vertex() {
        let (_prog, fg) = flow_graph("foo();\nfoo();");
        let natives = fg
            .node_indices()
            .filter(|&ix| matches!(fg.vertex(ix), Vertex::Native(_)))
            .count();
        assert_eq!(natives, 1);
    }

    #[test]
    fn test_one_shot_closure_wires_params_and_return() {
        let (prog, fg) =
            flow_graph("function f() {}\n(function (x) { return x; })(f);");
        // f flows into the parameter slot and back out through the result.
        assert!(has_edge(&prog, &fg, "Glob(f)", "Var(x, test.js@2:12)"));
        assert!(has_edge(&prog, &fg, "Var(x, test.js@2:12)", "Ret(test.js@2:2)"));
        assert!(has_edge(&prog, &fg, "Ret(test.js@2:2)", "Res(test.js@2:1)"));
    }

    #[test]
    fn test_property_store_and_load_share_a_slot() {
        let (prog, fg) = flow_graph("var o = {};\no.m = function () {};\no.m();");
        assert!(has_edge(&prog, &fg, "Fn(test.js@2:7)", "Prop(m)"));
        assert!(has_edge(&prog, &fg, "Prop(m)", "Callee(test.js@3:1)"));
    }

    #[test]
    fn test_self_reference_does_not_diverge() {
        let (prog, fg) = flow_graph("function f() { return f; }\nvar g = f();");
        assert!(has_edge(&prog, &fg, "Glob(f)", "Ret(test.js@1:1)"));
        // No one-shot edge: the callee is an identifier, not a function
        // expression, so the return slot stays unlinked from the result.
        assert!(!has_edge(&prog, &fg, "Ret(test.js@1:1)", "Res(test.js@2:9)"));
    }

    #[test]
    fn test_every_call_owns_a_callee_vertex() {
        let (prog, fg) = flow_graph("1 + 1;\nfoo(bar());");
        assert_eq!(fg.callees().len(), prog.calls.len());
        assert_eq!(prog.calls.len(), 2);
    }
}
