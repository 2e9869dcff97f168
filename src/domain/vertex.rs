//! Vertex model for the flow graph.
//!
//! One closed sum type covers every node identity. `Func`, `Callee` and
//! `Native` are the call-graph-relevant variants; the remaining variants are
//! the auxiliary value-slots that route flow between them. Structural
//! equality plus interning in the flow graph guarantees that equal
//! identities collapse to one node.

use crate::domain::ast::{BoundProgram, CallId, FuncId, Pos, VarId, VarKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vertex {
    /// A function definition, including the implicit top-level
    /// pseudo-function of each file.
    Func(FuncId),
    /// The callee position of one call site.
    Callee(CallId),
    /// A built-in/environment function, interned by name.
    Native(String),
    /// A declared variable binding; parameters double as the
    /// formal-parameter slots.
    Var(VarId),
    /// Field-based property storage, one slot per property name.
    Prop(String),
    /// A function's return slot.
    Ret(FuncId),
    /// A call's result slot.
    Res(CallId),
    /// An expression position that merges several value origins
    /// (conditional and logical operands).
    Expr(Pos),
}

impl Vertex {
    /// Whether this vertex can be the target of a call edge.
    pub fn is_origin(&self) -> bool {
        matches!(self, Vertex::Func(_) | Vertex::Native(_))
    }

    /// Kind-tagged label used by the flow graph rendering.
    pub fn label(&self, prog: &BoundProgram) -> String {
        match self {
            Vertex::Func(fid) => format!("Fn({})", prog.funcs[*fid].pos),
            Vertex::Callee(cid) => format!("Callee({})", prog.calls[*cid].pos),
            Vertex::Native(name) => format!("Native({})", name),
            Vertex::Var(vid) => {
                let var = &prog.vars[*vid];
                match var.kind {
                    VarKind::Global => format!("Glob({})", var.name),
                    _ => format!("Var({}, {})", var.name, var.pos),
                }
            }
            Vertex::Prop(name) => format!("Prop({})", name),
            Vertex::Ret(fid) => format!("Ret({})", prog.funcs[*fid].pos),
            Vertex::Res(cid) => format!("Res({})", prog.calls[*cid].pos),
            Vertex::Expr(pos) => format!("Expr({})", pos),
        }
    }

    /// Label used by the call graph output: a source position for call
    /// sites and function definitions, a literal name for natives.
    pub fn target_label(&self, prog: &BoundProgram) -> String {
        match self {
            Vertex::Func(fid) => prog.funcs[*fid].pos.to_string(),
            Vertex::Callee(cid) => prog.calls[*cid].pos.to_string(),
            Vertex::Native(name) => name.clone(),
            // Auxiliary slots never appear in an assembled call graph; the
            // closed enum keeps the full match total anyway.
            other => other.label(prog),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::{CallInfo, FuncInfo};
    use std::sync::Arc;

    fn pos(line: u32, col: u32) -> Pos {
        Pos {
            file: Arc::from("test.js"),
            line,
            col,
        }
    }

    fn sample_program() -> BoundProgram {
        let mut prog = BoundProgram::default();
        prog.funcs.push(FuncInfo {
            name: Some("f".to_string()),
            pos: pos(1, 1),
            params: Vec::new(),
            is_toplevel: false,
        });
        prog.calls.push(CallInfo {
            pos: pos(2, 1),
            is_new: false,
        });
        prog
    }

    #[test]
    fn test_variants_with_same_display_are_not_equal() {
        // Func(0) and Callee(0) wrap the same raw id but must stay distinct.
        assert_ne!(Vertex::Func(0), Vertex::Callee(0));
        assert_ne!(Vertex::Ret(0), Vertex::Func(0));
        assert_ne!(
            Vertex::Native("f".to_string()),
            Vertex::Prop("f".to_string())
        );
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Vertex::Native("foo".to_string()), Vertex::Native("foo".to_string()));
        assert_eq!(Vertex::Func(3), Vertex::Func(3));
    }

    #[test]
    fn test_labels() {
        let prog = sample_program();
        assert_eq!(Vertex::Func(0).label(&prog), "Fn(test.js@1:1)");
        assert_eq!(Vertex::Func(0).target_label(&prog), "test.js@1:1");
        assert_eq!(Vertex::Callee(0).target_label(&prog), "test.js@2:1");
        assert_eq!(Vertex::Native("foo".to_string()).target_label(&prog), "foo");
    }
}
