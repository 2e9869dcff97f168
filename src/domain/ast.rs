// Normalized AST for Mr. Magpie.
// The parser lowers JavaScript syntax into this small statement/expression
// vocabulary; the binder annotates it with dense ids and binding targets.
// Control-flow statements are lowered to plain blocks, which is sufficient
// because the analysis is flow-insensitive.

use std::fmt;
use std::sync::Arc;

/// Dense id of a function definition (including the implicit top-level
/// pseudo-function of each file).
pub type FuncId = usize;
/// Dense id of a call or `new` expression.
pub type CallId = usize;
/// Dense id of a declared variable binding.
pub type VarId = usize;

/// A 1-based source position, displayed as `file@line:col`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    pub file: Arc<str>,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}:{}", self.file, self.line, self.col)
    }
}

/// One parsed input file. `fid` is the id of its top-level pseudo-function,
/// assigned by the binder.
#[derive(Debug)]
pub struct Module {
    pub file: Arc<str>,
    pub pos: Pos,
    pub body: Vec<Stmt>,
    pub fid: Option<FuncId>,
}

#[derive(Debug)]
pub enum Stmt {
    Expr(Expr),
    /// `var`/`let`/`const` declarator. `var` is resolved by the binder to
    /// the hoisted binding of the enclosing function (or global) scope.
    VarDecl {
        name: String,
        pos: Pos,
        init: Option<Expr>,
        var: Option<VarId>,
    },
    /// Function declaration; `var` is the binding of the declared name in
    /// the enclosing scope.
    FuncDecl { func: FuncExpr, var: Option<VarId> },
    Return { arg: Option<Expr>, pos: Pos },
    Block(Vec<Stmt>),
}

#[derive(Debug)]
pub enum Expr {
    /// Identifier reference; `binding` is filled in by the binder and must
    /// be total before the flow graph builder runs.
    Ident {
        name: String,
        pos: Pos,
        binding: Option<BindingRef>,
    },
    /// Function expression or arrow function.
    Function(Box<FuncExpr>),
    Call(Box<CallExpr>),
    Assign { target: Box<Expr>, value: Box<Expr> },
    /// Non-computed property access `object.prop`.
    Member {
        object: Box<Expr>,
        prop: String,
        pos: Pos,
    },
    /// Object literal. Properties without a statically known name (computed
    /// keys, spreads) carry `None` and contribute no property flow.
    Object {
        props: Vec<(Option<String>, Expr)>,
        pos: Pos,
    },
    Array { elems: Vec<Expr>, pos: Pos },
    Cond {
        test: Box<Expr>,
        cons: Box<Expr>,
        alt: Box<Expr>,
        pos: Pos,
    },
    /// `||`, `&&` and `??`; either operand may be the expression's value.
    Logical {
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Pos,
    },
    /// Comma expression; the value is the last operand's value.
    Seq(Vec<Expr>),
    /// Expression that never evaluates to a function value (literals,
    /// arithmetic, computed member access, `this`, ...). Children are still
    /// traversed so nested definitions and calls are not lost.
    Opaque { children: Vec<Expr>, pos: Pos },
}

/// A function definition: declaration, expression or arrow.
#[derive(Debug)]
pub struct FuncExpr {
    /// Declared name, or the name of a named function expression.
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub pos: Pos,
    /// Assigned by the binder.
    pub fid: Option<FuncId>,
    /// For a named function expression, the binding of its own name inside
    /// its own scope.
    pub self_var: Option<VarId>,
}

#[derive(Debug)]
pub struct Param {
    pub name: String,
    pub pos: Pos,
}

#[derive(Debug)]
pub struct CallExpr {
    pub callee: Expr,
    pub args: Vec<Expr>,
    pub pos: Pos,
    pub is_new: bool,
    /// Assigned by the binder.
    pub cid: Option<CallId>,
}

/// Resolution of an identifier reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingRef {
    /// A declared parameter, local or global.
    Var(VarId),
    /// No source-level binding exists; the reference names a native (or
    /// otherwise environment-provided) value, interned by name.
    Native(String),
}

/// Side table entry for one function definition.
#[derive(Debug)]
pub struct FuncInfo {
    pub name: Option<String>,
    pub pos: Pos,
    /// Formal-parameter bindings, in declaration order.
    pub params: Vec<VarId>,
    pub is_toplevel: bool,
}

/// Side table entry for one call site.
#[derive(Debug)]
pub struct CallInfo {
    pub pos: Pos,
    pub is_new: bool,
}

#[derive(Debug)]
pub struct VarInfo {
    pub name: String,
    pub pos: Pos,
    pub kind: VarKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Param { func: FuncId, index: usize },
    Local { func: FuncId },
    Global,
}

/// The bound program: the module trees plus the dense side tables the
/// binder produced. Never mutated by the analysis core.
#[derive(Debug, Default)]
pub struct BoundProgram {
    pub modules: Vec<Module>,
    pub funcs: Vec<FuncInfo>,
    pub calls: Vec<CallInfo>,
    pub vars: Vec<VarInfo>,
}
