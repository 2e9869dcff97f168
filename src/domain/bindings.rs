//! Name and scope resolution.
//!
//! Attaches every identifier reference to its declaring binding, numbers
//! functions and call sites densely, and builds the side tables the flow
//! graph builder works from. Scopes are function-level: `var`, `let`,
//! `const` and function declarations hoist to the enclosing function scope,
//! and all file top-levels share one global scope.

use rustc_hash::FxHashMap;

use crate::domain::ast::{
    BindingRef, BoundProgram, CallInfo, Expr, FuncExpr, FuncId, FuncInfo, Module, Pos, Stmt,
    VarId, VarInfo, VarKind,
};

/// Resolve bindings for a whole program. References that match no
/// source-level declaration are classified as natives, interned by name at
/// the flow graph level.
pub fn bind(mut modules: Vec<Module>) -> BoundProgram {
    let mut binder = Binder::default();

    // Pass 1: hoist every file's top-level declarations into the shared
    // global scope, so cross-file references resolve regardless of file
    // order.
    for module in &modules {
        binder.hoist_globals(&module.body);
    }

    // Pass 2: number functions and calls, resolve references.
    for module in &mut modules {
        let fid = binder.funcs.len();
        binder.funcs.push(FuncInfo {
            name: None,
            pos: module.pos.clone(),
            params: Vec::new(),
            is_toplevel: true,
        });
        module.fid = Some(fid);
        binder.walk_stmts(&mut module.body);
    }

    BoundProgram {
        modules,
        funcs: binder.funcs,
        calls: binder.calls,
        vars: binder.vars,
    }
}

#[derive(Default)]
struct Binder {
    funcs: Vec<FuncInfo>,
    calls: Vec<CallInfo>,
    vars: Vec<VarInfo>,
    /// Shared global scope; the bottom of every lookup chain.
    global: FxHashMap<String, VarId>,
    /// Function scopes, innermost last.
    scopes: Vec<FxHashMap<String, VarId>>,
}

impl Binder {
    fn alloc_var(&mut self, name: &str, pos: &Pos, kind: VarKind) -> VarId {
        let vid = self.vars.len();
        self.vars.push(VarInfo {
            name: name.to_string(),
            pos: pos.clone(),
            kind,
        });
        vid
    }

    /// Collect top-level declaration names into the global scope. Does not
    /// descend into function bodies; their declarations are function-local.
    fn hoist_globals(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match stmt {
                Stmt::VarDecl { name, pos, .. } => {
                    if !self.global.contains_key(name) {
                        let vid = self.alloc_var(name, pos, VarKind::Global);
                        self.global.insert(name.clone(), vid);
                    }
                }
                Stmt::FuncDecl { func, .. } => {
                    if let Some(name) = &func.name {
                        if !self.global.contains_key(name) {
                            let vid = self.alloc_var(name, &func.pos, VarKind::Global);
                            self.global.insert(name.clone(), vid);
                        }
                    }
                }
                Stmt::Block(inner) => self.hoist_globals(inner),
                Stmt::Expr(_) | Stmt::Return { .. } => {}
            }
        }
    }

    /// Collect the declaration names of one function body into its scope.
    fn hoist_locals(&mut self, stmts: &[Stmt], scope: &mut FxHashMap<String, VarId>, func: FuncId) {
        for stmt in stmts {
            match stmt {
                Stmt::VarDecl { name, pos, .. } => {
                    if !scope.contains_key(name) {
                        let vid = self.alloc_var(name, pos, VarKind::Local { func });
                        scope.insert(name.clone(), vid);
                    }
                }
                Stmt::FuncDecl { func: f, .. } => {
                    if let Some(name) = &f.name {
                        if !scope.contains_key(name) {
                            let vid = self.alloc_var(name, &f.pos, VarKind::Local { func });
                            scope.insert(name.clone(), vid);
                        }
                    }
                }
                Stmt::Block(inner) => self.hoist_locals(inner, scope, func),
                Stmt::Expr(_) | Stmt::Return { .. } => {}
            }
        }
    }

    /// Look a name up through the scope chain; unresolved names are native.
    fn resolve(&self, name: &str) -> BindingRef {
        for scope in self.scopes.iter().rev() {
            if let Some(&vid) = scope.get(name) {
                return BindingRef::Var(vid);
            }
        }
        if let Some(&vid) = self.global.get(name) {
            return BindingRef::Var(vid);
        }
        BindingRef::Native(name.to_string())
    }

    fn walk_stmts(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            match stmt {
                Stmt::Expr(e) => self.walk_expr(e),
                Stmt::VarDecl { name, init, var, .. } => {
                    // The declaration was hoisted, so the lookup cannot be
                    // shadowed by anything deeper.
                    if let BindingRef::Var(vid) = self.resolve(name) {
                        *var = Some(vid);
                    }
                    if let Some(init) = init {
                        self.walk_expr(init);
                    }
                }
                Stmt::FuncDecl { func, var } => {
                    if let Some(name) = func.name.clone() {
                        if let BindingRef::Var(vid) = self.resolve(&name) {
                            *var = Some(vid);
                        }
                    }
                    self.walk_function(func, true);
                }
                Stmt::Return { arg, .. } => {
                    if let Some(arg) = arg {
                        self.walk_expr(arg);
                    }
                }
                Stmt::Block(inner) => self.walk_stmts(inner),
            }
        }
    }

    fn walk_function(&mut self, func: &mut FuncExpr, declared: bool) {
        let fid = self.funcs.len();
        self.funcs.push(FuncInfo {
            name: func.name.clone(),
            pos: func.pos.clone(),
            params: Vec::new(),
            is_toplevel: false,
        });
        func.fid = Some(fid);

        let mut scope = FxHashMap::default();
        for (index, param) in func.params.iter().enumerate() {
            let vid = self.vars.len();
            self.vars.push(VarInfo {
                name: param.name.clone(),
                pos: param.pos.clone(),
                kind: VarKind::Param { func: fid, index },
            });
            scope.insert(param.name.clone(), vid);
            self.funcs[fid].params.push(vid);
        }

        // A named function expression binds its own name inside its own
        // scope only; a declaration's name lives in the enclosing scope.
        if !declared {
            if let Some(name) = &func.name {
                if !scope.contains_key(name) {
                    let vid = self.alloc_var(name, &func.pos, VarKind::Local { func: fid });
                    scope.insert(name.clone(), vid);
                    func.self_var = Some(vid);
                }
            }
        }

        self.hoist_locals(&func.body, &mut scope, fid);
        self.scopes.push(scope);
        self.walk_stmts(&mut func.body);
        self.scopes.pop();
    }

    fn walk_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Ident { name, binding, .. } => {
                *binding = Some(self.resolve(name));
            }
            Expr::Function(func) => self.walk_function(func, false),
            Expr::Call(call) => {
                let cid = self.calls.len();
                self.calls.push(CallInfo {
                    pos: call.pos.clone(),
                    is_new: call.is_new,
                });
                call.cid = Some(cid);
                self.walk_expr(&mut call.callee);
                for arg in &mut call.args {
                    self.walk_expr(arg);
                }
            }
            Expr::Assign { target, value } => {
                self.walk_expr(target);
                self.walk_expr(value);
            }
            Expr::Member { object, .. } => self.walk_expr(object),
            Expr::Object { props, .. } => {
                for (_, value) in props {
                    self.walk_expr(value);
                }
            }
            Expr::Array { elems, .. } => {
                for elem in elems {
                    self.walk_expr(elem);
                }
            }
            Expr::Cond { test, cons, alt, .. } => {
                self.walk_expr(test);
                self.walk_expr(cons);
                self.walk_expr(alt);
            }
            Expr::Logical { left, right, .. } => {
                self.walk_expr(left);
                self.walk_expr(right);
            }
            Expr::Seq(exprs) => {
                for e in exprs {
                    self.walk_expr(e);
                }
            }
            Expr::Opaque { children, .. } => {
                for child in children {
                    self.walk_expr(child);
                }
            }
        }
    }
}
