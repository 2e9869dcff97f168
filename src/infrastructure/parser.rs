//! Tree-sitter JavaScript frontend.
//!
//! Lowers the concrete syntax tree into the normalized AST the binder and
//! flow graph builder work from. Control-flow statements become plain
//! blocks (the analysis is flow-insensitive); expressions that cannot
//! evaluate to a function value become `Opaque` nodes whose children are
//! still traversed. Files containing syntax errors are rejected whole: the
//! analysis never runs on partially parsed input.

use std::sync::Arc;

use tree_sitter::{Node, Parser};

use crate::common::AnalysisError;
use crate::domain::ast::{CallExpr, Expr, FuncExpr, Module, Param, Pos, Stmt};
use crate::ports::SourceParser;

pub struct TreeSitterParser;

impl SourceParser for TreeSitterParser {
    fn parse(&self, file: &str, source: &str) -> Result<Module, AnalysisError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("JavaScript grammar matches the linked tree-sitter version");

        let tree = parser.parse(source, None).ok_or_else(|| AnalysisError::Parse {
            file: file.to_string(),
            line: 0,
        })?;
        let root = tree.root_node();
        if let Some(line) = first_error_line(root) {
            return Err(AnalysisError::Parse {
                file: file.to_string(),
                line,
            });
        }

        let lowering = Lowering {
            file: Arc::from(file),
            src: source.as_bytes(),
        };
        let pos = lowering.pos(root);
        let mut body = Vec::new();
        lowering.stmts_into(root, &mut body);
        Ok(Module {
            file: lowering.file,
            pos,
            body,
            fid: None,
        })
    }
}

/// Expression node kinds the lowering understands directly. Used when an
/// expression shows up in statement position inside a flattened construct.
fn is_expression_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "function_expression"
            | "generator_function"
            | "arrow_function"
            | "call_expression"
            | "new_expression"
            | "assignment_expression"
            | "augmented_assignment_expression"
            | "member_expression"
            | "subscript_expression"
            | "parenthesized_expression"
            | "await_expression"
            | "ternary_expression"
            | "binary_expression"
            | "unary_expression"
            | "update_expression"
            | "yield_expression"
            | "spread_element"
            | "object"
            | "array"
            | "sequence_expression"
            | "template_string"
            | "string"
            | "number"
            | "regex"
            | "true"
            | "false"
            | "null"
            | "undefined"
            | "this"
            | "super"
            | "class"
    )
}

/// First ERROR or MISSING node in the tree, if any, as a 1-based line.
fn first_error_line(node: Node) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row as u32 + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}

struct Lowering<'a> {
    file: Arc<str>,
    src: &'a [u8],
}

impl Lowering<'_> {
    fn pos(&self, node: Node) -> Pos {
        let p = node.start_position();
        Pos {
            file: self.file.clone(),
            line: p.row as u32 + 1,
            col: p.column as u32 + 1,
        }
    }

    fn text(&self, node: Node) -> String {
        node.utf8_text(self.src).unwrap_or_default().to_string()
    }

    fn named_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect()
    }

    fn stmts_into(&self, node: Node, out: &mut Vec<Stmt>) {
        for child in self.named_children(node) {
            self.stmt(child, out);
        }
    }

    fn block(&self, node: Node) -> Vec<Stmt> {
        let mut out = Vec::new();
        self.stmts_into(node, &mut out);
        out
    }

    fn stmt(&self, node: Node, out: &mut Vec<Stmt>) {
        match node.kind() {
            "expression_statement" => {
                if let Some(child) = self.named_children(node).first().copied() {
                    out.push(Stmt::Expr(self.expr(child)));
                }
            }
            "variable_declaration" | "lexical_declaration" => {
                for decl in self.named_children(node) {
                    if decl.kind() != "variable_declarator" {
                        continue;
                    }
                    self.declarator(decl, out);
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                out.push(Stmt::FuncDecl {
                    func: self.function(node),
                    var: None,
                });
            }
            "return_statement" => {
                let arg = self
                    .named_children(node)
                    .first()
                    .map(|&child| self.expr(child));
                out.push(Stmt::Return {
                    arg,
                    pos: self.pos(node),
                });
            }
            "statement_block" => out.push(Stmt::Block(self.block(node))),
            "if_statement" => {
                if let Some(cond) = node.child_by_field_name("condition") {
                    out.push(Stmt::Expr(self.expr(cond)));
                }
                if let Some(cons) = node.child_by_field_name("consequence") {
                    self.stmt(cons, out);
                }
                if let Some(alt) = node.child_by_field_name("alternative") {
                    // else_clause wraps the actual statement
                    self.stmts_into(alt, out);
                }
            }
            "while_statement" | "do_statement" => {
                if let Some(cond) = node.child_by_field_name("condition") {
                    out.push(Stmt::Expr(self.expr(cond)));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.stmt(body, out);
                }
            }
            "for_statement" => {
                for field in ["initializer", "condition", "increment", "body"] {
                    if let Some(child) = node.child_by_field_name(field) {
                        self.stmt(child, out);
                    }
                }
            }
            "for_in_statement" | "for_of_statement" => {
                for field in ["left", "right", "body"] {
                    if let Some(child) = node.child_by_field_name(field) {
                        self.stmt(child, out);
                    }
                }
            }
            "labeled_statement" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.stmt(body, out);
                }
            }
            "throw_statement" => {
                if let Some(child) = self.named_children(node).first().copied() {
                    out.push(Stmt::Expr(self.expr(child)));
                }
            }
            "export_statement" => {
                if let Some(decl) = node.child_by_field_name("declaration") {
                    self.stmt(decl, out);
                } else if let Some(value) = node.child_by_field_name("value") {
                    out.push(Stmt::Expr(self.expr(value)));
                }
            }
            "class_declaration" => {
                // Classes are outside the modeled flow; declaring the name
                // keeps references from being misread as natives, and the
                // body is still flattened so nested calls are not lost.
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(Stmt::VarDecl {
                        name: self.text(name),
                        pos: self.pos(name),
                        init: None,
                        var: None,
                    });
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.stmts_into(body, out);
                }
            }
            "empty_statement" | "debugger_statement" | "import_statement" | "comment" => {}
            kind if is_expression_kind(kind) => out.push(Stmt::Expr(self.expr(node))),
            // Anything else (switch, try, with, ...) is flattened into the
            // statements and expressions it contains.
            _ => self.stmts_into(node, out),
        }
    }

    fn declarator(&self, node: Node, out: &mut Vec<Stmt>) {
        let init = node.child_by_field_name("value").map(|v| self.expr(v));
        match node.child_by_field_name("name") {
            Some(name) if name.kind() == "identifier" => out.push(Stmt::VarDecl {
                name: self.text(name),
                pos: self.pos(name),
                init,
                var: None,
            }),
            // Destructuring declarations keep only the initializer's flow.
            _ => {
                if let Some(init) = init {
                    out.push(Stmt::Expr(init));
                }
            }
        }
    }

    fn function(&self, node: Node) -> FuncExpr {
        let name = node.child_by_field_name("name").map(|n| self.text(n));
        let mut params = Vec::new();
        let mut default_inits = Vec::new();

        if let Some(list) = node.child_by_field_name("parameters") {
            for p in self.named_children(list) {
                match p.kind() {
                    "identifier" => params.push(Param {
                        name: self.text(p),
                        pos: self.pos(p),
                    }),
                    "assignment_pattern" => {
                        let left = p.child_by_field_name("left");
                        let right = p.child_by_field_name("right");
                        match left {
                            Some(left) if left.kind() == "identifier" => {
                                let name = self.text(left);
                                let pos = self.pos(left);
                                params.push(Param {
                                    name: name.clone(),
                                    pos: pos.clone(),
                                });
                                // The default value flows into the parameter
                                // like an assignment.
                                if let Some(right) = right {
                                    default_inits.push(Stmt::Expr(Expr::Assign {
                                        target: Box::new(Expr::Ident {
                                            name,
                                            pos,
                                            binding: None,
                                        }),
                                        value: Box::new(self.expr(right)),
                                    }));
                                }
                            }
                            _ => params.push(self.opaque_param(p)),
                        }
                    }
                    "rest_pattern" => {}
                    // Destructuring patterns keep their parameter position
                    // so one-shot argument matching stays index-aligned.
                    _ => params.push(self.opaque_param(p)),
                }
            }
        } else if let Some(p) = node.child_by_field_name("parameter") {
            // single-identifier arrow parameter
            params.push(Param {
                name: self.text(p),
                pos: self.pos(p),
            });
        }

        let pos = self.pos(node);
        let mut body = default_inits;
        match node.child_by_field_name("body") {
            Some(b) if b.kind() == "statement_block" => body.extend(self.block(b)),
            Some(b) => {
                // expression-bodied arrow: implicit return
                body.push(Stmt::Return {
                    arg: Some(self.expr(b)),
                    pos: self.pos(b),
                });
            }
            None => {}
        }

        FuncExpr {
            name,
            params,
            body,
            pos,
            fid: None,
            self_var: None,
        }
    }

    /// Placeholder for a destructuring parameter. The angle brackets keep
    /// the name unreferencable from source.
    fn opaque_param(&self, node: Node) -> Param {
        let pos = self.pos(node);
        Param {
            name: format!("<pattern@{}:{}>", pos.line, pos.col),
            pos,
        }
    }

    fn expr(&self, node: Node) -> Expr {
        match node.kind() {
            "identifier" => Expr::Ident {
                name: self.text(node),
                pos: self.pos(node),
                binding: None,
            },
            "function_expression" | "generator_function" | "arrow_function" => {
                Expr::Function(Box::new(self.function(node)))
            }
            "call_expression" => self.call(node, false),
            "new_expression" => self.call(node, true),
            "assignment_expression" => Expr::Assign {
                target: Box::new(self.field_expr(node, "left")),
                value: Box::new(self.field_expr(node, "right")),
            },
            "member_expression" => match node.child_by_field_name("property") {
                Some(prop) if prop.kind() == "property_identifier" => Expr::Member {
                    object: Box::new(self.field_expr(node, "object")),
                    prop: self.text(prop),
                    pos: self.pos(node),
                },
                _ => self.opaque(node),
            },
            "parenthesized_expression" | "await_expression" => self
                .named_children(node)
                .first()
                .map(|&c| self.expr(c))
                .unwrap_or_else(|| self.opaque(node)),
            "ternary_expression" => Expr::Cond {
                test: Box::new(self.field_expr(node, "condition")),
                cons: Box::new(self.field_expr(node, "consequence")),
                alt: Box::new(self.field_expr(node, "alternative")),
                pos: self.pos(node),
            },
            "binary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or_default();
                if matches!(op.as_str(), "||" | "&&" | "??") {
                    Expr::Logical {
                        left: Box::new(self.field_expr(node, "left")),
                        right: Box::new(self.field_expr(node, "right")),
                        pos: self.pos(node),
                    }
                } else {
                    self.opaque(node)
                }
            }
            "object" => {
                let mut props = Vec::new();
                for child in self.named_children(node) {
                    match child.kind() {
                        "pair" => {
                            let key = child
                                .child_by_field_name("key")
                                .and_then(|k| self.property_name(k));
                            props.push((key, self.field_expr(child, "value")));
                        }
                        "shorthand_property_identifier" => {
                            let name = self.text(child);
                            props.push((
                                Some(name.clone()),
                                Expr::Ident {
                                    name,
                                    pos: self.pos(child),
                                    binding: None,
                                },
                            ));
                        }
                        "method_definition" => {
                            let key = child
                                .child_by_field_name("name")
                                .and_then(|k| self.property_name(k));
                            let mut func = self.function(child);
                            // A method's name is a property key, not a
                            // self-binding.
                            func.name = None;
                            props.push((key, Expr::Function(Box::new(func))));
                        }
                        _ => props.push((None, self.expr(child))),
                    }
                }
                Expr::Object {
                    props,
                    pos: self.pos(node),
                }
            }
            "array" => Expr::Array {
                elems: self
                    .named_children(node)
                    .into_iter()
                    .map(|c| self.expr(c))
                    .collect(),
                pos: self.pos(node),
            },
            "sequence_expression" => Expr::Seq(
                self.named_children(node)
                    .into_iter()
                    .map(|c| self.expr(c))
                    .collect(),
            ),
            "spread_element" | "yield_expression" | "unary_expression" | "update_expression" => {
                self.opaque(node)
            }
            "string" | "template_string" | "number" | "regex" | "true" | "false" | "null"
            | "undefined" | "this" | "super" => self.opaque(node),
            _ => self.opaque(node),
        }
    }

    fn call(&self, node: Node, is_new: bool) -> Expr {
        let callee_field = if is_new { "constructor" } else { "function" };
        let callee = node
            .child_by_field_name(callee_field)
            .map(|c| self.expr(c))
            .unwrap_or_else(|| self.opaque(node));
        let args = match node.child_by_field_name("arguments") {
            Some(list) if list.kind() == "arguments" => self
                .named_children(list)
                .into_iter()
                .map(|c| self.expr(c))
                .collect(),
            // tagged template: the template literal is the only argument
            Some(other) => vec![self.expr(other)],
            None => Vec::new(),
        };
        Expr::Call(Box::new(CallExpr {
            callee,
            args,
            pos: self.pos(node),
            is_new,
            cid: None,
        }))
    }

    fn field_expr(&self, node: Node, field: &str) -> Expr {
        node.child_by_field_name(field)
            .map(|c| self.expr(c))
            .unwrap_or_else(|| self.opaque(node))
    }

    /// Statically known property name of an object key, if any.
    fn property_name(&self, key: Node) -> Option<String> {
        match key.kind() {
            "property_identifier" | "number" => Some(self.text(key)),
            "string" => {
                let raw = self.text(key);
                Some(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
            }
            _ => None,
        }
    }

    /// Value-opaque expression; children are still traversed.
    fn opaque(&self, node: Node) -> Expr {
        Expr::Opaque {
            children: self
                .named_children(node)
                .into_iter()
                .map(|c| self.expr(c))
                .collect(),
            pos: self.pos(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Module {
        TreeSitterParser.parse("test.js", src).unwrap()
    }

    #[test]
    fn test_function_declaration_lowering() {
        let module = parse("function f(a, b) { return a; }");
        assert_eq!(module.body.len(), 1);
        match &module.body[0] {
            Stmt::FuncDecl { func, .. } => {
                assert_eq!(func.name.as_deref(), Some("f"));
                assert_eq!(func.params.len(), 2);
                assert!(matches!(func.body[0], Stmt::Return { .. }));
            }
            other => panic!("expected a function declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_call_lowering() {
        let module = parse("f(x, 1);");
        match &module.body[0] {
            Stmt::Expr(Expr::Call(call)) => {
                assert!(!call.is_new);
                assert_eq!(call.args.len(), 2);
                assert!(matches!(call.callee, Expr::Ident { .. }));
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_arrow_function_implicit_return() {
        let module = parse("var id = x => x;");
        match &module.body[0] {
            Stmt::VarDecl { init: Some(Expr::Function(f)), .. } => {
                assert_eq!(f.params.len(), 1);
                assert!(matches!(f.body[0], Stmt::Return { arg: Some(_), .. }));
            }
            other => panic!("expected an arrow declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_control_flow_lowers_to_blocks() {
        let module = parse("if (c) { f(); } else { g(); }");
        // condition expression plus the two branch blocks
        assert_eq!(module.body.len(), 3);
        assert!(matches!(module.body[0], Stmt::Expr(_)));
        assert!(matches!(module.body[1], Stmt::Block(_)));
        assert!(matches!(module.body[2], Stmt::Block(_)));
    }

    #[test]
    fn test_object_literal_props() {
        let module = parse("var o = { m: function () {}, n() {}, k };");
        match &module.body[0] {
            Stmt::VarDecl { init: Some(Expr::Object { props, .. }), .. } => {
                let keys: Vec<_> = props.iter().map(|(k, _)| k.clone()).collect();
                assert_eq!(
                    keys,
                    vec![
                        Some("m".to_string()),
                        Some("n".to_string()),
                        Some("k".to_string())
                    ]
                );
                assert!(matches!(props[1].1, Expr::Function(_)));
            }
            other => panic!("expected an object declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let err = TreeSitterParser.parse("bad.js", "function ( {").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { .. }));
    }

    #[test]
    fn test_positions_are_one_based() {
        let module = parse("f();");
        match &module.body[0] {
            Stmt::Expr(Expr::Call(call)) => {
                assert_eq!(call.pos.line, 1);
                assert_eq!(call.pos.col, 1);
                assert_eq!(call.pos.to_string(), "test.js@1:1");
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }
}
