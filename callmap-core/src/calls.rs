//! Call reference resolution and structural complexity scoring
//!
//! Global invariants enforced:
//! - Lexical resolution only: bare identifiers, single-level property access,
//!   and dynamic imports; every other callee shape is silently skipped
//! - Deterministic traversal order
//!
//! State-mutation detection is a textual heuristic over call and assignment
//! text. It may over- and under-report; callers must treat it as a
//! best-effort annotation, not a verified data-flow result.

use crate::record::{CallSite, Mutation, MutationKind};
use std::collections::BTreeSet;
use swc_common::{SourceMap, SourceMapper, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// A function body as found in the AST: block-bodied functions and methods,
/// or expression-bodied arrows
pub enum FunctionBody<'a> {
    Block(&'a BlockStmt),
    Expr(&'a Expr),
}

/// Everything the resolver learns from one function body
#[derive(Debug, Clone, Default)]
pub struct BodyAnalysis {
    /// Deduplicated callee names
    pub callees: BTreeSet<String>,
    /// Call sites in source order, with argument source text
    pub calls: Vec<CallSite>,
    pub mutations: Vec<Mutation>,
    /// Branching-construct count, starting at 1
    pub complexity: u32,
}

/// Walk a function body and produce its outgoing call references, mutation
/// markers, and complexity score
pub fn analyze_body(body: &FunctionBody, source_map: &SourceMap) -> BodyAnalysis {
    let mut collector = CallCollector {
        source_map,
        callees: BTreeSet::new(),
        calls: Vec::new(),
        mutations: Vec::new(),
    };
    let mut complexity = ComplexityVisitor { score: 1 };

    match body {
        FunctionBody::Block(block) => {
            block.visit_with(&mut collector);
            block.visit_with(&mut complexity);
        }
        FunctionBody::Expr(expr) => {
            expr.visit_with(&mut collector);
            expr.visit_with(&mut complexity);
        }
    }

    BodyAnalysis {
        callees: collector.callees,
        calls: collector.calls,
        mutations: collector.mutations,
        complexity: complexity.score,
    }
}

/// Visitor collecting call references and mutation markers
struct CallCollector<'a> {
    source_map: &'a SourceMap,
    callees: BTreeSet<String>,
    calls: Vec<CallSite>,
    mutations: Vec<Mutation>,
}

impl CallCollector<'_> {
    /// Literal source text of an expression, empty when the span cannot be
    /// resolved
    fn text_of(&self, span: swc_common::Span) -> String {
        self.source_map.span_to_snippet(span).unwrap_or_default()
    }

    fn argument_texts(&self, call: &CallExpr) -> Vec<String> {
        call.args.iter().map(|arg| self.text_of(arg.expr.span())).collect()
    }

    fn record_call(&mut self, callee: String, args: Vec<String>) {
        self.callees.insert(callee.clone());
        self.calls.push(CallSite { callee, args });
    }

    fn push_mutation(&mut self, kind: MutationKind, target: String) {
        self.mutations.push(Mutation { kind, target });
    }

    /// Heuristic mutation markers for a bare-identifier call
    fn detect_ident_mutation(&mut self, name: &str) {
        if name.contains("writeFile") || name.contains("appendFile") {
            self.push_mutation(MutationKind::Write, "file".to_string());
        } else if is_state_setter(name) {
            self.push_mutation(MutationKind::Update, name.to_string());
        }
    }

    /// Heuristic mutation markers for an `obj.method` call
    fn detect_member_mutation(&mut self, receiver: &str, callee_text: &str) {
        if callee_text.contains("writeFile") || callee_text.contains("appendFile") {
            self.push_mutation(MutationKind::Write, "file".to_string());
        } else if callee_text.contains(".push")
            || callee_text.contains(".pop")
            || callee_text.contains(".splice")
        {
            self.push_mutation(MutationKind::Update, receiver.to_string());
        } else if callee_text.contains(".delete") || callee_text.contains(".remove") {
            self.push_mutation(MutationKind::Delete, receiver.to_string());
        } else if callee_text.contains(".set") {
            self.push_mutation(MutationKind::Update, receiver.to_string());
        }
    }
}

/// React-style state setter convention: `setCount`, `setUser`, ...
fn is_state_setter(name: &str) -> bool {
    name.strip_prefix("set")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

impl Visit for CallCollector<'_> {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        match &call.callee {
            Callee::Import(_) => {
                // Synthetic reference for dynamic imports with a literal path
                if let Some(arg) = call.args.first() {
                    if let Expr::Lit(Lit::Str(path)) = &*arg.expr {
                        let reference =
                            format!("import({})", path.value.to_atom_lossy());
                        self.record_call(reference, Vec::new());
                    }
                }
            }
            Callee::Expr(callee) => match &**callee {
                Expr::Ident(ident) => {
                    let name = ident.sym.to_string();
                    let args = self.argument_texts(call);
                    self.detect_ident_mutation(&name);
                    self.record_call(name, args);
                }
                Expr::Member(member) => {
                    // Single-level property access on a bare identifier only;
                    // deeper chains and computed access are out of scope
                    if let (Expr::Ident(obj), MemberProp::Ident(prop)) =
                        (&*member.obj, &member.prop)
                    {
                        let receiver = obj.sym.to_string();
                        let name = format!("{}.{}", receiver, prop.sym);
                        let args = self.argument_texts(call);
                        self.detect_member_mutation(&receiver, &name);
                        self.record_call(name, args);
                    }
                }
                // IIFEs and other callee shapes are silently skipped
                _ => {}
            },
            Callee::Super(_) => {}
        }

        call.visit_children_with(self);
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) {
        match assign.op {
            AssignOp::Assign | AssignOp::AddAssign | AssignOp::SubAssign => {
                let target = self.text_of(assign.left.span());
                if !target.is_empty() {
                    self.push_mutation(MutationKind::Assign, target);
                }
            }
            _ => {}
        }
        assign.visit_children_with(self);
    }
}

/// Visitor counting branching constructs, regardless of nesting depth.
///
/// The score starts at 1 and increments once per `if`, ternary, loop, and
/// `switch` case.
struct ComplexityVisitor {
    score: u32,
}

impl Visit for ComplexityVisitor {
    fn visit_if_stmt(&mut self, node: &IfStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_cond_expr(&mut self, node: &CondExpr) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_for_stmt(&mut self, node: &ForStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_while_stmt(&mut self, node: &WhileStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_do_while_stmt(&mut self, node: &DoWhileStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_switch_stmt(&mut self, node: &SwitchStmt) {
        // One increment per case
        self.score += node.cases.len() as u32;
        node.visit_children_with(self);
    }
}
