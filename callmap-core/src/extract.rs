//! Function and type extraction from the AST
//!
//! Global invariants enforced:
//! - Deterministic traversal order by (file, start line)
//! - A construct with no resolvable name is skipped, never emitted with a
//!   placeholder
//! - Extraction never fails on malformed-but-parseable input; missing type
//!   information is defaulted, never propagated as an error
//!
//! Discovery rules, applied exhaustively over a file:
//! 1. Top-level named function declarations (`FnDecl`)
//! 2. Variable bindings whose initializer is an arrow function or function
//!    expression; the binding's name becomes the function's name
//! 3. Class constructors, methods, getters, setters, and arrow-valued class
//!    properties; the class name becomes the enclosing scope
//! 4. Object-literal methods and arrow/function-valued properties, with the
//!    object's name traced up through binding and property-assignment chains
//! 5. Declarations nested inside another function body, scoped to the nearest
//!    named function-like ancestor
//!
//! Overload signatures and ambient declarations carry no body and are
//! filtered out by the `if let Some(body)` checks.

use crate::calls::{self, FunctionBody};
use crate::record::{
    FunctionKind, FunctionRecord, Parameter, TypeRecord, ANONYMOUS_SCOPE,
};
use regex::Regex;
use std::sync::OnceLock;
use swc_common::{BytePos, SourceMap, SourceMapper, Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// Everything extracted from one parsed file
#[derive(Debug, Default)]
pub struct FileExtraction {
    pub functions: Vec<FunctionRecord>,
    pub types: Vec<TypeRecord>,
}

/// Collect all function and type records from a parsed module.
///
/// Returns functions sorted deterministically by start line; ties keep
/// discovery order.
pub fn extract_file(module: &Module, file_path: &str, source_map: &SourceMap) -> FileExtraction {
    let mut extractor = Extractor {
        file_path,
        source_map,
        name_stack: Vec::new(),
        pending_export: false,
        functions: Vec::new(),
        types: Vec::new(),
    };

    module.visit_with(&mut extractor);

    let mut functions = extractor.functions;
    functions.sort_by_key(|f| f.start_line);

    FileExtraction {
        functions,
        types: extractor.types,
    }
}

/// Normalize type annotation text for display.
///
/// Strips compiler-internal `import("...").` qualifiers, collapses the React
/// namespace on three common type names, and bounds the result at 100
/// characters (97 plus an ellipsis marker).
pub fn clean_type_text(raw: &str) -> String {
    static IMPORT_QUALIFIER_RE: OnceLock<Regex> = OnceLock::new();
    let re = IMPORT_QUALIFIER_RE
        .get_or_init(|| Regex::new(r#"import\("[^"]*"\)\."#).expect("valid pattern"));

    // Multi-line annotations collapse to one line
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut text = re.replace_all(&collapsed, "").to_string();

    for (qualified, bare) in [
        ("React.FC", "FC"),
        ("React.ReactNode", "ReactNode"),
        ("React.ReactElement", "ReactElement"),
    ] {
        text = text.replace(qualified, bare);
    }

    if text.chars().count() > 100 {
        let head: String = text.chars().take(97).collect();
        text = format!("{}...", head);
    }
    text
}

/// Visitor collecting function and type records from the AST
struct Extractor<'a> {
    file_path: &'a str,
    source_map: &'a SourceMap,
    /// Names of enclosing functions, classes, bindings, and properties;
    /// the top is the nearest name for nested declarations
    name_stack: Vec<String>,
    /// Set while visiting the declaration an `export` wraps, consumed by the
    /// first record emitted for it
    pending_export: bool,
    functions: Vec<FunctionRecord>,
    types: Vec<TypeRecord>,
}

impl Extractor<'_> {
    fn line(&self, pos: BytePos) -> u32 {
        self.source_map.lookup_char_pos(pos).line as u32
    }

    fn snippet(&self, span: Span) -> Option<String> {
        self.source_map.span_to_snippet(span).ok()
    }

    fn current_scope(&self) -> Option<String> {
        self.name_stack.last().cloned()
    }

    /// Scope for object-literal members: nearest name in the chain, or the
    /// anonymous sentinel when the chain is exhausted
    fn scope_or_anonymous(&self) -> String {
        self.current_scope()
            .unwrap_or_else(|| ANONYMOUS_SCOPE.to_string())
    }

    /// Type annotation text with cleanup, or the given default when absent
    /// or unresolvable
    fn type_text(&self, annotation: Option<&TsTypeAnn>, default: &str) -> String {
        annotation
            .and_then(|ann| self.snippet(ann.type_ann.span()))
            .map(|text| clean_type_text(&text))
            .unwrap_or_else(|| default.to_string())
    }

    fn param_from_pat(&self, pat: &Pat) -> Option<Parameter> {
        match pat {
            Pat::Ident(binding) => Some(Parameter {
                name: binding.id.sym.to_string(),
                type_text: self.type_text(binding.type_ann.as_deref(), "any"),
                optional: binding.id.optional,
                default: None,
            }),
            Pat::Assign(assign) => {
                let mut parameter = self.param_from_pat(&assign.left)?;
                parameter.default = self.snippet(assign.right.span());
                Some(parameter)
            }
            Pat::Rest(rest) => {
                let inner = self.param_from_pat(&rest.arg)?;
                let type_text = match rest.type_ann.as_deref() {
                    Some(ann) => self.type_text(Some(ann), "any"),
                    None => inner.type_text,
                };
                Some(Parameter {
                    name: format!("...{}", inner.name),
                    type_text,
                    optional: false,
                    default: None,
                })
            }
            Pat::Array(array) => Some(Parameter {
                name: self.pattern_text(array.span, array.type_ann.as_deref()),
                type_text: self.type_text(array.type_ann.as_deref(), "any"),
                optional: array.optional,
                default: None,
            }),
            Pat::Object(object) => Some(Parameter {
                name: self.pattern_text(object.span, object.type_ann.as_deref()),
                type_text: self.type_text(object.type_ann.as_deref(), "any"),
                optional: object.optional,
                default: None,
            }),
            Pat::Invalid(_) | Pat::Expr(_) => None,
        }
    }

    /// Verbatim destructuring-pattern text, excluding the type annotation
    fn pattern_text(&self, span: Span, annotation: Option<&TsTypeAnn>) -> String {
        let name_span = match annotation {
            Some(ann) => Span::new(span.lo, ann.span.lo),
            None => span,
        };
        self.snippet(name_span)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_else(|| "_".to_string())
    }

    fn constructor_param(&self, param: &ParamOrTsParamProp) -> Option<Parameter> {
        match param {
            ParamOrTsParamProp::Param(param) => self.param_from_pat(&param.pat),
            ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                TsParamPropParam::Ident(binding) => {
                    self.param_from_pat(&Pat::Ident(binding.clone()))
                }
                TsParamPropParam::Assign(assign) => {
                    self.param_from_pat(&Pat::Assign(assign.clone()))
                }
            },
        }
    }

    fn prop_name(&self, key: &PropName) -> Option<String> {
        match key {
            PropName::Ident(ident) => Some(ident.sym.to_string()),
            PropName::Str(str_lit) => Some(str_lit.value.to_atom_lossy().to_string()),
            PropName::Num(num) => Some(num.to_string()),
            _ => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_record(
        &mut self,
        name: &str,
        kind: FunctionKind,
        scope: Option<String>,
        span: Span,
        is_async: bool,
        is_exported: bool,
        parameters: Vec<Parameter>,
        return_type: String,
        body: &FunctionBody,
    ) {
        let analysis = calls::analyze_body(body, self.source_map);
        let start_line = self.line(span.lo);
        let end_line = self.line(span.hi).max(start_line);

        self.functions.push(FunctionRecord {
            id: FunctionRecord::make_id(self.file_path, scope.as_deref(), name),
            name: name.to_string(),
            kind,
            enclosing_scope: scope,
            file_path: self.file_path.to_string(),
            start_line,
            end_line,
            is_async,
            is_exported,
            parameters,
            return_type,
            callees: analysis.callees,
            calls: analysis.calls,
            mutations: analysis.mutations,
            complexity: analysis.complexity,
        });
    }

    /// Emit a record for a `Function` node (if it has a body) and walk its
    /// children with the function's name on the scope stack
    fn walk_function(
        &mut self,
        name: &str,
        kind: FunctionKind,
        scope: Option<String>,
        function: &Function,
        exported: bool,
    ) {
        if let Some(body) = &function.body {
            let parameters = function
                .params
                .iter()
                .filter_map(|p| self.param_from_pat(&p.pat))
                .collect();
            let return_type = self.type_text(function.return_type.as_deref(), "void");
            self.push_record(
                name,
                kind,
                scope,
                function.span,
                function.is_async,
                exported,
                parameters,
                return_type,
                &FunctionBody::Block(body),
            );
        }
        self.name_stack.push(name.to_string());
        function.visit_children_with(self);
        self.name_stack.pop();
    }

    /// Emit a record for an arrow function bound to `name` and walk its
    /// children
    fn walk_arrow(&mut self, name: &str, scope: Option<String>, arrow: &ArrowExpr, exported: bool) {
        let parameters = arrow
            .params
            .iter()
            .filter_map(|p| self.param_from_pat(p))
            .collect();
        let return_type = self.type_text(arrow.return_type.as_deref(), "void");
        let body = match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => FunctionBody::Block(block),
            BlockStmtOrExpr::Expr(expr) => FunctionBody::Expr(expr),
        };
        self.push_record(
            name,
            FunctionKind::Arrow,
            scope,
            arrow.span,
            arrow.is_async,
            exported,
            parameters,
            return_type,
            &body,
        );
        self.name_stack.push(name.to_string());
        arrow.visit_children_with(self);
        self.name_stack.pop();
    }

    fn push_type(&mut self, name: String, span: Span) {
        self.types.push(TypeRecord {
            name,
            file_path: self.file_path.to_string(),
            start_line: self.line(span.lo),
            definition: self.snippet(span).unwrap_or_default(),
        });
    }
}

impl Visit for Extractor<'_> {
    fn visit_export_decl(&mut self, export: &ExportDecl) {
        self.pending_export = true;
        export.decl.visit_with(self);
        self.pending_export = false;
    }

    fn visit_export_default_decl(&mut self, export: &ExportDefaultDecl) {
        match &export.decl {
            DefaultDecl::Fn(fn_expr) => {
                if let Some(ident) = &fn_expr.ident {
                    let name = ident.sym.to_string();
                    let scope = self.current_scope();
                    self.walk_function(&name, FunctionKind::Function, scope, &fn_expr.function, true);
                } else {
                    // Unnamed default exports cannot be looked up by name
                    export.visit_children_with(self);
                }
            }
            DefaultDecl::Class(class_expr) => {
                if let Some(ident) = &class_expr.ident {
                    self.name_stack.push(ident.sym.to_string());
                    class_expr.class.visit_with(self);
                    self.name_stack.pop();
                } else {
                    export.visit_children_with(self);
                }
            }
            DefaultDecl::TsInterfaceDecl(interface) => interface.visit_with(self),
        }
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        let exported = std::mem::take(&mut self.pending_export);
        let name = decl.ident.sym.to_string();
        let scope = self.current_scope();
        self.walk_function(&name, FunctionKind::Function, scope, &decl.function, exported);
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        // An exported declaration list exports every binding in it
        let exported = std::mem::take(&mut self.pending_export);
        for declarator in &decl.decls {
            self.pending_export = exported;
            declarator.visit_with(self);
        }
        self.pending_export = false;
    }

    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        let exported = std::mem::take(&mut self.pending_export);

        if let Pat::Ident(binding) = &declarator.name {
            let name = binding.id.sym.to_string();
            if let Some(init) = &declarator.init {
                match &**init {
                    Expr::Arrow(arrow) => {
                        let scope = self.current_scope();
                        self.walk_arrow(&name, scope, arrow, exported);
                        return;
                    }
                    Expr::Fn(fn_expr) => {
                        // The binding's name wins over any inner identifier
                        let scope = self.current_scope();
                        self.walk_function(
                            &name,
                            FunctionKind::Arrow,
                            scope,
                            &fn_expr.function,
                            exported,
                        );
                        return;
                    }
                    Expr::Class(class_expr) => {
                        self.name_stack.push(name);
                        class_expr.class.visit_with(self);
                        self.name_stack.pop();
                        return;
                    }
                    _ => {
                        // Any other initializer: the binding still provides
                        // the nearest name for constructs found inside it
                        self.name_stack.push(name);
                        declarator.visit_children_with(self);
                        self.name_stack.pop();
                        return;
                    }
                }
            }
        }

        declarator.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        // Exporting a class does not mark its methods exported
        let _ = std::mem::take(&mut self.pending_export);
        self.name_stack.push(decl.ident.sym.to_string());
        decl.class.visit_with(self);
        self.name_stack.pop();
    }

    fn visit_constructor(&mut self, ctor: &Constructor) {
        if let Some(body) = &ctor.body {
            let parameters = ctor
                .params
                .iter()
                .filter_map(|p| self.constructor_param(p))
                .collect();
            self.push_record(
                "constructor",
                FunctionKind::Constructor,
                Some(self.scope_or_anonymous()),
                ctor.span,
                false,
                false,
                parameters,
                "void".to_string(),
                &FunctionBody::Block(body),
            );
        }
        self.name_stack.push("constructor".to_string());
        ctor.visit_children_with(self);
        self.name_stack.pop();
    }

    fn visit_class_method(&mut self, method: &ClassMethod) {
        let Some(name) = self.prop_name(&method.key) else {
            method.visit_children_with(self);
            return;
        };
        let kind = match method.kind {
            MethodKind::Method => FunctionKind::Method,
            MethodKind::Getter => FunctionKind::Getter,
            MethodKind::Setter => FunctionKind::Setter,
        };
        let scope = Some(self.scope_or_anonymous());
        self.walk_function(&name, kind, scope, &method.function, false);
    }

    fn visit_class_prop(&mut self, prop: &ClassProp) {
        if let Some(name) = self.prop_name(&prop.key) {
            if let Some(value) = &prop.value {
                match &**value {
                    Expr::Arrow(arrow) => {
                        let scope = Some(self.scope_or_anonymous());
                        self.walk_arrow(&name, scope, arrow, false);
                        return;
                    }
                    Expr::Fn(fn_expr) => {
                        let scope = Some(self.scope_or_anonymous());
                        self.walk_function(&name, FunctionKind::Method, scope, &fn_expr.function, false);
                        return;
                    }
                    _ => {}
                }
            }
        }
        prop.visit_children_with(self);
    }

    fn visit_method_prop(&mut self, method: &MethodProp) {
        let Some(name) = self.prop_name(&method.key) else {
            method.visit_children_with(self);
            return;
        };
        let scope = Some(self.scope_or_anonymous());
        self.walk_function(&name, FunctionKind::Method, scope, &method.function, false);
    }

    fn visit_key_value_prop(&mut self, prop: &KeyValueProp) {
        let Some(name) = self.prop_name(&prop.key) else {
            prop.visit_children_with(self);
            return;
        };
        match &*prop.value {
            // Property-assigned functions have no declaration node of their
            // own; the record is synthesized from the property
            Expr::Arrow(arrow) => {
                let scope = Some(self.scope_or_anonymous());
                self.walk_arrow(&name, scope, arrow, false);
            }
            Expr::Fn(fn_expr) => {
                let scope = Some(self.scope_or_anonymous());
                self.walk_function(&name, FunctionKind::Arrow, scope, &fn_expr.function, false);
            }
            Expr::Object(object) => {
                // Nested object literal: the property name becomes the
                // nearest name for members inside it
                self.name_stack.push(name);
                object.visit_children_with(self);
                self.name_stack.pop();
            }
            _ => prop.visit_children_with(self),
        }
    }

    fn visit_getter_prop(&mut self, prop: &GetterProp) {
        if let Some(name) = self.prop_name(&prop.key) {
            if let Some(body) = &prop.body {
                let return_type = self.type_text(prop.type_ann.as_deref(), "void");
                self.push_record(
                    &name,
                    FunctionKind::Getter,
                    Some(self.scope_or_anonymous()),
                    prop.span,
                    false,
                    false,
                    Vec::new(),
                    return_type,
                    &FunctionBody::Block(body),
                );
                self.name_stack.push(name);
                prop.visit_children_with(self);
                self.name_stack.pop();
                return;
            }
        }
        prop.visit_children_with(self);
    }

    fn visit_setter_prop(&mut self, prop: &SetterProp) {
        if let Some(name) = self.prop_name(&prop.key) {
            if let Some(body) = &prop.body {
                let parameters = self.param_from_pat(&prop.param).into_iter().collect();
                self.push_record(
                    &name,
                    FunctionKind::Setter,
                    Some(self.scope_or_anonymous()),
                    prop.span,
                    false,
                    false,
                    parameters,
                    "void".to_string(),
                    &FunctionBody::Block(body),
                );
                self.name_stack.push(name);
                prop.visit_children_with(self);
                self.name_stack.pop();
                return;
            }
        }
        prop.visit_children_with(self);
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) {
        // Property-assignment chains: `obj.prop = <function or object>`
        if assign.op == AssignOp::Assign {
            if let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left {
                if let (Expr::Ident(obj), MemberProp::Ident(prop)) = (&*member.obj, &member.prop) {
                    let name = prop.sym.to_string();
                    match &*assign.right {
                        Expr::Arrow(arrow) => {
                            self.walk_arrow(&name, Some(obj.sym.to_string()), arrow, false);
                            return;
                        }
                        Expr::Fn(fn_expr) => {
                            self.walk_function(
                                &name,
                                FunctionKind::Arrow,
                                Some(obj.sym.to_string()),
                                &fn_expr.function,
                                false,
                            );
                            return;
                        }
                        Expr::Object(object) => {
                            self.name_stack.push(name);
                            object.visit_children_with(self);
                            self.name_stack.pop();
                            return;
                        }
                        _ => {}
                    }
                }
            }
        }
        assign.visit_children_with(self);
    }

    fn visit_ts_interface_decl(&mut self, decl: &TsInterfaceDecl) {
        self.push_type(decl.id.sym.to_string(), decl.span);
        decl.visit_children_with(self);
    }

    fn visit_ts_type_alias_decl(&mut self, decl: &TsTypeAliasDecl) {
        self.push_type(decl.id.sym.to_string(), decl.span);
        decl.visit_children_with(self);
    }

    fn visit_ts_enum_decl(&mut self, decl: &TsEnumDecl) {
        self.push_type(decl.id.sym.to_string(), decl.span);
        decl.visit_children_with(self);
    }
}

#[cfg(test)]
#[path = "extract/tests.rs"]
mod tests;
