//! Record types produced by extraction
//!
//! Global invariants enforced:
//! - Records are immutable after extraction
//! - Ids are derived deterministically from (file path, enclosing scope, name)
//! - Formatting, comments, and whitespace must not affect record identity

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel scope name used when the ancestor chain yields no usable name
pub const ANONYMOUS_SCOPE: &str = "anonymous";

/// What kind of function-like construct a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    /// `function foo() {}`
    Function,
    /// Arrow function or function expression bound to a name
    Arrow,
    /// Class or object-literal method
    Method,
    Constructor,
    Getter,
    Setter,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Function => "function",
            FunctionKind::Arrow => "arrow",
            FunctionKind::Method => "method",
            FunctionKind::Constructor => "constructor",
            FunctionKind::Getter => "getter",
            FunctionKind::Setter => "setter",
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Type annotation text, `"any"` when absent
    #[serde(rename = "type")]
    pub type_text: String,
    pub optional: bool,
    /// Default-value source text, if the parameter has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// One call site inside a function body, with argument source text preserved
/// in order for data-flow display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee: String,
    pub args: Vec<String>,
}

/// Heuristic classification of a state mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Assign,
    Update,
    Delete,
    Write,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Assign => "assign",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::Write => "write",
        }
    }
}

/// A state mutation detected by textual pattern matching.
///
/// Best-effort by design: may over- and under-report. Never treated as a
/// verified data-flow result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: MutationKind,
    pub target: String,
}

/// One discovered function-like construct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Primary key: `<filePath>:<enclosingScope>:<name>`, scope segment
    /// omitted for top-level declarations
    pub id: String,
    pub name: String,
    pub kind: FunctionKind,
    /// Name of the surrounding class, object, or function for nested
    /// declarations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing_scope: Option<String>,
    /// Project-root-relative path
    pub file_path: String,
    /// 1-based, inclusive
    pub start_line: u32,
    pub end_line: u32,
    pub is_async: bool,
    pub is_exported: bool,
    pub parameters: Vec<Parameter>,
    pub return_type: String,
    /// Deduplicated callee names; `obj.method` for property calls,
    /// `import(<path>)` for dynamic imports
    pub callees: BTreeSet<String>,
    /// Call sites in source order, with argument text
    pub calls: Vec<CallSite>,
    pub mutations: Vec<Mutation>,
    /// Branching-construct count, >= 1
    pub complexity: u32,
}

impl FunctionRecord {
    /// Compose the registry key from file path, optional scope, and name
    pub fn make_id(file_path: &str, scope: Option<&str>, name: &str) -> String {
        match scope {
            Some(scope) => format!("{}:{}:{}", file_path, scope, name),
            None => format!("{}:{}", file_path, name),
        }
    }

    /// Number of source lines spanned, inclusive of both bounds
    pub fn size_lines(&self) -> u32 {
        self.end_line - self.start_line + 1
    }

    /// Stable navigation string: `<filePath>:<startLine>-<endLine>`
    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }

    /// Render the signature as a single line of text
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| {
                let mut s = p.name.clone();
                if p.optional {
                    s.push('?');
                }
                s.push_str(": ");
                s.push_str(&p.type_text);
                if let Some(default) = &p.default {
                    s.push_str(" = ");
                    s.push_str(default);
                }
                s
            })
            .collect::<Vec<_>>()
            .join(", ");
        let asyncness = if self.is_async { "async " } else { "" };
        format!("{}{}({}): {}", asyncness, self.name, params, self.return_type)
    }
}

/// One interface, type alias, or enum declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRecord {
    pub name: String,
    pub file_path: String,
    pub start_line: u32,
    /// Verbatim declaration source
    pub definition: String,
}
