//! Text and JSON rendering for query commands
//!
//! Every renderer is a pure function over a finished [`Session`]: it reads
//! the registries and returns a string. Lookup misses render a negative
//! result line instead of failing; only `read` and `ai` can error (file
//! I/O and serialization respectively).

use crate::graph::{self, FlowNode};
use crate::record::FunctionRecord;
use crate::Session;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One line per function: id, kind, signature, location
pub fn render_list(session: &Session) -> String {
    let mut out = String::new();
    for record in session.functions.all() {
        let _ = writeln!(
            out,
            "{}  [{}]  {}  ({})",
            record.id,
            record.kind.as_str(),
            record.signature(),
            record.location()
        );
    }
    if session.functions.is_empty() {
        out.push_str("No functions found\n");
    }
    out
}

/// Rendered pattern-search result, carrying whether substring fallback was
/// used so the caller can warn without re-running the query
pub struct FindReport {
    pub output: String,
    pub used_fallback: bool,
}

/// Matches for a name pattern, same line shape as `list`
pub fn render_find(session: &Session, pattern: &str) -> FindReport {
    let matches = session.functions.find_by_pattern(pattern);
    let mut out = String::new();
    for record in &matches.records {
        let _ = writeln!(
            out,
            "{}  [{}]  {}  ({})",
            record.id,
            record.kind.as_str(),
            record.signature(),
            record.location()
        );
    }
    if matches.records.is_empty() {
        let _ = writeln!(out, "No functions matching '{}'", pattern);
    }
    FindReport {
        output: out,
        used_fallback: matches.used_fallback,
    }
}

/// Full detail for every record matching a name
pub fn render_info(session: &Session, name: &str) -> String {
    let matches = session.functions.find_by_name(name);
    if matches.is_empty() {
        return format!("Function '{}' not found\n", name);
    }

    let mut out = String::new();
    if matches.len() > 1 {
        let _ = writeln!(out, "{} functions named '{}':\n", matches.len(), name);
    }
    for record in matches {
        render_one_info(&mut out, session, record);
        out.push('\n');
    }
    out
}

fn render_one_info(out: &mut String, session: &Session, record: &FunctionRecord) {
    let _ = writeln!(out, "{}", record.signature());
    let _ = writeln!(out, "  id:         {}", record.id);
    let _ = writeln!(out, "  kind:       {}", record.kind.as_str());
    if let Some(scope) = &record.enclosing_scope {
        let _ = writeln!(out, "  scope:      {}", scope);
    }
    let _ = writeln!(
        out,
        "  location:   {} ({} lines)",
        record.location(),
        record.size_lines()
    );
    let _ = writeln!(
        out,
        "  flags:      {}{}",
        if record.is_async { "async " } else { "" },
        if record.is_exported {
            "exported"
        } else {
            "internal"
        }
    );
    let _ = writeln!(out, "  complexity: {}", record.complexity);

    if !record.parameters.is_empty() {
        let _ = writeln!(out, "  parameters:");
        for param in &record.parameters {
            let optional = if param.optional { "?" } else { "" };
            let default = param
                .default
                .as_deref()
                .map(|d| format!(" = {}", d))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "    {}{}: {}{}",
                param.name, optional, param.type_text, default
            );
        }
    }

    let internal = session.functions.project_calls_of(record);
    let external: Vec<&String> = record
        .callees
        .iter()
        .filter(|c| !session.functions.contains_name(c))
        .collect();
    if !internal.is_empty() {
        let _ = writeln!(out, "  calls (project): {}", internal.join(", "));
    }
    if !external.is_empty() {
        let names: Vec<&str> = external.iter().map(|s| s.as_str()).collect();
        let _ = writeln!(out, "  calls (external): {}", names.join(", "));
    }

    if !record.mutations.is_empty() {
        let _ = writeln!(out, "  mutations:");
        for mutation in &record.mutations {
            let _ = writeln!(out, "    {} {}", mutation.kind.as_str(), mutation.target);
        }
    }

    let callers = session.functions.callers_of(&record.name);
    if !callers.is_empty() {
        let names: Vec<&str> = callers.iter().map(|f| f.name.as_str()).collect();
        let _ = writeln!(out, "  called by: {}", names.join(", "));
    }
}

/// Project-internal callees of a function, with their locations
pub fn render_deps(session: &Session, name: &str) -> String {
    let record = match session.functions.resolve(name) {
        Some(record) => record,
        None => return format!("Function '{}' not found\n", name),
    };

    let internal = session.functions.project_calls_of(record);
    if internal.is_empty() {
        return format!("{} has no project-internal dependencies\n", record.name);
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} depends on:", record.name);
    for callee in internal {
        match session.functions.resolve(&callee) {
            Some(target) => {
                let _ = writeln!(out, "  {}  ({})", callee, target.location());
            }
            None => {
                let _ = writeln!(out, "  {}", callee);
            }
        }
    }
    out
}

/// Every function whose body calls the named one
pub fn render_callers(session: &Session, name: &str) -> String {
    let callers = session.functions.callers_of(name);
    if callers.is_empty() {
        return format!("No callers of '{}' found\n", name);
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} is called by:", name);
    for caller in callers {
        let _ = writeln!(out, "  {}  ({})", caller.name, caller.location());
    }
    out
}

/// A type's verbatim declaration with its location
pub fn render_type(session: &Session, name: &str) -> String {
    match session.types.get(name) {
        Some(record) => format!(
            "{}:{}\n{}\n",
            record.file_path, record.start_line, record.definition
        ),
        None => format!("Type '{}' not found\n", name),
    }
}

/// Directory tree of modules and the functions declared in each
pub fn render_tree(session: &Session) -> String {
    if session.functions.is_empty() {
        return "No functions found\n".to_string();
    }

    // Directory -> records in discovery order
    let mut by_dir: BTreeMap<String, Vec<&FunctionRecord>> = BTreeMap::new();
    for record in session.functions.all() {
        let dir = match record.file_path.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => ".".to_string(),
        };
        by_dir.entry(dir).or_default().push(record);
    }

    let mut out = String::new();
    for (dir, records) in &by_dir {
        let _ = writeln!(out, "{}/", dir);
        for record in records {
            match &record.enclosing_scope {
                Some(scope) => {
                    let _ = writeln!(out, "  {}.{}", scope, record.name);
                }
                None => {
                    let _ = writeln!(out, "  {}", record.name);
                }
            }
        }
    }
    out
}

/// Aggregate statistics over both registries
pub fn render_stats(session: &Session) -> String {
    let functions = session.functions.all();
    let mut out = String::new();

    let files: std::collections::BTreeSet<&str> =
        functions.iter().map(|f| f.file_path.as_str()).collect();
    let _ = writeln!(out, "Files:     {}", files.len());
    let _ = writeln!(out, "Functions: {}", functions.len());
    let _ = writeln!(out, "Types:     {}", session.types.len());

    if functions.is_empty() {
        return out;
    }

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for record in functions {
        *by_kind.entry(record.kind.as_str()).or_default() += 1;
    }
    let _ = writeln!(out, "\nBy kind:");
    for (kind, count) in &by_kind {
        let _ = writeln!(out, "  {:<12} {}", kind, count);
    }

    let async_count = functions.iter().filter(|f| f.is_async).count();
    let exported_count = functions.iter().filter(|f| f.is_exported).count();
    let _ = writeln!(out, "\nAsync:    {}", async_count);
    let _ = writeln!(out, "Exported: {}", exported_count);

    let total_complexity: u32 = functions.iter().map(|f| f.complexity).sum();
    let _ = writeln!(
        out,
        "Average complexity: {:.1}",
        total_complexity as f64 / functions.len() as f64
    );

    let mut by_complexity: Vec<&FunctionRecord> = functions.iter().collect();
    by_complexity.sort_by(|a, b| b.complexity.cmp(&a.complexity).then_with(|| a.id.cmp(&b.id)));
    let _ = writeln!(out, "\nMost complex:");
    for record in by_complexity.iter().take(5) {
        let _ = writeln!(
            out,
            "  {:>3}  {}  ({})",
            record.complexity,
            record.name,
            record.location()
        );
    }

    let mut by_size: Vec<&FunctionRecord> = functions.iter().collect();
    by_size.sort_by(|a, b| {
        b.size_lines()
            .cmp(&a.size_lines())
            .then_with(|| a.id.cmp(&b.id))
    });
    let _ = writeln!(out, "\nLargest:");
    for record in by_size.iter().take(5) {
        let _ = writeln!(
            out,
            "  {:>3} lines  {}  ({})",
            record.size_lines(),
            record.name,
            record.location()
        );
    }

    out
}

/// Connected components of the project-internal call graph
pub fn render_analyze(session: &Session) -> String {
    let report = graph::connected_components(&session.functions);
    let mut out = String::new();

    if report.components.is_empty() {
        out.push_str("No connected call groups found\n");
    } else {
        let _ = writeln!(out, "{} connected call group(s):", report.components.len());
        for (i, component) in report.components.iter().enumerate() {
            let _ = writeln!(
                out,
                "  group {} ({} functions): {}",
                i + 1,
                component.len(),
                component.join(", ")
            );
        }
    }
    let _ = writeln!(out, "Isolated functions: {}", report.isolated);
    out
}

/// Call-flow trace as an indented tree
pub fn render_flow(session: &Session, name: &str, max_depth: usize) -> String {
    match graph::trace_flow(&session.functions, name, max_depth) {
        Some(root) => {
            let mut out = String::new();
            render_flow_node(&mut out, &root, 0);
            out
        }
        None => format!("Function '{}' not found\n", name),
    }
}

fn render_flow_node(out: &mut String, node: &FlowNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let args = if node.args.is_empty() {
        String::new()
    } else {
        format!("({})", node.args.join(", "))
    };
    let marker = if node.circular { " (circular)" } else { "" };
    let _ = writeln!(out, "{}{}{}{}", indent, node.name, args, marker);
    for child in &node.children {
        render_flow_node(out, child, depth + 1);
    }
}

/// Print the source of each named function, read back from disk by its
/// recorded line range
pub fn render_read(session: &Session, names: &[String]) -> Result<String> {
    let mut out = String::new();
    for name in names {
        let record = match session.functions.resolve(name) {
            Some(record) => record,
            None => {
                let _ = writeln!(out, "Function '{}' not found\n", name);
                continue;
            }
        };

        let path = session.root.join(&record.file_path);
        let src = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let _ = writeln!(out, "// {}", record.location());
        let start = record.start_line.saturating_sub(1) as usize;
        let count = record.size_lines() as usize;
        for line in src.lines().skip(start).take(count) {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Granularity of the `ai` JSON export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiScope {
    Project,
    Module,
    Function,
}

#[derive(Serialize)]
struct AiProjectSummary<'a> {
    files: usize,
    functions: usize,
    types: usize,
    exported: usize,
    modules: Vec<&'a str>,
}

#[derive(Serialize)]
struct AiModuleSummary<'a> {
    module: &'a str,
    functions: Vec<AiFunctionBrief<'a>>,
}

#[derive(Serialize)]
struct AiFunctionBrief<'a> {
    id: &'a str,
    signature: String,
    exported: bool,
    complexity: u32,
    calls: Vec<String>,
    mutations: Vec<String>,
}

/// Machine-readable project summary for downstream tooling.
///
/// Project scope gives totals and module names; module scope gives one
/// entry per directory with per-function briefs; function scope dumps the
/// full records.
pub fn render_ai(session: &Session, scope: AiScope) -> Result<String> {
    let json = match scope {
        AiScope::Project => {
            let functions = session.functions.all();
            let files: std::collections::BTreeSet<&str> =
                functions.iter().map(|f| f.file_path.as_str()).collect();
            let modules = session.modules();
            let summary = AiProjectSummary {
                files: files.len(),
                functions: functions.len(),
                types: session.types.len(),
                exported: functions.iter().filter(|f| f.is_exported).count(),
                modules: modules.keys().map(|k| k.as_str()).collect(),
            };
            serde_json::to_string_pretty(&summary)
        }
        AiScope::Module => {
            let modules = session.modules();
            let summaries: Vec<AiModuleSummary> = modules
                .iter()
                .map(|(dir, ids)| AiModuleSummary {
                    module: dir,
                    functions: ids
                        .iter()
                        .filter_map(|id| {
                            session.functions.all().iter().find(|f| &f.id == id)
                        })
                        .map(|record| AiFunctionBrief {
                            id: &record.id,
                            signature: record.signature(),
                            exported: record.is_exported,
                            complexity: record.complexity,
                            calls: session.functions.project_calls_of(record),
                            mutations: record
                                .mutations
                                .iter()
                                .map(|m| format!("{} {}", m.kind.as_str(), m.target))
                                .collect(),
                        })
                        .collect(),
                })
                .collect();
            serde_json::to_string_pretty(&summaries)
        }
        AiScope::Function => serde_json::to_string_pretty(session.functions.all()),
    };
    json.context("failed to serialize analysis output")
}
